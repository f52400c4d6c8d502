//! Deterministic single-queue, multi-server coffee shop simulation.
//!
//! Customers arrive at a fixed interval, wait in one FIFO queue and are served
//! by the first free server (in configured order) for that server's fixed
//! service time. The run produces a chronological event log and aggregate
//! statistics closed out at the time horizon.
//!
//! Two agents share one [`des::EventLoop`]: the [`CoffeeShop`] (queue,
//! servers, dispatch, statistics, event log) and the [`ArrivalGenerator`].

use des::{EventLoop, Time};

pub mod arrival_generator;
pub mod config;
pub mod customer;
pub mod event_log;
pub mod format;
pub mod report;
pub mod server;
pub mod shop;
pub mod statistics;
pub mod sweep;

pub use arrival_generator::ArrivalGenerator;
pub use config::{ConfigError, ServerSpec, ShopConfig};
pub use customer::Customer;
pub use event_log::{EventKind, LogEntry};
pub use server::Server;
pub use shop::CoffeeShop;
pub use statistics::{ServerUtilization, ShopReport};

/// Events in the coffee shop simulation
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new customer walks in
    Arrival { customer_id: usize },

    /// `server` (index into the configured list) finishes serving `customer_id`
    ServiceDone { customer_id: usize, server: usize },
}

/// Statistics reported by the agents
#[derive(Debug, Clone, PartialEq)]
pub enum Stats {
    Shop(ShopStats),
    Arrivals(ArrivalStats),
}

/// Everything the shop observed during a run
#[derive(Debug, Clone, PartialEq)]
pub struct ShopStats {
    pub log: Vec<LogEntry>,
    pub report: ShopReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalStats {
    pub generated: usize,
    /// Pending arrival, if one is scheduled at or before the horizon
    pub next_arrival: Option<Time>,
}

/// Wire up the shop and the arrival generator for `config`.
///
/// The generator is registered before the shop: the next arrival is queued
/// ahead of any completion scheduled by the dispatch that same arrival
/// triggers, so an arrival landing on the same instant as such a completion
/// is delivered first.
pub fn build_event_loop(config: &ShopConfig) -> EventLoop<Event, Stats> {
    let agents: Vec<Box<dyn des::Agent<Event, Stats>>> = vec![
        Box::new(ArrivalGenerator::new(
            config.interarrival_time,
            config.time_limit,
        )),
        Box::new(CoffeeShop::new(config.build_servers(), config.time_limit)),
    ];
    EventLoop::new(vec![ArrivalGenerator::first_arrival()], agents)
}

/// Pull the shop's stats out of an event loop's agent stats.
pub fn shop_stats(stats: Vec<Stats>) -> Option<ShopStats> {
    stats.into_iter().find_map(|s| match s {
        Stats::Shop(shop) => Some(shop),
        _ => None,
    })
}

/// Run `config` to its time limit.
pub fn simulate(config: &ShopConfig) -> ShopStats {
    let mut event_loop = build_event_loop(config);
    log::info!(
        "running {} server(s), interarrival time {}, until t={}",
        config.servers.len(),
        config.interarrival_time,
        config.time_limit
    );
    event_loop.run(config.time_limit);
    let stats = shop_stats(event_loop.stats()).expect("the shop agent is always registered");
    log::info!(
        "finished at t={}: {} arrivals, {} completed",
        event_loop.current_t(),
        stats.report.arrivals,
        stats.report.completed
    );
    stats
}
