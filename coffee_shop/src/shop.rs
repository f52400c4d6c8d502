//! The coffee shop: one FIFO queue in front of an ordered list of servers.
//!
//! The shop is the only writer of the queue, the servers and the statistics.
//! Dispatch runs inside the delivery of the event that made it possible (an
//! arrival or a completion), so at a shared timestamp the order is always
//! event, its log line, then any service starts it unlocks.

use std::collections::VecDeque;

use des::{Agent, Response, Time};

use crate::customer::Customer;
use crate::event_log::{EventKind, LogEntry};
use crate::server::Server;
use crate::statistics::{ShopReport, StatisticsCollector};
use crate::{Event, ShopStats, Stats};

pub struct CoffeeShop {
    servers: Vec<Server>,
    queue: VecDeque<Customer>,
    statistics: StatisticsCollector,
    log: Vec<LogEntry>,
    horizon: Time,
}

impl CoffeeShop {
    /// `servers` order is the dispatch tie-break order.
    pub fn new(servers: Vec<Server>, horizon: Time) -> CoffeeShop {
        CoffeeShop {
            servers,
            queue: VecDeque::new(),
            statistics: StatisticsCollector::new(),
            log: Vec::new(),
            horizon,
        }
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    pub fn available_servers(&self) -> usize {
        self.servers.iter().filter(|s| !s.is_busy()).count()
    }

    pub fn waiting(&self) -> impl Iterator<Item = &Customer> {
        self.queue.iter()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn statistics(&self) -> &StatisticsCollector {
        &self.statistics
    }

    pub fn report(&self) -> ShopReport {
        self.statistics
            .finalize(self.horizon, &self.servers, &self.queue)
    }

    fn record(&mut self, now: Time, kind: EventKind, customer: usize, server: Option<usize>) {
        let entry = LogEntry {
            time: now,
            kind,
            customer: Some(customer),
            server: server.map(|index| self.servers[index].name().to_string()),
            queue_length: self.queue.len(),
            available: self.available_servers(),
        };
        log::debug!(
            "[{}] {} C{} {}",
            now,
            kind,
            customer,
            entry.server.as_deref().unwrap_or("-")
        );
        self.log.push(entry);
    }

    fn handle_arrival(&mut self, now: Time, customer_id: usize) -> Vec<(Time, Event)> {
        self.queue.push_back(Customer::new(customer_id, now));
        self.statistics.on_arrival(now, self.queue.len());
        self.record(now, EventKind::Arrival, customer_id, None);
        self.dispatch(now)
    }

    /// Pair waiting customers with free servers, front of the queue first and
    /// lowest configured server first. Returns the scheduled completions.
    fn dispatch(&mut self, now: Time) -> Vec<(Time, Event)> {
        let mut completions = Vec::new();
        while !self.queue.is_empty() {
            let Some(index) = self.servers.iter().position(|s| !s.is_busy()) else {
                break;
            };
            let Some(mut customer) = self.queue.pop_front() else {
                break;
            };

            let duration = self.servers[index].service_duration();
            customer.assign(now, index, duration);
            let wait = now - customer.arrival_time;
            let customer_id = customer.id;

            self.statistics
                .on_service_start(now, self.queue.len(), wait);
            self.servers[index].start(now, customer);
            self.record(now, EventKind::ServiceStart, customer_id, Some(index));

            completions.push((
                now + duration,
                Event::ServiceDone {
                    customer_id,
                    server: index,
                },
            ));
        }
        completions
    }

    fn handle_service_done(
        &mut self,
        now: Time,
        customer_id: usize,
        server: usize,
    ) -> Vec<(Time, Event)> {
        let serving = self
            .servers
            .get(server)
            .and_then(|s| s.current_customer())
            .map(|c| c.id);
        if serving != Some(customer_id) {
            log::warn!(
                "[{}] ignoring completion of C{} on server #{}: it is serving {:?}",
                now,
                customer_id,
                server,
                serving
            );
            return Vec::new();
        }

        if let Some(customer) = self.servers[server].finish(now) {
            let duration = customer
                .service_duration
                .unwrap_or_else(|| self.servers[server].service_duration());
            self.statistics.on_service_done(duration);
        }
        self.record(now, EventKind::ServiceDone, customer_id, Some(server));
        self.dispatch(now)
    }

    fn stats_snapshot(&self) -> ShopStats {
        ShopStats {
            log: self.log.clone(),
            report: self.report(),
        }
    }
}

impl Agent<Event, Stats> for CoffeeShop {
    fn act(&mut self, current_t: Time, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Arrival { customer_id } => {
                Response::events(self.handle_arrival(current_t, *customer_id))
            }
            Event::ServiceDone {
                customer_id,
                server,
            } => Response::events(self.handle_service_done(current_t, *customer_id, *server)),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Shop(self.stats_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(durations: &[Time]) -> CoffeeShop {
        let servers = durations
            .iter()
            .enumerate()
            .map(|(i, d)| Server::new(format!("S{}", i + 1), *d))
            .collect();
        CoffeeShop::new(servers, 100.0)
    }

    #[test]
    fn given_free_server_when_customer_arrives_then_service_starts_at_once() {
        let mut shop = shop(&[4.0]);

        let response = shop.act(0.0, &Event::Arrival { customer_id: 1 });

        assert_eq!(
            response.events,
            vec![(
                4.0,
                Event::ServiceDone {
                    customer_id: 1,
                    server: 0
                }
            )]
        );
        let kinds: Vec<_> = shop.log().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Arrival, EventKind::ServiceStart]);
        // arrival is logged before the dispatch it triggers
        assert_eq!(shop.log()[0].queue_length, 1);
        assert_eq!(shop.log()[0].available, 1);
        assert_eq!(shop.log()[1].queue_length, 0);
        assert_eq!(shop.log()[1].available, 0);
    }

    #[test]
    fn given_busy_servers_when_customer_arrives_then_customer_waits() {
        let mut shop = shop(&[4.0]);
        shop.act(0.0, &Event::Arrival { customer_id: 1 });

        let response = shop.act(1.0, &Event::Arrival { customer_id: 2 });

        assert!(response.events.is_empty());
        assert_eq!(shop.queue_length(), 1);
        assert_eq!(shop.waiting().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(shop.statistics().max_queue_length(), 1);
    }

    #[test]
    fn given_waiting_customer_when_service_completes_then_next_starts_same_instant() {
        let mut shop = shop(&[4.0]);
        shop.act(0.0, &Event::Arrival { customer_id: 1 });
        shop.act(1.0, &Event::Arrival { customer_id: 2 });

        let response = shop.act(
            4.0,
            &Event::ServiceDone {
                customer_id: 1,
                server: 0,
            },
        );

        assert_eq!(
            response.events,
            vec![(
                8.0,
                Event::ServiceDone {
                    customer_id: 2,
                    server: 0
                }
            )]
        );
        let tail: Vec<_> = shop.log()[3..]
            .iter()
            .map(|e| (e.kind, e.customer, e.queue_length, e.available))
            .collect();
        assert_eq!(
            tail,
            vec![
                (EventKind::ServiceDone, Some(1), 1, 1),
                (EventKind::ServiceStart, Some(2), 0, 0),
            ]
        );
        assert_eq!(shop.statistics().completed(), 1);
        assert_eq!(shop.statistics().started(), 2);
        // C1 waited 0, C2 queued from t=1 to t=4
        assert_eq!(shop.report().average_wait, 1.5);
    }

    #[test]
    fn first_free_server_in_configured_order_is_chosen() {
        let mut shop = shop(&[5.0, 2.0, 3.0]);
        shop.act(0.0, &Event::Arrival { customer_id: 1 });
        shop.act(0.0, &Event::Arrival { customer_id: 2 });
        // S2 frees up first; S1 is still busy
        shop.act(
            2.0,
            &Event::ServiceDone {
                customer_id: 2,
                server: 1,
            },
        );
        let response = shop.act(2.5, &Event::Arrival { customer_id: 3 });

        assert_eq!(
            response.events,
            vec![(
                4.5,
                Event::ServiceDone {
                    customer_id: 3,
                    server: 1
                }
            )]
        );
        assert_eq!(shop.servers()[2].current_customer(), None);
    }

    #[test]
    fn mismatched_completion_is_ignored() {
        let mut shop = shop(&[4.0]);
        shop.act(0.0, &Event::Arrival { customer_id: 1 });

        let response = shop.act(
            4.0,
            &Event::ServiceDone {
                customer_id: 9,
                server: 0,
            },
        );

        assert!(response.events.is_empty());
        assert_eq!(shop.log().len(), 2);
        assert!(shop.servers()[0].is_busy());
    }

    #[test]
    fn stats_are_stable_across_calls() {
        let mut shop = shop(&[4.0]);
        shop.act(0.0, &Event::Arrival { customer_id: 1 });
        shop.act(3.0, &Event::Arrival { customer_id: 2 });
        assert_eq!(shop.stats(), shop.stats());
    }
}
