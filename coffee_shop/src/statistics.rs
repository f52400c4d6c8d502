//! Running accumulators and the end-of-run report.
//!
//! Everything here is updated from inside event delivery only. Finalization
//! closes open intervals on the fly instead of writing them back, so a report
//! can be produced any number of times without drifting.

use std::collections::VecDeque;

use des::Time;
use serde::Serialize;

use crate::customer::Customer;
use crate::server::Server;

/// Time integral of the queue length, plus its running maximum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueLengthIntegral {
    area: f64,
    length: usize,
    max_length: usize,
    last_change: Time,
}

impl QueueLengthIntegral {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue changed to `length` at `now`.
    pub fn record(&mut self, now: Time, length: usize) {
        let elapsed = now - self.last_change;
        if elapsed > 0.0 {
            self.area += self.length as f64 * elapsed;
            self.last_change = now;
        }
        self.length = length;
        self.max_length = self.max_length.max(length);
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Area under the curve from 0 to `horizon`.
    pub fn area_until(&self, horizon: Time) -> f64 {
        self.area + self.length as f64 * (horizon - self.last_change).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsCollector {
    queue: QueueLengthIntegral,
    arrivals: usize,
    started: usize,
    total_wait: Time,
    completed: usize,
    total_completed_service: Time,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_arrival(&mut self, now: Time, queue_length: usize) {
        self.arrivals += 1;
        self.queue.record(now, queue_length);
    }

    pub fn on_service_start(&mut self, now: Time, queue_length: usize, wait: Time) {
        self.queue.record(now, queue_length);
        self.started += 1;
        self.total_wait += wait;
    }

    pub fn on_service_done(&mut self, service_duration: Time) {
        self.completed += 1;
        self.total_completed_service += service_duration;
    }

    pub fn started(&self) -> usize {
        self.started
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn max_queue_length(&self) -> usize {
        self.queue.max_length()
    }

    /// Close everything out to `horizon` and derive the aggregates.
    pub fn finalize(
        &self,
        horizon: Time,
        servers: &[Server],
        waiting: &VecDeque<Customer>,
    ) -> ShopReport {
        let span = horizon.max(0.0);

        let in_service: Vec<&Customer> = servers
            .iter()
            .filter_map(|server| server.current_customer())
            .collect();

        let utilization: Vec<ServerUtilization> = servers
            .iter()
            .map(|server| {
                let busy_time = server.busy_time_until(horizon);
                ServerUtilization {
                    name: server.name().to_string(),
                    busy_time,
                    utilization: ratio(busy_time, span),
                }
            })
            .collect();
        let total_busy: Time = utilization.iter().map(|u| u.busy_time).sum();

        ShopReport {
            horizon,
            arrivals: self.arrivals,
            started: self.started,
            average_queue_length: ratio(self.queue.area_until(horizon), span),
            max_queue_length: self.queue.max_length(),
            average_wait: ratio(self.total_wait, self.started as f64),
            queue_length_at_end: waiting.len(),
            average_remaining_wait: ratio(
                waiting.iter().map(|c| horizon - c.arrival_time).sum(),
                waiting.len() as f64,
            ),
            completed: self.completed,
            average_service_time: ratio(self.total_completed_service, self.completed as f64),
            in_service_at_end: in_service.len(),
            average_in_service_time: ratio(
                in_service
                    .iter()
                    .filter_map(|c| c.service_duration)
                    .sum(),
                in_service.len() as f64,
            ),
            overall_utilization: ratio(total_busy, servers.len() as f64 * span),
            servers: utilization,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerUtilization {
    pub name: String,
    pub busy_time: Time,
    pub utilization: f64,
}

/// Aggregate statistics for one run, closed out at the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopReport {
    pub horizon: Time,
    pub arrivals: usize,
    pub started: usize,
    pub average_queue_length: f64,
    pub max_queue_length: usize,
    /// Mean wait over customers whose service started
    pub average_wait: Time,
    pub queue_length_at_end: usize,
    /// Mean of `horizon - arrival_time` over customers still queued
    pub average_remaining_wait: Time,
    pub completed: usize,
    pub average_service_time: Time,
    pub in_service_at_end: usize,
    pub average_in_service_time: Time,
    /// Per server, in configured order
    pub servers: Vec<ServerUtilization>,
    pub overall_utilization: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn queue_area_is_integrated_between_changes() {
        let mut queue = QueueLengthIntegral::new();
        queue.record(0.0, 1);
        queue.record(0.0, 0);
        queue.record(3.0, 1);
        queue.record(4.0, 0);
        queue.record(6.0, 2);
        assert_eq!(queue.max_length(), 2);
        assert_relative_eq!(queue.area_until(6.0), 1.0);
        assert_relative_eq!(queue.area_until(7.5), 4.0);
        // closing out does not move the accumulator
        assert_relative_eq!(queue.area_until(7.5), 4.0);
    }

    #[test]
    fn empty_run_reports_zeros() {
        let collector = StatisticsCollector::new();
        let servers = vec![Server::new("S1", 1.0), Server::new("S2", 2.0)];
        let report = collector.finalize(0.0, &servers, &VecDeque::new());

        assert_eq!(report.average_queue_length, 0.0);
        assert_eq!(report.average_wait, 0.0);
        assert_eq!(report.average_remaining_wait, 0.0);
        assert_eq!(report.average_service_time, 0.0);
        assert_eq!(report.average_in_service_time, 0.0);
        assert_eq!(report.overall_utilization, 0.0);
        assert_eq!(report.servers.len(), 2);
        assert!(report.servers.iter().all(|s| s.utilization == 0.0));
    }

    #[test]
    fn waiting_customers_are_aged_to_the_horizon() {
        let mut collector = StatisticsCollector::new();
        collector.on_arrival(2.0, 1);
        collector.on_arrival(6.0, 2);
        let waiting = VecDeque::from(vec![Customer::new(1, 2.0), Customer::new(2, 6.0)]);
        let report = collector.finalize(10.0, &[Server::new("S1", 1.0)], &waiting);

        assert_eq!(report.queue_length_at_end, 2);
        assert_relative_eq!(report.average_remaining_wait, 6.0);
        // 1 * (6 - 2) + 2 * (10 - 6)
        assert_relative_eq!(report.average_queue_length, 1.2);
    }

    #[test]
    fn utilization_averages_over_all_servers() {
        let collector = StatisticsCollector::new();
        let mut busy = Server::new("S1", 5.0);
        let mut customer = Customer::new(1, 0.0);
        customer.assign(0.0, 0, 5.0);
        busy.start(0.0, customer);
        let servers = vec![busy, Server::new("S2", 5.0)];

        let report = collector.finalize(4.0, &servers, &VecDeque::new());
        assert_relative_eq!(report.servers[0].utilization, 1.0);
        assert_relative_eq!(report.servers[1].utilization, 0.0);
        assert_relative_eq!(report.overall_utilization, 0.5);
        assert_eq!(report.in_service_at_end, 1);
        assert_relative_eq!(report.average_in_service_time, 5.0);
    }
}
