use des::Time;

use crate::customer::Customer;

/// A server with a fixed service duration and a running busy-time integral.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    name: String,
    service_duration: Time,
    busy: bool,
    busy_time: Time,
    last_state_change: Time,
    current_customer: Option<Customer>,
}

impl Server {
    pub fn new(name: impl Into<String>, service_duration: Time) -> Server {
        Server {
            name: name.into(),
            service_duration,
            busy: false,
            busy_time: 0.0,
            last_state_change: 0.0,
            current_customer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_duration(&self) -> Time {
        self.service_duration
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn current_customer(&self) -> Option<&Customer> {
        self.current_customer.as_ref()
    }

    // Closes the interval since the last change, then flips state
    fn set_busy(&mut self, now: Time, busy: bool) {
        if self.busy {
            self.busy_time += now - self.last_state_change;
        }
        self.busy = busy;
        self.last_state_change = now;
    }

    /// Take `customer` into service. The customer must already be assigned.
    pub fn start(&mut self, now: Time, customer: Customer) {
        debug_assert!(!self.busy, "server {} is already serving", self.name);
        self.current_customer = Some(customer);
        self.set_busy(now, true);
    }

    /// Release the current customer, if any.
    pub fn finish(&mut self, now: Time) -> Option<Customer> {
        let customer = self.current_customer.take()?;
        self.set_busy(now, false);
        Some(customer)
    }

    /// Busy time accumulated up to `horizon`, counting a still-open busy interval.
    pub fn busy_time_until(&self, horizon: Time) -> Time {
        if self.busy {
            self.busy_time + (horizon - self.last_state_change).max(0.0)
        } else {
            self.busy_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigned(id: usize, now: Time, duration: Time) -> Customer {
        let mut customer = Customer::new(id, now);
        customer.assign(now, 0, duration);
        customer
    }

    #[test]
    fn idle_server_accumulates_nothing() {
        let server = Server::new("S1", 4.0);
        assert!(!server.is_busy());
        assert_eq!(server.busy_time_until(10.0), 0.0);
    }

    #[test]
    fn busy_intervals_are_integrated() {
        let mut server = Server::new("S1", 4.0);
        server.start(1.0, assigned(1, 1.0, 4.0));
        assert!(server.is_busy());
        assert_eq!(server.current_customer().map(|c| c.id), Some(1));

        let done = server.finish(5.0);
        assert_eq!(done.map(|c| c.id), Some(1));
        assert!(!server.is_busy());
        assert_eq!(server.busy_time_until(20.0), 4.0);

        server.start(8.0, assigned(2, 8.0, 4.0));
        // open interval is closed at the horizon without mutating
        assert_eq!(server.busy_time_until(10.0), 6.0);
        assert_eq!(server.busy_time_until(10.0), 6.0);
    }

    #[test]
    fn finishing_an_idle_server_is_a_no_op() {
        let mut server = Server::new("S1", 4.0);
        assert_eq!(server.finish(3.0), None);
        assert_eq!(server.busy_time_until(3.0), 0.0);
    }
}
