use des::Time;

/// A customer, from arrival until service completes.
///
/// The assignment fields stay `None` while the customer is queued and are set
/// exactly once, when a server picks the customer up.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: usize,
    pub arrival_time: Time,
    pub service_start_time: Option<Time>,
    /// Index of the assigned server in the configured server list
    pub server: Option<usize>,
    pub service_duration: Option<Time>,
}

impl Customer {
    pub fn new(id: usize, arrival_time: Time) -> Customer {
        Customer {
            id,
            arrival_time,
            service_start_time: None,
            server: None,
            service_duration: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.server.is_some()
    }

    pub fn assign(&mut self, now: Time, server: usize, service_duration: Time) {
        debug_assert!(!self.is_assigned(), "customer {} assigned twice", self.id);
        self.service_start_time = Some(now);
        self.server = Some(server);
        self.service_duration = Some(service_duration);
    }
}
