use std::fmt;
use std::io;

use des::Time;

use crate::format::format_g6;

pub const HEADER: [&str; 6] = [
    "Timestamp",
    "Event type",
    "Customer",
    "Server",
    "Length",
    "Available",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Arrival,
    ServiceStart,
    ServiceDone,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Arrival => write!(f, "ARRIVAL"),
            EventKind::ServiceStart => write!(f, "SERVICE_START"),
            EventKind::ServiceDone => write!(f, "SERVICE_DONE"),
        }
    }
}

/// One state change, with queue length and free servers as they stand
/// after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: Time,
    pub kind: EventKind,
    pub customer: Option<usize>,
    pub server: Option<String>,
    pub queue_length: usize,
    pub available: usize,
}

impl LogEntry {
    fn record(&self) -> [String; 6] {
        [
            format_g6(self.time),
            self.kind.to_string(),
            self.customer
                .map(|id| format!("C{}", id))
                .unwrap_or_default(),
            self.server.clone().unwrap_or_default(),
            self.queue_length.to_string(),
            self.available.to_string(),
        ]
    }
}

/// Write the header and one CSV row per entry.
pub fn write_event_log<W: io::Write>(writer: W, entries: &[LogEntry]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for entry in entries {
        wtr.write_record(&entry.record())?;
    }
    wtr.flush()?;
    Ok(())
}
