use std::fmt;

/// One of the three concurrently running control loops of a conveyor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Drives the event sequence and calls the producer.
    Production,
    /// Drains the queue and fans out to consumers.
    Consumption,
    /// Turns a stop request into pipeline termination.
    Watchdog,
}

impl Stage {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Production => "production",
            Stage::Consumption => "consumption",
            Stage::Watchdog => "watchdog",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
