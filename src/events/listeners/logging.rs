use async_trait::async_trait;

use crate::events::{Listener, PraxisEvent};

/// Logs all events through the `log` crate.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &PraxisEvent) {
        log::log!(
            target: "praxis::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}
