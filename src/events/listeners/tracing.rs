use async_trait::async_trait;

use crate::events::{Listener, PraxisEvent};

/// Emits events as tracing events. Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &PraxisEvent) {
        tracing::info!(
            target: "praxis::events",
            event_name = event.name(),
            ?event,
            "praxis event"
        );
    }
}
