use async_trait::async_trait;

use super::PraxisEvent;

/// Receives every dispatched [`PraxisEvent`].
///
/// ```rust,ignore
/// use praxis::events::{Listener, PraxisEvent};
/// use async_trait::async_trait;
///
/// struct AuditTrail;
///
/// #[async_trait]
/// impl Listener for AuditTrail {
///     async fn handle(&self, event: &PraxisEvent) {
///         if let PraxisEvent::ClaimRevoked { establishment_id, .. } = event {
///             // write an audit row
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &PraxisEvent);
}
