//! Process-wide listener table.
//!
//! The table is filled once at startup and read on every dispatch; it is
//! never locked, since it cannot change after [`register_event_listeners`]
//! returns.

use std::sync::OnceLock;

use super::{Listener, PraxisEvent};

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

/// Ordered set of listeners handed to the setup closure.
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Appends a listener. Chains, so several can be added in one expression.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    // sequential: a slow listener delays the ones after it
    async fn dispatch(&self, event: &PraxisEvent) {
        for listener in &self.listeners {
            listener.handle(event).await;
        }
    }
}

/// Installs the listeners every action will notify.
///
/// ```rust,ignore
/// use praxis::events::listeners::LoggingListener;
///
/// praxis::register_event_listeners(|registry| {
///     registry.listen(LoggingListener::new()).listen(AuditTrail::new(pool.clone()));
/// });
/// ```
///
/// The first call wins. A second call keeps the installed table and logs a
/// warning.
pub fn register_event_listeners<F>(f: F)
where
    F: FnOnce(&mut EventRegistry),
{
    let mut registry = EventRegistry::new();
    f(&mut registry);
    let count = registry.len();
    if REGISTRY.set(registry).is_err() {
        log::warn!(
            target: "praxis",
            "msg=\"event listeners already registered, ignoring\", dropped={count}"
        );
    }
}

/// Sends `event` to each registered listener in turn.
pub async fn dispatch(event: PraxisEvent) {
    if let Some(registry) = REGISTRY.get() {
        registry.dispatch(&event).await;
    }
}
