//! Domain events emitted by praxis actions.
//!
//! Events are fired from every mutating action. If no listeners are
//! registered they are dropped.
//!
//! ```rust,ignore
//! use praxis::register_event_listeners;
//! use praxis::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Implement [`Listener`] to forward events elsewhere (audit table, metrics).

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::PraxisEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
