//! Context Switching Engine.
//!
//! Each session owns a [`WorkSession`]; the [`ContextEngine`] resolves it on
//! login and is the only component that changes which context is active.
//! The last switch is also persisted per professional through
//! [`ActiveContextRepository`] so a new session starts where the previous
//! one left off.

mod engine;
mod repository;
mod types;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

pub use engine::ContextEngine;
pub use repository::ActiveContextRepository;
pub use types::{ActiveContext, ContextState, WorkContext, WorkContextSummary, WorkSession};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockActiveContextRepository;
