use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

use crate::PraxisError;
use crate::context::WorkSession;

/// Idle time after which a session is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

fn poisoned<T>(_: T) -> PraxisError {
    PraxisError::Internal("session store lock poisoned".into())
}

struct Entry {
    session: Arc<AsyncMutex<WorkSession>>,
    last_used: Instant,
}

/// In-process [`WorkSession`]s keyed by bearer token.
///
/// Requests on one session are serialized; different sessions proceed
/// independently. A session untouched for longer than the idle timeout is
/// pruned on the next checkout, unless a request still holds it. A pruned
/// token simply starts a fresh session that resolves its default context
/// again.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    /// The session for `token`, created unresolved on first use.
    pub(crate) fn checkout(&self, token: &str) -> Result<Arc<AsyncMutex<WorkSession>>, PraxisError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        prune(&mut sessions, now, self.idle_timeout);

        let entry = sessions.entry(token.to_owned()).or_insert_with(|| Entry {
            session: Arc::default(),
            last_used: now,
        });
        entry.last_used = now;
        Ok(Arc::clone(&entry.session))
    }

    pub(crate) fn remove(&self, token: &str) -> Result<(), PraxisError> {
        self.sessions.lock().map_err(poisoned)?.remove(token);
        Ok(())
    }

    /// Drops idle sessions now. Returns how many were removed.
    pub fn prune_idle(&self) -> Result<u64, PraxisError> {
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        Ok(prune(&mut sessions, Instant::now(), self.idle_timeout))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune(sessions: &mut HashMap<String, Entry>, now: Instant, idle_timeout: Duration) -> u64 {
    let before = sessions.len();
    // a handler holding the Arc keeps the entry alive
    sessions.retain(|_, entry| {
        now.duration_since(entry.last_used) <= idle_timeout
            || Arc::strong_count(&entry.session) > 1
    });
    let removed = before - sessions.len();
    if removed > 0 {
        log::debug!(target: "praxis", "msg=\"idle sessions pruned\", count={removed}");
    }
    removed as u64
}
