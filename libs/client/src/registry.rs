use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use encore_fabric::message::RequestId;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const REGISTRY_TARGET: &str = "encore_client::registry";

/// Receiving half of a call's completion slot
pub type Completion = oneshot::Receiver<Result<Value>>;

struct Pending {
    method: String,
    slot: oneshot::Sender<Result<Value>>,
}

/// In-flight calls of one connection, keyed by request id
///
/// Every call is registered before its payload leaves the client and leaves
/// exactly once: resolved by a reply, failed on teardown, or cancelled by the
/// caller. Registries created with [`PendingCalls::successor`] draw ids from
/// the same sequence, so an id is never reused across reconnects
pub struct PendingCalls {
    next_id: Arc<AtomicU64>,
    calls: Mutex<HashMap<RequestId, Pending>>,
    unmatched: Arc<AtomicU64>,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            calls: Mutex::new(HashMap::new()),
            unmatched: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Empty registry for a new connection, continuing this one's id
    /// sequence and unmatched-reply count
    pub fn successor(&self) -> Self {
        Self {
            next_id: Arc::clone(&self.next_id),
            calls: Mutex::new(HashMap::new()),
            unmatched: Arc::clone(&self.unmatched),
        }
    }

    /// Allocate an id for a call to `method` and store its completion slot
    pub fn register(&self, method: impl Into<String>) -> (RequestId, Completion) {
        let id = RequestId::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (slot, completion) = oneshot::channel();
        let method = method.into();

        debug!(target: REGISTRY_TARGET, %id, method = %method, "registered call");
        self.lock().insert(id, Pending { method, slot });

        (id, completion)
    }

    /// Deliver `outcome` to the call `id` and forget it
    ///
    /// Returns `false` when no such call is pending. That happens for late or
    /// duplicate replies and for ids the client never issued; neither is an
    /// error for the caller
    pub fn resolve(&self, id: RequestId, outcome: Result<Value>) -> bool {
        let Some(pending) = self.lock().remove(&id) else {
            self.note_unmatched(id);
            return false;
        };

        debug!(target: REGISTRY_TARGET, %id, method = %pending.method, "resolved call");
        if pending.slot.send(outcome).is_err() {
            debug!(target: REGISTRY_TARGET, %id, "caller stopped waiting before the reply");
        }
        true
    }

    /// Forget the call `id` without completing it
    pub fn cancel(&self, id: RequestId) -> bool {
        let removed = self.lock().remove(&id);
        if let Some(pending) = &removed {
            debug!(target: REGISTRY_TARGET, %id, method = %pending.method, "cancelled call");
        }
        removed.is_some()
    }

    /// Fail every pending call with `error` and empty the registry
    ///
    /// Returns how many calls were failed
    pub fn fail_all(&self, error: Error) -> usize {
        let drained: Vec<(RequestId, Pending)> = self.lock().drain().collect();
        let count = drained.len();

        for (id, pending) in drained {
            debug!(
                target: REGISTRY_TARGET,
                %id,
                method = %pending.method,
                error = %error,
                "failing call"
            );
            let _ = pending.slot.send(Err(error.clone()));
        }
        count
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of replies that matched no pending call
    pub fn unmatched_replies(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }

    fn note_unmatched(&self, id: RequestId) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);

        let issued = RequestId::from(1) <= id
            && id < RequestId::from(self.next_id.load(Ordering::Relaxed));
        if issued {
            warn!(
                target: REGISTRY_TARGET,
                error = %Error::DuplicateResolution { id },
                "dropping reply for a call that is no longer pending"
            );
        } else {
            debug!(target: REGISTRY_TARGET, %id, "dropping reply with unknown id");
        }
    }

    // The map is never left half-updated, so poisoning is harmless.
    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, Pending>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
