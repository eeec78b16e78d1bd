use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use encore_core::EventKind;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;

const ROUTER_TARGET: &str = "encore_client::router";

/// Error a listener may report; it is logged and never propagated
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub type ListenerResult = std::result::Result<(), ListenerError>;

type Handler = dyn Fn(Event) -> BoxFuture<'static, ListenerResult> + Send + Sync;

/// An event as delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub data: Map<String, Value>,
}

impl Event {
    /// Deserialize one payload field, `None` if absent or of another type
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.data
            .get(name)
            .and_then(|value| T::deserialize(value).ok())
    }
}

/// Cloneable event callback
///
/// Clones share an identity: subscribing a clone of an already subscribed
/// listener is a no-op, and unsubscribing any clone removes it
#[derive(Clone)]
pub struct Listener {
    handler: Arc<Handler>,
}

impl Listener {
    /// Wrap an async callback
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |event| callback(event).boxed()),
        }
    }

    /// Wrap a synchronous callback that cannot fail
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        Self::new(move |event| {
            callback(event);
            std::future::ready(Ok(()))
        })
    }

    fn id(&self) -> *const () {
        Arc::as_ptr(&self.handler) as *const ()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id()).finish()
    }
}

/// Per-event listener lists, fanning each event out to its subscribers
#[derive(Default)]
pub struct EventRouter {
    subscriptions: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to the event called `event_name`
    pub fn subscribe(&self, event_name: &str, listener: &Listener) -> Result<()> {
        let kind = event_name.parse::<EventKind>()?;
        self.subscribe_kind(kind, listener);
        Ok(())
    }

    /// Returns `false` if the listener was already subscribed
    pub fn subscribe_kind(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut subscriptions = self.lock();
        let listeners = subscriptions.entry(kind).or_default();
        if listeners.contains(listener) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Remove `listener` from the event called `event_name`, if present
    pub fn unsubscribe(&self, event_name: &str, listener: &Listener) -> Result<()> {
        let kind = event_name.parse::<EventKind>()?;
        self.unsubscribe_kind(kind, listener);
        Ok(())
    }

    /// Returns `false` if the listener was not subscribed
    pub fn unsubscribe_kind(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut subscriptions = self.lock();
        let Some(listeners) = subscriptions.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|existing| existing != listener);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            subscriptions.remove(&kind);
        }
        removed
    }

    /// Drop every subscription for every event
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Run the listeners of `event_name` with `data`
    ///
    /// Names outside the recognized set are ignored. Returns how many
    /// listeners completed successfully
    pub async fn dispatch(&self, event_name: &str, data: Map<String, Value>) -> usize {
        match event_name.parse::<EventKind>() {
            Ok(kind) => self.dispatch_kind(kind, data).await,
            Err(_) => {
                debug!(target: ROUTER_TARGET, event = event_name, "ignoring unrecognized event");
                0
            }
        }
    }

    /// Run the listeners of `kind` one after another, in subscription order
    ///
    /// The listener list is read once up front; subscription changes made
    /// by a listener apply from the next dispatch
    pub async fn dispatch_kind(&self, kind: EventKind, data: Map<String, Value>) -> usize {
        let listeners = self.lock().get(&kind).cloned().unwrap_or_default();
        let mut completed = 0;

        for listener in listeners {
            let event = Event {
                kind,
                data: data.clone(),
            };
            let run = AssertUnwindSafe(async move { (listener.handler)(event).await });

            match run.catch_unwind().await {
                Ok(Ok(())) => completed += 1,
                Ok(Err(error)) => {
                    warn!(target: ROUTER_TARGET, event = %kind, %error, "event listener failed");
                }
                Err(_) => {
                    warn!(target: ROUTER_TARGET, event = %kind, "event listener panicked");
                }
            }
        }

        debug!(target: ROUTER_TARGET, event = %kind, completed, "dispatched event");
        completed
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Listener>>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
