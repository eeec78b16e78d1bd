use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use encore_core::EventKind;
use encore_fabric::codec::{Codec, JsonCodec};
use encore_fabric::message::{CallMessage, Params, RequestId};
use encore_fabric::transport::Transport;
use encore_fabric::Channel;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::{Connection, Outbox};
use crate::error::{Error, Result};
use crate::registry::PendingCalls;
use crate::router::{Event, EventRouter, Listener};

const CLIENT_TARGET: &str = "encore_client::client";

/// Asynchronous Mopidy client
///
/// Cheap to clone; clones share one connection, one set of pending calls and
/// one set of subscriptions. The connection loop stops once the last clone is
/// dropped
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    // Registry of the current (or last) connection
    registry: StdMutex<Arc<PendingCalls>>,
    router: Arc<EventRouter>,
    connection: Mutex<Option<Connection>>,
}

/// Cancels a registered call unless a reply already removed it
struct CallGuard<'a> {
    pending: &'a PendingCalls,
    id: RequestId,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.pending.cancel(self.id);
    }
}

/// Releases the connection opened by `with_connection` if the body panics or
/// the whole future is dropped before it could disconnect
struct ScopedConnection<'a> {
    client: &'a Client,
    armed: bool,
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Ok(mut slot) = self.client.inner.connection.try_lock() {
            // Dropping the handle stops the loop, which fails its calls
            drop(slot.take());
        } else if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            runtime.spawn(async move {
                let _ = client.disconnect().await;
            });
        }
        debug!(target: CLIENT_TARGET, "released scoped connection on early exit");
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client {
    /// Create a disconnected client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: StdMutex::new(Arc::new(PendingCalls::new())),
                router: Arc::new(EventRouter::new()),
                connection: Mutex::new(None),
            }),
        }
    }

    /// Create a client for `address` and connect it
    pub async fn open(address: impl Into<String>) -> Result<Self> {
        let client = Self::new(ClientConfig::new(address));
        client.connect().await?;
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Open the WebSocket connection configured for this client
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.inner.connection.lock().await;
        if slot.as_ref().is_some_and(Connection::is_open) {
            return Err(Error::AlreadyConnected);
        }

        let transport = self.inner.config.transport_builder().connect().await?;
        self.start(&mut slot, Box::new(transport)).await;

        info!(target: CLIENT_TARGET, address = self.inner.config.address(), "connected");
        Ok(())
    }

    /// Run the client over an already established transport
    pub async fn connect_transport(&self, transport: impl Transport + 'static) -> Result<()> {
        let mut slot = self.inner.connection.lock().await;
        if slot.as_ref().is_some_and(Connection::is_open) {
            return Err(Error::AlreadyConnected);
        }

        self.start(&mut slot, Box::new(transport)).await;

        info!(target: CLIENT_TARGET, "connected over supplied transport");
        Ok(())
    }

    /// Stop the connection loop, close the transport and fail pending calls
    ///
    /// Once this returns, no listener runs for events of the closed connection
    pub async fn disconnect(&self) -> Result<()> {
        let connection = self
            .inner
            .connection
            .lock()
            .await
            .take()
            .ok_or(Error::NotConnected)?;

        connection.shutdown().await;

        info!(target: CLIENT_TARGET, "disconnected");
        Ok(())
    }

    /// Connect, run `body`, then disconnect whatever `body` returned
    ///
    /// The connection is also released if `body` panics or this future is
    /// dropped early; the transport is then closed in the background
    pub async fn with_connection<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.connect().await?;
        let mut scope = ScopedConnection {
            client: self,
            armed: true,
        };
        let outcome = body(self.clone()).await;
        scope.armed = false;

        match self.disconnect().await {
            Ok(()) | Err(Error::NotConnected) => outcome,
            Err(e) => outcome.and(Err(e)),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .is_some_and(Connection::is_open)
    }

    /// Call `method` with named `params` and wait for its result
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let outbox = self.outbox().await?;

        let pending = outbox.pending();
        let (id, completion) = pending.register(method);
        let _guard = CallGuard { pending, id };

        let payload = JsonCodec.encode(&CallMessage::new(id, method, params))?;
        outbox.send(id, payload).await?;

        let delivered = match self.inner.config.call_timeout() {
            Some(after) => tokio::time::timeout(after, completion)
                .await
                .map_err(|_| Error::Timeout {
                    method: method.to_string(),
                    after,
                })?,
            None => completion.await,
        };

        debug!(
            target: CLIENT_TARGET,
            %id,
            method,
            ok = matches!(delivered, Ok(Ok(_))),
            "call finished"
        );
        delivered.unwrap_or(Err(Error::ConnectionClosed))
    }

    /// Call `method` and deserialize its result into `T`
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Params) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Decode(format!("unexpected result for {}: {}", method, e)))
    }

    /// Subscribe `listener` to the event called `event_name`
    pub fn subscribe(&self, event_name: &str, listener: &Listener) -> Result<()> {
        self.inner.router.subscribe(event_name, listener)
    }

    /// Unsubscribe `listener` from the event called `event_name`
    pub fn unsubscribe(&self, event_name: &str, listener: &Listener) -> Result<()> {
        self.inner.router.unsubscribe(event_name, listener)
    }

    /// Subscribe a synchronous callback to `kind`, returning its handle
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Listener
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let listener = Listener::from_fn(callback);
        self.inner.router.subscribe_kind(kind, &listener);
        listener
    }

    pub fn clear_subscriptions(&self) {
        self.inner.router.clear();
    }

    pub fn router(&self) -> &EventRouter {
        &self.inner.router
    }

    /// Number of calls awaiting a reply on the current connection
    pub fn pending_calls(&self) -> usize {
        self.registry().len()
    }

    /// Number of replies that matched no pending call, across connections
    pub fn unmatched_replies(&self) -> u64 {
        self.registry().unmatched_replies()
    }

    fn registry(&self) -> Arc<PendingCalls> {
        let current = self
            .inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Replace whatever is in `slot` with a connection over `transport`
    ///
    /// A previous connection whose loop already ended may still be closing
    /// its transport; it is finished off first so its teardown cannot overlap
    /// the new connection's traffic
    async fn start(&self, slot: &mut Option<Connection>, transport: Box<dyn Transport>) {
        if let Some(previous) = slot.take() {
            previous.shutdown().await;
        }

        let pending = Arc::new(self.registry().successor());
        *self
            .inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&pending);

        *slot = Some(Connection::spawn(
            Channel::from_boxed(transport, JsonCodec),
            pending,
            Arc::clone(&self.inner.router),
        ));
    }

    async fn outbox(&self) -> Result<Outbox> {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .filter(|connection| connection.is_open())
            .map(Connection::outbox)
            .ok_or(Error::NotConnected)
    }
}
