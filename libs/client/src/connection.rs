use std::sync::Arc;

use encore_fabric::codec::{Codec, JsonCodec};
use encore_fabric::message::{EventMessage, InboundMessage, RequestId, ResultMessage};
use encore_fabric::Channel;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::PendingCalls;
use crate::router::EventRouter;

const CONNECTION_TARGET: &str = "encore_client::connection";

struct Outgoing {
    id: RequestId,
    payload: Vec<u8>,
    sent: oneshot::Sender<encore_fabric::Result<()>>,
}

/// Handle for queueing encoded calls on a running connection
///
/// Carries the connection's own registry so a call is always registered with
/// the loop that will answer or fail it
#[derive(Clone)]
pub(crate) struct Outbox {
    queue: mpsc::UnboundedSender<Outgoing>,
    pending: Arc<PendingCalls>,
}

impl Outbox {
    pub(crate) fn pending(&self) -> &PendingCalls {
        &self.pending
    }

    /// Queue `payload` and wait until the loop has written it
    pub(crate) async fn send(&self, id: RequestId, payload: Vec<u8>) -> Result<()> {
        let (sent, written) = oneshot::channel();
        self.queue
            .send(Outgoing { id, payload, sent })
            .map_err(|_| Error::ConnectionClosed)?;

        written.await.map_err(|_| Error::ConnectionClosed)??;
        Ok(())
    }
}

/// A running connection: the loop task that owns the channel and the task
/// that hands its events to listeners
///
/// One task writes queued calls, reads inbound frames in arrival order and
/// resolves replies in this connection's registry; events go to the second
/// task so a slow or calling listener never stalls the reader. Dropping the
/// handle stops both; `shutdown` also waits for them
pub(crate) struct Connection {
    outbox: Outbox,
    stop: Option<oneshot::Sender<()>>,
    reader: Option<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl Connection {
    pub(crate) fn spawn(
        channel: Channel<JsonCodec>,
        pending: Arc<PendingCalls>,
        router: Arc<EventRouter>,
    ) -> Self {
        let (queue, outgoing) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();
        let (events, inbox) = mpsc::unbounded_channel();

        let dispatcher = tokio::spawn(dispatch_events(inbox, router));
        let reader = tokio::spawn(run(
            channel,
            outgoing,
            stopped,
            Arc::clone(&pending),
            events,
        ));

        Self {
            outbox: Outbox { queue, pending },
            stop: Some(stop),
            reader: Some(reader),
            dispatcher,
        }
    }

    /// Whether the loop is still accepting calls
    pub(crate) fn is_open(&self) -> bool {
        !self.outbox.queue.is_closed()
    }

    pub(crate) fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Stop the loop, wait until it has closed the transport and failed this
    /// connection's calls, and discard events not yet handed to listeners
    ///
    /// Once this returns no listener runs on behalf of this connection
    pub(crate) async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                warn!(target: CONNECTION_TARGET, error = %e, "connection loop ended abnormally");
            }
        }

        self.dispatcher.abort();
        if let Err(e) = (&mut self.dispatcher).await {
            if !e.is_cancelled() {
                warn!(target: CONNECTION_TARGET, error = %e, "event dispatcher ended abnormally");
            }
        }

        // Calls that registered after the loop's own teardown
        self.outbox.pending.fail_all(Error::ConnectionClosed);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.dispatcher.abort();
    }
}

async fn run(
    mut channel: Channel<JsonCodec>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    mut stopped: oneshot::Receiver<()>,
    pending: Arc<PendingCalls>,
    events: mpsc::UnboundedSender<EventMessage>,
) {
    let reason = loop {
        tokio::select! {
            biased;

            _ = &mut stopped => break "disconnect requested",

            Some(call) = outgoing.recv() => {
                let result = channel.send_bytes(&call.payload).await;
                match &result {
                    Ok(()) => debug!(target: CONNECTION_TARGET, id = %call.id, "sent call"),
                    Err(e) => warn!(target: CONNECTION_TARGET, id = %call.id, error = %e, "failed to send call"),
                }
                let _ = call.sent.send(result);
            }

            received = channel.receive_bytes() => match received {
                Ok(bytes) => route(channel.codec(), &bytes, &pending, &events),
                Err(encore_fabric::Error::ConnectionClosed) => break "closed by peer",
                Err(e) => {
                    warn!(target: CONNECTION_TARGET, error = %e, "receive failed");
                    break "transport failure";
                }
            },
        }
    };

    info!(target: CONNECTION_TARGET, reason, "connection loop stopping");

    // Calls still queued are answered with ConnectionClosed when dropped here
    drop(outgoing);
    if let Err(e) = channel.close().await {
        debug!(target: CONNECTION_TARGET, error = %e, "error while closing transport");
    }

    let failed = pending.fail_all(Error::ConnectionClosed);
    if failed > 0 {
        info!(target: CONNECTION_TARGET, failed, "failed calls left pending at teardown");
    }
}

fn route(
    codec: &JsonCodec,
    bytes: &[u8],
    pending: &PendingCalls,
    events: &mpsc::UnboundedSender<EventMessage>,
) {
    let message = match codec.decode::<InboundMessage>(bytes) {
        Ok(message) => message,
        Err(e) => {
            warn!(
                target: CONNECTION_TARGET,
                error = %Error::from(e),
                len = bytes.len(),
                "skipping undecodable message"
            );
            return;
        }
    };

    match message {
        InboundMessage::Result(ResultMessage {
            id: Some(id),
            outcome,
        }) => {
            pending.resolve(id, outcome.map_err(Error::from));
        }
        InboundMessage::Result(ResultMessage { id: None, outcome }) => {
            warn!(target: CONNECTION_TARGET, ?outcome, "skipping reply without id");
        }
        InboundMessage::Event(event) => {
            debug!(target: CONNECTION_TARGET, event = %event.event, "received event");
            if events.send(event).is_err() {
                debug!(target: CONNECTION_TARGET, "event dispatcher already stopped");
            }
        }
    }
}

async fn dispatch_events(
    mut inbox: mpsc::UnboundedReceiver<EventMessage>,
    router: Arc<EventRouter>,
) {
    while let Some(event) = inbox.recv().await {
        router.dispatch(&event.event, event.data).await;
    }
}
