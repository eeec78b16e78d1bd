use serde::Serialize;
use tracing::debug;

use crate::channel::Channel;
use crate::codec::{Codec, JsonCodec};
use crate::error::{Error, Result};
use crate::message::{CallMessage, InboundMessage, ResultMessage};

const REQUEST_TARGET: &str = "encore_fabric::request";

/// Maximum number of unrelated messages skipped while waiting for a reply.
const MAX_SKIPPED_MESSAGES: usize = 100;

/// Send a call on an open channel and wait for its reply
///
/// Events and replies to other calls are skipped. Meant for channels with no
/// other reader; long-lived connections go through the client's connection
/// loop instead.
pub async fn request<C: Codec>(
    channel: &mut Channel<C>,
    call: &CallMessage,
) -> Result<ResultMessage> {
    channel.send(call).await?;

    for _ in 0..MAX_SKIPPED_MESSAGES {
        match channel.receive::<InboundMessage>().await? {
            InboundMessage::Result(reply) if reply.id == Some(call.id) => return Ok(reply),
            InboundMessage::Result(reply) => {
                debug!(
                    target: REQUEST_TARGET,
                    expected = %call.id,
                    received = ?reply.id,
                    "skipping reply with non-matching id"
                );
            }
            InboundMessage::Event(event) => {
                debug!(target: REQUEST_TARGET, event = %event.event, "skipping event");
            }
        }
    }

    Err(Error::Custom(format!(
        "No reply to request {} after {} messages",
        call.id, MAX_SKIPPED_MESSAGES
    )))
}

/// Perform a one-off call over a fresh WebSocket connection
///
/// Opens a connection, sends the call, waits for the matching reply, and closes the connection.
pub async fn request_ws(url: impl Into<String>, call: &CallMessage) -> Result<ResultMessage> {
    let mut channel = Channel::websocket(url, JsonCodec).await?;
    let reply = request(&mut channel, call).await?;
    channel.close().await?;
    Ok(reply)
}

/// Send a message over WebSocket without waiting for a response (fire-and-forget)
pub async fn send_ws<T: Serialize>(url: impl Into<String>, message: &T) -> Result<()> {
    let mut channel = Channel::websocket(url, JsonCodec).await?;
    channel.send(message).await?;
    channel.close().await?;
    Ok(())
}
