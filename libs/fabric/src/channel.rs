use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Codec;
use crate::error::Result;
use crate::transport::{Transport, WebSocketTransport};

/// A transport paired with the codec for its payloads
///
/// Owned by exactly one task; `receive_bytes` is cancel-safe as long as the
/// transport's `receive` is.
pub struct Channel<C> {
    transport: Box<dyn Transport>,
    codec: C,
}

impl<C: Codec> Channel<C> {
    /// Create a channel from an existing transport
    pub fn from_transport(transport: impl Transport + 'static, codec: C) -> Self {
        Self::from_boxed(Box::new(transport), codec)
    }

    /// Create a channel from an already boxed transport
    pub fn from_boxed(transport: Box<dyn Transport>, codec: C) -> Self {
        Self { transport, codec }
    }

    /// Open a WebSocket channel
    pub async fn websocket(url: impl Into<String>, codec: C) -> Result<Self> {
        let transport = WebSocketTransport::connect(url).await?;
        Ok(Self::from_transport(transport, codec))
    }

    /// Codec used by this channel
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Send a message over the channel
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let bytes = self.codec.encode(message)?;
        self.transport.send(&bytes).await
    }

    /// Send an already encoded message
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.send(bytes).await
    }

    /// Receive and decode the next message
    pub async fn receive<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.transport.receive().await?;
        self.codec.decode(&bytes)
    }

    /// Receive the next message without decoding it
    ///
    /// Lets the caller skip a malformed message and keep reading.
    pub async fn receive_bytes(&mut self) -> Result<Vec<u8>> {
        self.transport.receive().await
    }

    /// Close the channel
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }
}
