use crate::error::Result;

pub mod memory;
pub mod websocket;

pub use self::memory::MemoryTransport;
pub use self::websocket::{WebSocketTransport, WebSocketTransportBuilder};

/// Transport trait for sending and receiving whole messages
///
/// Each transport instance represents a single connection. `receive` must be
/// cancel-safe: the connection loop races it against outgoing traffic and
/// drops the losing future.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one message over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive the next message, `Error::ConnectionClosed` once the peer is gone
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}
