use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// In-process transport, one end of a duplex pair
///
/// Message boundaries are preserved. Closing or dropping one end makes the
/// other end's `receive` return `Error::ConnectionClosed` once the messages
/// already in flight have been drained.
pub struct MemoryTransport {
    outgoing: Option<UnboundedSender<Vec<u8>>>,
    incoming: UnboundedReceiver<Vec<u8>>,
}

impl MemoryTransport {
    /// Create two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        let a = Self {
            outgoing: Some(a_tx),
            incoming: b_rx,
        };
        let b = Self {
            outgoing: Some(b_tx),
            incoming: a_rx,
        };
        (a, b)
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let outgoing = self.outgoing.as_ref().ok_or(Error::ConnectionClosed)?;
        outgoing
            .send(bytes.to_vec())
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        if self.outgoing.is_none() {
            return Err(Error::ConnectionClosed);
        }
        self.incoming.recv().await.ok_or(Error::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<()> {
        self.outgoing = None;
        self.incoming.close();
        Ok(())
    }
}
