use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::Transport;

const TRANSPORT_TARGET: &str = "encore_fabric::websocket";

/// WebSocket transport, one JSON document per text frame
///
/// Outgoing messages are sent as text frames. Incoming text and binary
/// frames are both accepted; control frames are skipped.
pub struct WebSocketTransport<S = MaybeTlsStream<TcpStream>> {
    stream: WebSocketStream<S>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl WebSocketTransport {
    /// Connect to a `ws://` URL with no timeouts
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        Self::builder().url(url).connect().await
    }

    /// Connect with a connect timeout
    pub async fn connect_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::builder()
            .url(url)
            .connect_timeout(timeout)
            .connect()
            .await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> WebSocketTransportBuilder {
        WebSocketTransportBuilder::new()
    }
}

impl<S> WebSocketTransport<S> {
    /// Wrap an already negotiated WebSocket stream
    pub fn from_stream(stream: WebSocketStream<S>) -> Self {
        Self {
            stream,
            send_timeout: None,
            receive_timeout: None,
        }
    }
}

#[async_trait::async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::InvalidFrame(format!("Message is not UTF-8: {}", e)))?;

        let timeout = self.send_timeout;
        let send_op = async {
            self.stream.send(Message::Text(text)).await?;
            Ok::<(), Error>(())
        };

        if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, send_op)
                .await
                .map_err(|_| Error::Custom("Send timeout exceeded".to_string()))?
        } else {
            send_op.await
        }
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        let timeout = self.receive_timeout;
        let receive_op = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                    Some(Ok(Message::Binary(data))) => return Ok(data),
                    Some(Ok(Message::Close(frame))) => {
                        debug!(target: TRANSPORT_TARGET, ?frame, "peer sent close frame");
                        return Err(Error::ConnectionClosed);
                    }
                    // Pings are answered by tungstenite itself
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(Error::ConnectionClosed),
                }
            }
        };

        if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, receive_op)
                .await
                .map_err(|_| Error::Custom("Receive timeout exceeded".to_string()))?
        } else {
            receive_op.await
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await.map_err(Error::from) {
            Ok(()) | Err(Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Builder for configuring WebSocket transport
#[derive(Default)]
pub struct WebSocketTransportBuilder {
    url: Option<String>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl WebSocketTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL to connect to
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Connect with the configured settings
    pub async fn connect(self) -> Result<WebSocketTransport> {
        let url = self
            .url
            .ok_or_else(|| Error::Custom("URL not set".to_string()))?;

        let connect_op = tokio_tungstenite::connect_async(url.as_str());

        let (stream, response) = if let Some(timeout) = self.connect_timeout {
            tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| Error::Custom("Connect timeout exceeded".to_string()))??
        } else {
            connect_op.await?
        };

        debug!(
            target: TRANSPORT_TARGET,
            url = %url,
            status = %response.status(),
            "websocket handshake complete"
        );

        Ok(WebSocketTransport {
            stream,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
        })
    }
}
