use std::time::Duration;

use encore_fabric::transport::{WebSocketTransport, WebSocketTransportBuilder};

/// Address of a Mopidy server running with default HTTP settings
pub const DEFAULT_ADDRESS: &str = "ws://localhost:6680/mopidy/ws";

/// Connection and call settings for a [`Client`](crate::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    address: String,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    call_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl ClientConfig {
    /// Settings for `address` with no timeouts
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: None,
            send_timeout: None,
            receive_timeout: None,
            call_timeout: None,
        }
    }

    /// Create a builder starting from the default address
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout
    }

    /// Idle time after which the connection is considered dead
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout
    }

    /// Longest a single call waits for its reply
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub(crate) fn transport_builder(&self) -> WebSocketTransportBuilder {
        let mut builder = WebSocketTransport::builder().url(self.address.clone());
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.send_timeout {
            builder = builder.send_timeout(timeout);
        }
        if let Some(timeout) = self.receive_timeout {
            builder = builder.receive_timeout(timeout);
        }
        builder
    }
}

/// Builder for configuring a client
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    address: Option<String>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    call_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the WebSocket URL of the server
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
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

    /// Set the per-call reply timeout
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            address: self.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
            call_timeout: self.call_timeout,
        }
    }
}
