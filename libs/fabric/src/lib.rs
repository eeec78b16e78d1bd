//! Encore Fabric - Transport and codec layer for the Mopidy client
//!
//! Provides the transport abstraction (WebSocket, in-memory pairs), the JSON
//! codec, and the JSON-RPC message shapes exchanged with the server.
//!
//! # Example
//!
//! ```no_run
//! use encore_fabric::message::{CallMessage, Params, RequestId};
//! use encore_fabric::request::request_ws;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let call = CallMessage::new(RequestId::from(1), "core.get_version", Params::new());
//! let reply = request_ws("ws://localhost:6680/mopidy/ws", &call).await?;
//! println!("{:?}", reply.outcome);
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod message;
pub mod request;
pub mod transport;

// Re-exports for convenience
pub use channel::Channel;
pub use error::{Error, Result};
