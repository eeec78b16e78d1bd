//! Encore Client - Asynchronous client for the Mopidy JSON-RPC WebSocket API
//!
//! A single connection carries calls, their replies and server events. Replies
//! are matched to calls by id in a pending-call registry; events are fanned
//! out to listeners by an event router. Both are fed by one connection loop
//! per open connection.
//!
//! # Example
//!
//! ```no_run
//! use encore_client::{Client, EventKind};
//!
//! # async fn example() -> Result<(), encore_client::Error> {
//! let client = Client::open("ws://localhost:6680/mopidy/ws").await?;
//!
//! client.on(EventKind::VolumeChanged, |event| {
//!     println!("volume is now {:?}", event.field::<u8>("volume"));
//! });
//!
//! let version = client.core().get_version().await?;
//! client.mixer().set_volume(40).await?;
//! println!("talking to Mopidy {}", version);
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
mod connection;
pub mod error;
pub mod registry;
pub mod router;

// Re-exports for convenience
pub use client::Client;
pub use config::ClientConfig;
pub use encore_core::EventKind;
pub use encore_fabric::message::{Params, RequestId};
pub use error::{Error, Result};
pub use router::{Event, EventRouter, Listener};
