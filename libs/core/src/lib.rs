//! Encore Core - Shared vocabulary for the Mopidy client crates
//!
//! Holds the closed set of server event names and the error raised when a
//! name outside that set is used.

pub mod error;
pub mod event;

pub use error::{Error, Result};
pub use event::EventKind;
