use std::time::Duration;

use encore_fabric::message::{RemoteError, RequestId};
use serde_json::Value;
use thiserror::Error;

/// Client-facing error
///
/// `Clone` so a single teardown error can be delivered to every pending call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Connection already open")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Call {id} resolved more than once")]
    DuplicateResolution { id: RequestId },

    #[error("Remote error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Call to {method} timed out after {after:?}")]
    Timeout { method: String, after: Duration },
}

impl From<encore_fabric::Error> for Error {
    fn from(err: encore_fabric::Error) -> Self {
        match err {
            encore_fabric::Error::ConnectionClosed => Error::ConnectionClosed,
            encore_fabric::Error::Codec(msg) => Error::Decode(msg),
            other => Error::Transport(other.to_string()),
        }
    }
}

impl From<encore_core::Error> for Error {
    fn from(err: encore_core::Error) -> Self {
        match err {
            encore_core::Error::UnknownEventKind(name) => Error::UnknownEventKind(name),
        }
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Error::Remote {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
