use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("{0}")]
    Custom(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Error::ConnectionClosed,
            WsError::Io(e) => Error::Io(e),
            other => Error::WebSocket(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
