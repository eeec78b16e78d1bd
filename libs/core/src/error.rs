use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
