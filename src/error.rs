use std::net::SocketAddr;
use thiserror::Error;

/// Error taxonomy for the node. Kept flat and crate-wide, in the style of
/// the repo this was bootstrapped from, but collapsed to the handful of
/// kinds callers actually need to branch on instead of one variant per
/// failing `sled`/serialization call site.
#[derive(Clone, Error, Debug)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupted database: {0}")]
    CorruptedDatabase(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(SocketAddr),

    #[error("protocol error: {0}")]
    ProtocolError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::CorruptedDatabase(e.to_string())
    }
}

impl From<sled::transaction::TransactionError<Error>> for Error {
    fn from(e: sled::transaction::TransactionError<Error>) -> Self {
        match e {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => {
                Error::CorruptedDatabase(e.to_string())
            }
        }
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(e: bincode::error::EncodeError) -> Self {
        Error::CorruptedDatabase(format!("encode error: {e}"))
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(e: bincode::error::DecodeError) -> Self {
        Error::CorruptedDatabase(format!("decode error: {e}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::ProtocolError(e.to_string())
    }
}
