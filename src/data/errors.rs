// npy-mosaic/src/data/errors.rs

use thiserror::Error;

/// Failures talking to the array backend
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request never produced a response body
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-success HTTP status
    #[error("Server responded with HTTP {0}")]
    Status(u16),
    /// A response arrived but does not match the expected payload
    #[error("Unexpected response from server: {0}")]
    Protocol(String),
    /// The backend answered with an explicit `{ "error": ... }` payload
    #[error("{0}")]
    ServerReported(String),
}

impl From<DecodeError> for FetchError {
    fn from(err: DecodeError) -> Self {
        FetchError::Protocol(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("data does not match shape {shape:?}: {reason}")]
    ShapeMismatch { shape: Vec<usize>, reason: String },
    #[error("non-numeric value at flat index {0}")]
    NonNumeric(usize),
    #[error("response filename {received:?} does not match requested {requested:?}")]
    FilenameMismatch { requested: String, received: String },
}
