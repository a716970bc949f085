use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// FFT input length differs from the size the analyzer was built for.
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Format outside the accepted profile. Recoverable: the file stays
    /// loaded and its report is still shown.
    #[error("container rejected: {0}")]
    ContainerRejected(String),

    /// Malformed container. Aborts only the current load.
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
