//! Error types for the resolver crate.

use thiserror::Error;

/// Crate error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Repository location could not be interpreted
    #[error("Invalid repository: {0}")]
    InvalidRepository(#[from] crate::repository::LocationError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Dependency resolution failed
    #[error("Resolution error: {0}")]
    Resolution(#[from] crate::repository::resolver::ResolutionError),
}

impl Error {
    /// True when the caller cancelled the call or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Resolution(crate::repository::resolver::ResolutionError::Cancelled)
        )
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;
