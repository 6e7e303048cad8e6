use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur during text chunking
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Empty or whitespace-only content
    #[error("Empty content provided")]
    EmptyContent,
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
