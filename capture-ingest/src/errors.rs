use thiserror::Error;

/// Result type alias for capture-ingest operations
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Errors that can occur while handling a capture submission
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Rate limiter unavailable: {0}")]
    RateLimiterUnavailable(String),

    #[error("Issue tracker request failed: {0}")]
    UpstreamRequestFailed(String),

    /// The tracker answered, but with a non-success status. The raw response
    /// text is carried through untouched so callers can surface it verbatim.
    #[error("Issue tracker rejected submission with status {status}")]
    UpstreamRejected { status: u16, detail: String },

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
