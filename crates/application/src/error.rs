use depth_view_domain::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("compression failed: {0}")]
    Compression(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("background task failed: {0}")]
    Task(String),
}

/// Failure reported by a prediction backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("server responded with status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Human-readable message supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => Some(detail),
            _ => None,
        }
    }
}
