use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported file type {0:?}. Please upload a JPEG or PNG image.")]
    UnsupportedType(String),
    #[error("File size exceeds {}MB.", limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },
    #[error("camera frame is not valid base64: {0}")]
    MalformedFrame(String),
}
