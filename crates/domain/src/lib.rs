mod chat;
mod error;
mod image;
mod policy;
mod state;

pub use chat::{ChatTranscript, ChatTurn};
pub use error::ValidationError;
pub use image::{
    extension_for_mime, guess_mime_type, FileUpload, ImagePayload, ImageSource, MIME_JPEG,
    MIME_JPG, MIME_PNG,
};
pub use policy::{
    CompressionTarget, NormalizePolicy, PredictionMessages, CHAT_FALLBACK_MESSAGE,
    COMPRESSED_MAX_BYTES, COMPRESSED_MAX_DIMENSION, MAX_UPLOAD_BYTES,
    MISSING_CHAT_RESPONSE_MESSAGE, MISSING_DEPTH_MAP_MESSAGE, PREDICTION_FALLBACK_MESSAGE,
};
pub use state::{DepthResult, PipelineMetrics, PredictionState};
