mod depthgpt;
mod error;
mod normalizer;
mod pipeline;
mod ports;
mod scheduler;
mod service;
mod store;
mod stream;
mod tracker;
mod use_cases;

#[cfg(test)]
mod testing;

pub use depthgpt::{ChatSnapshot, DepthGptPipeline};
pub use error::{ApplicationError, BackendError};
pub use normalizer::{decode_frame, validate_upload, ImageNormalizer};
pub use pipeline::{PredictionPipeline, PredictionSnapshot, RequestFlavor};
pub use ports::{DepthBackend, DepthGptResponse, FrameSource, ImageCompressor, PredictResponse};
pub use scheduler::{CaptureScheduler, ScheduledCapture, DEFAULT_CAPTURE_INTERVAL};
pub use service::ApplicationService;
pub use store::StateStore;
pub use stream::{start_camera_stream, StreamSettings};
pub use use_cases::{
    AskDepthGptCommand, ChatStateQuery, PredictionStateQuery, StartCameraCommand,
    SubmitFrameCommand, UploadImageCommand,
};
