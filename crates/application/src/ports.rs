use async_trait::async_trait;
use depth_view_domain::{CompressionTarget, ImagePayload};
use serde::Deserialize;

use crate::{ApplicationError, BackendError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub depth_map: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DepthGptResponse {
    #[serde(default)]
    pub depth_map: Option<String>,
    #[serde(default)]
    pub rgb_image: Option<String>,
    #[serde(default)]
    pub lvlm_response: Option<String>,
}

/// Remote depth-estimation service.
#[async_trait]
pub trait DepthBackend: Send + Sync {
    /// `POST /predict` with the payload as multipart field `file`.
    async fn predict_file(&self, payload: &ImagePayload) -> Result<PredictResponse, BackendError>;

    /// `POST /predict` with the payload inlined as base64 JSON.
    async fn predict_inline(
        &self,
        payload: &ImagePayload,
    ) -> Result<PredictResponse, BackendError>;

    /// `POST /depthgpt` with multipart fields `file` and `prompt`.
    async fn depthgpt(
        &self,
        payload: &ImagePayload,
        prompt: &str,
    ) -> Result<DepthGptResponse, BackendError>;
}

pub trait ImageCompressor: Send + Sync {
    fn compress(
        &self,
        payload: ImagePayload,
        target: &CompressionTarget,
    ) -> Result<ImagePayload, ApplicationError>;
}

/// Camera stand-in: each call yields one screenshot as a `data:` URL, or
/// `None` when no frame is available yet.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Option<String>, ApplicationError>;
}
