use std::sync::Arc;

use depth_view_domain::{
    ImageSource, NormalizePolicy, PipelineMetrics, PredictionMessages, PredictionState,
};
use tokio::sync::watch;

use crate::normalizer::validate_upload;
use crate::{
    start_camera_stream, ApplicationError, AskDepthGptCommand, ChatSnapshot, ChatStateQuery,
    DepthBackend, DepthGptPipeline, FrameSource, ImageCompressor, ImageNormalizer,
    PredictionPipeline, PredictionSnapshot, PredictionStateQuery, ScheduledCapture,
    StartCameraCommand, SubmitFrameCommand, UploadImageCommand,
};

pub struct ApplicationService {
    normalizer: Arc<ImageNormalizer>,
    prediction: Arc<PredictionPipeline>,
    chat: DepthGptPipeline,
}

impl ApplicationService {
    pub fn new(
        backend: Arc<dyn DepthBackend>,
        compressor: Arc<dyn ImageCompressor>,
        policy: NormalizePolicy,
        messages: PredictionMessages,
    ) -> Self {
        Self {
            normalizer: Arc::new(ImageNormalizer::new(policy, compressor)),
            prediction: Arc::new(PredictionPipeline::new(
                Arc::clone(&backend),
                messages.clone(),
            )),
            chat: DepthGptPipeline::new(backend, messages),
        }
    }

    /// Validation failures come back as `Err` and never reach the network;
    /// request failures land in the returned state.
    pub async fn upload_image(
        &self,
        command: UploadImageCommand,
    ) -> Result<PredictionState, ApplicationError> {
        let payload = self
            .normalizer
            .normalize(ImageSource::File(command.upload))
            .await?;
        self.prediction.predict(&payload).await;
        Ok(self.prediction.state())
    }

    pub async fn submit_frame(
        &self,
        command: SubmitFrameCommand,
    ) -> Result<PredictionState, ApplicationError> {
        let payload = self
            .normalizer
            .normalize(ImageSource::CameraFrame(command.data_url))
            .await?;
        self.prediction.predict_inline(&payload).await;
        Ok(self.prediction.state())
    }

    /// DepthGPT uploads are type and size checked but sent uncompressed.
    pub async fn ask_depthgpt(
        &self,
        command: AskDepthGptCommand,
    ) -> Result<ChatSnapshot, ApplicationError> {
        let payload = validate_upload(self.normalizer.policy(), command.upload)?;
        self.chat.ask(&payload, &command.prompt).await?;
        Ok(self.chat.snapshot())
    }

    pub fn start_camera(
        &self,
        command: StartCameraCommand,
        source: Box<dyn FrameSource>,
    ) -> Result<ScheduledCapture, ApplicationError> {
        start_camera_stream(
            source,
            Arc::clone(&self.normalizer),
            Arc::clone(&self.prediction),
            command.settings,
        )
    }

    pub fn prediction_state(&self, _query: PredictionStateQuery) -> PredictionSnapshot {
        self.prediction.snapshot()
    }

    pub fn subscribe_prediction(&self) -> watch::Receiver<PredictionSnapshot> {
        self.prediction.subscribe()
    }

    pub fn prediction_metrics(&self) -> PipelineMetrics {
        self.prediction.metrics()
    }

    pub fn chat_state(&self, _query: ChatStateQuery) -> ChatSnapshot {
        self.chat.snapshot()
    }

    pub fn subscribe_chat(&self) -> watch::Receiver<ChatSnapshot> {
        self.chat.subscribe()
    }

    pub fn chat_metrics(&self) -> PipelineMetrics {
        self.chat.metrics()
    }
}
