use depth_view_domain::FileUpload;

use crate::StreamSettings;

#[derive(Debug, Clone)]
pub struct UploadImageCommand {
    pub upload: FileUpload,
}

#[derive(Debug, Clone)]
pub struct SubmitFrameCommand {
    pub data_url: String,
}

#[derive(Debug, Clone)]
pub struct AskDepthGptCommand {
    pub upload: FileUpload,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StartCameraCommand {
    pub settings: StreamSettings,
}

#[derive(Debug, Clone, Default)]
pub struct PredictionStateQuery;

#[derive(Debug, Clone, Default)]
pub struct ChatStateQuery;
