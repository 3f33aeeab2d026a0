/// What a successful prediction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthResult {
    /// Base64-encoded PNG depth map.
    pub depth_map: String,
    pub rgb_image: Option<String>,
    pub response_text: Option<String>,
}

impl DepthResult {
    pub fn depth_only(depth_map: impl Into<String>) -> Self {
        Self {
            depth_map: depth_map.into(),
            rgb_image: None,
            response_text: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PredictionState {
    #[default]
    Idle,
    Loading,
    Succeeded(DepthResult),
    Failed(String),
}

impl PredictionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn result(&self) -> Option<&DepthResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn depth_map(&self) -> Option<&str> {
        self.result().map(|result| result.depth_map.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    pub submitted_requests: u64,
    pub succeeded_requests: u64,
    pub failed_requests: u64,
    pub stale_responses: u64,
    pub skipped_ticks: u64,
}
