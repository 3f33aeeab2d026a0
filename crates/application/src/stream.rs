use std::sync::Arc;
use std::time::Duration;

use tracing::{trace, warn};

use crate::{
    ApplicationError, CaptureScheduler, FrameSource, ImageNormalizer, PredictionPipeline,
    ScheduledCapture, DEFAULT_CAPTURE_INTERVAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub interval: Duration,
    /// Skip a tick while an earlier request is still outstanding.
    pub skip_when_busy: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CAPTURE_INTERVAL,
            skip_when_busy: true,
        }
    }
}

/// Starts periodic capture: each tick grabs one frame, decodes it and sends
/// it inline without waiting for the response.
pub fn start_camera_stream(
    mut source: Box<dyn FrameSource>,
    normalizer: Arc<ImageNormalizer>,
    pipeline: Arc<PredictionPipeline>,
    settings: StreamSettings,
) -> Result<ScheduledCapture, ApplicationError> {
    let scheduler = CaptureScheduler::new(settings.interval)?;

    Ok(scheduler.start(move || {
        if settings.skip_when_busy && pipeline.in_flight() > 0 {
            pipeline.record_skipped_tick();
            trace!("capture tick skipped, request in flight");
            return;
        }

        let data_url = match source.capture() {
            Ok(Some(data_url)) => data_url,
            Ok(None) => return,
            Err(error) => {
                warn!(%error, "frame capture failed");
                return;
            }
        };

        let payload = match normalizer.normalize_frame(&data_url) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "dropping undecodable frame");
                return;
            }
        };

        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline.predict_inline(&payload).await;
        });
    }))
}
