use std::sync::Arc;

use depth_view_domain::{
    DepthResult, ImagePayload, PipelineMetrics, PredictionMessages, PredictionState,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::store::StateStore;
use crate::tracker::RequestTracker;
use crate::{BackendError, DepthBackend, PredictResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFlavor {
    /// Multipart body with the image as field `file`.
    Multipart,
    /// JSON body `{"image": "<base64>"}`.
    InlineBase64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionSnapshot {
    pub state: PredictionState,
    /// Sequence number of the most recently issued request.
    pub issued: u64,
    /// Sequence number whose outcome `state` holds, 0 while none has landed.
    pub applied: u64,
}

/// Owns the prediction state of one view. Responses are applied only when
/// they belong to the latest issued request.
pub struct PredictionPipeline {
    backend: Arc<dyn DepthBackend>,
    messages: PredictionMessages,
    store: StateStore<PredictionSnapshot>,
    tracker: RequestTracker,
}

impl PredictionPipeline {
    pub fn new(backend: Arc<dyn DepthBackend>, messages: PredictionMessages) -> Self {
        Self {
            backend,
            messages,
            store: StateStore::default(),
            tracker: RequestTracker::default(),
        }
    }

    pub fn state(&self) -> PredictionState {
        self.store.snapshot().state
    }

    pub fn snapshot(&self) -> PredictionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PredictionSnapshot> {
        self.store.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.tracker.snapshot()
    }

    pub(crate) fn record_skipped_tick(&self) {
        self.tracker.record_skipped_tick();
    }

    pub async fn predict(&self, payload: &ImagePayload) {
        self.dispatch(payload, RequestFlavor::Multipart).await;
    }

    pub async fn predict_inline(&self, payload: &ImagePayload) {
        self.dispatch(payload, RequestFlavor::InlineBase64).await;
    }

    pub async fn dispatch(&self, payload: &ImagePayload, flavor: RequestFlavor) {
        let _in_flight = self.tracker.begin();
        let mut sequence = 0;
        self.store.update(|snapshot| {
            snapshot.issued += 1;
            sequence = snapshot.issued;
            snapshot.state = PredictionState::Loading;
        });
        debug!(
            sequence,
            ?flavor,
            file = payload.file_name(),
            bytes = payload.len(),
            "prediction request issued"
        );

        let response = match flavor {
            RequestFlavor::Multipart => self.backend.predict_file(payload).await,
            RequestFlavor::InlineBase64 => self.backend.predict_inline(payload).await,
        };

        let next = classify_prediction(response, &self.messages);
        if let PredictionState::Failed(message) = &next {
            warn!(sequence, %message, "prediction failed");
        }
        let succeeded = matches!(next, PredictionState::Succeeded(_));

        let applied = self.store.update_if(|snapshot| {
            if snapshot.issued != sequence {
                return false;
            }
            snapshot.state = next;
            snapshot.applied = sequence;
            true
        });

        if applied {
            self.tracker.record_applied(succeeded);
        } else {
            self.tracker.record_stale();
            debug!(sequence, "dropped stale prediction response");
        }
    }
}

pub(crate) fn classify_prediction(
    response: Result<PredictResponse, BackendError>,
    messages: &PredictionMessages,
) -> PredictionState {
    match response {
        Ok(PredictResponse {
            depth_map: Some(depth_map),
        }) if !depth_map.is_empty() => PredictionState::Succeeded(DepthResult::depth_only(depth_map)),
        Ok(_) => PredictionState::Failed(messages.missing_depth_map.clone()),
        Err(error) => PredictionState::Failed(failure_message(&error, &messages.prediction_fallback)),
    }
}

pub(crate) fn failure_message(error: &BackendError, fallback: &str) -> String {
    error
        .detail()
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
