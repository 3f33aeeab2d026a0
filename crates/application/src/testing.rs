use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use depth_view_domain::{CompressionTarget, ImagePayload};
use tokio::sync::oneshot;

use crate::{
    ApplicationError, BackendError, DepthBackend, DepthGptResponse, FrameSource, ImageCompressor,
    PredictResponse,
};

type Gate<T> = oneshot::Receiver<Result<T, BackendError>>;
type GateQueue<T> = Mutex<HashMap<String, VecDeque<Gate<T>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub(crate) file_name: String,
    pub(crate) route: &'static str,
    pub(crate) prompt: Option<String>,
}

/// Backend whose responses are released per file name by the test. Gates for
/// the same name are consumed in registration order.
#[derive(Default)]
pub(crate) struct GatedBackend {
    predict_gates: GateQueue<PredictResponse>,
    chat_gates: GateQueue<DepthGptResponse>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl GatedBackend {
    pub(crate) fn gate_predict(
        &self,
        file_name: &str,
    ) -> oneshot::Sender<Result<PredictResponse, BackendError>> {
        let (tx, rx) = oneshot::channel();
        self.predict_gates
            .lock()
            .expect("gates lock")
            .entry(file_name.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub(crate) fn respond_predict(
        &self,
        file_name: &str,
        response: Result<PredictResponse, BackendError>,
    ) {
        let _ = self.gate_predict(file_name).send(response);
    }

    pub(crate) fn gate_chat(
        &self,
        file_name: &str,
    ) -> oneshot::Sender<Result<DepthGptResponse, BackendError>> {
        let (tx, rx) = oneshot::channel();
        self.chat_gates
            .lock()
            .expect("gates lock")
            .entry(file_name.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub(crate) fn respond_chat(
        &self,
        file_name: &str,
        response: Result<DepthGptResponse, BackendError>,
    ) {
        let _ = self.gate_chat(file_name).send(response);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, payload: &ImagePayload, route: &'static str, prompt: Option<&str>) {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            file_name: payload.file_name().to_string(),
            route,
            prompt: prompt.map(str::to_string),
        });
    }

    async fn wait_predict(&self, file_name: &str) -> Result<PredictResponse, BackendError> {
        let gate = next_gate(&self.predict_gates, file_name);
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(BackendError::Transport("gate dropped".to_string()))),
            None => Err(BackendError::Transport(format!("no response for {file_name}"))),
        }
    }
}

#[async_trait]
impl DepthBackend for GatedBackend {
    async fn predict_file(&self, payload: &ImagePayload) -> Result<PredictResponse, BackendError> {
        self.record(payload, "file", None);
        self.wait_predict(payload.file_name()).await
    }

    async fn predict_inline(
        &self,
        payload: &ImagePayload,
    ) -> Result<PredictResponse, BackendError> {
        self.record(payload, "inline", None);
        self.wait_predict(payload.file_name()).await
    }

    async fn depthgpt(
        &self,
        payload: &ImagePayload,
        prompt: &str,
    ) -> Result<DepthGptResponse, BackendError> {
        self.record(payload, "depthgpt", Some(prompt));
        let gate = next_gate(&self.chat_gates, payload.file_name());
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(BackendError::Transport("gate dropped".to_string()))),
            None => Err(BackendError::Transport("no chat response".to_string())),
        }
    }
}

fn next_gate<T>(gates: &GateQueue<T>, file_name: &str) -> Option<Gate<T>> {
    gates
        .lock()
        .expect("gates lock")
        .get_mut(file_name)
        .and_then(VecDeque::pop_front)
}

pub(crate) struct PassthroughCompressor;

impl ImageCompressor for PassthroughCompressor {
    fn compress(
        &self,
        payload: ImagePayload,
        _target: &CompressionTarget,
    ) -> Result<ImagePayload, ApplicationError> {
        Ok(payload)
    }
}

/// Yields the same `data:` URL on every capture.
pub(crate) struct StaticFrameSource {
    pub(crate) data_url: Option<String>,
}

impl FrameSource for StaticFrameSource {
    fn capture(&mut self) -> Result<Option<String>, ApplicationError> {
        Ok(self.data_url.clone())
    }
}

pub(crate) fn payload(file_name: &str) -> ImagePayload {
    ImagePayload::new(file_name, "image/png", vec![1, 2, 3])
}

pub(crate) fn depth(depth_map: &str) -> Result<PredictResponse, BackendError> {
    Ok(PredictResponse {
        depth_map: Some(depth_map.to_string()),
    })
}
