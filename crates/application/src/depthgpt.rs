use std::sync::Arc;

use depth_view_domain::{
    ChatTranscript, ChatTurn, DepthResult, ImagePayload, PipelineMetrics, PredictionMessages,
    PredictionState,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::pipeline::failure_message;
use crate::store::StateStore;
use crate::tracker::RequestTracker;
use crate::{ApplicationError, BackendError, DepthBackend, DepthGptResponse};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub state: PredictionState,
    pub transcript: ChatTranscript,
    pub issued: u64,
    pub applied: u64,
}

/// Conversational prediction flow: every prompt is recorded right away, every
/// successful answer is appended when it arrives.
pub struct DepthGptPipeline {
    backend: Arc<dyn DepthBackend>,
    messages: PredictionMessages,
    store: StateStore<ChatSnapshot>,
    tracker: RequestTracker,
}

impl DepthGptPipeline {
    pub fn new(backend: Arc<dyn DepthBackend>, messages: PredictionMessages) -> Self {
        Self {
            backend,
            messages,
            store: StateStore::default(),
            tracker: RequestTracker::default(),
        }
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.store.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.tracker.snapshot()
    }

    /// Rejects blank prompts up front; every other failure lands in the
    /// snapshot state.
    pub async fn ask(&self, payload: &ImagePayload, prompt: &str) -> Result<(), ApplicationError> {
        if prompt.trim().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let _in_flight = self.tracker.begin();
        let mut sequence = 0;
        self.store.update(|snapshot| {
            snapshot.issued += 1;
            sequence = snapshot.issued;
            snapshot.state = PredictionState::Loading;
            snapshot.transcript.push(ChatTurn::user(prompt));
        });
        debug!(sequence, file = payload.file_name(), "depthgpt request issued");

        let response = self.backend.depthgpt(payload, prompt).await;
        match classify_chat(response, &self.messages) {
            Ok(result) => {
                let reply = result.response_text.clone().unwrap_or_default();
                let mut latest = false;
                self.store.update(|snapshot| {
                    snapshot.transcript.push(ChatTurn::assistant(reply));
                    if snapshot.issued == sequence {
                        snapshot.state = PredictionState::Succeeded(result);
                        snapshot.applied = sequence;
                        latest = true;
                    }
                });
                self.finish(sequence, latest, true);
            }
            Err(message) => {
                warn!(sequence, %message, "depthgpt request failed");
                let latest = self.store.update_if(|snapshot| {
                    if snapshot.issued != sequence {
                        return false;
                    }
                    snapshot.state = PredictionState::Failed(message);
                    snapshot.applied = sequence;
                    true
                });
                self.finish(sequence, latest, false);
            }
        }
        Ok(())
    }

    fn finish(&self, sequence: u64, latest: bool, succeeded: bool) {
        if latest {
            self.tracker.record_applied(succeeded);
        } else {
            self.tracker.record_stale();
            debug!(sequence, "depthgpt state kept for newer request");
        }
    }
}

fn classify_chat(
    response: Result<DepthGptResponse, BackendError>,
    messages: &PredictionMessages,
) -> Result<DepthResult, String> {
    let response =
        response.map_err(|error| failure_message(&error, &messages.chat_fallback))?;

    let depth_map = response
        .depth_map
        .filter(|depth_map| !depth_map.is_empty())
        .ok_or_else(|| messages.missing_depth_map.clone())?;
    let response_text = response
        .lvlm_response
        .ok_or_else(|| messages.missing_chat_response.clone())?;

    Ok(DepthResult {
        depth_map,
        rgb_image: response.rgb_image,
        response_text: Some(response_text),
    })
}

#[cfg(test)]
mod tests {
    use depth_view_domain::{CHAT_FALLBACK_MESSAGE, MISSING_CHAT_RESPONSE_MESSAGE};

    use super::*;
    use crate::testing::{payload, GatedBackend};

    fn answer(text: &str) -> Result<DepthGptResponse, BackendError> {
        Ok(DepthGptResponse {
            depth_map: Some("depth".to_string()),
            rgb_image: Some("rgb".to_string()),
            lvlm_response: Some(text.to_string()),
        })
    }

    fn pipeline(backend: &Arc<GatedBackend>) -> Arc<DepthGptPipeline> {
        Arc::new(DepthGptPipeline::new(
            backend.clone(),
            PredictionMessages::default(),
        ))
    }

    #[tokio::test]
    async fn prompt_is_recorded_before_the_response_arrives() {
        let backend = Arc::new(GatedBackend::default());
        let release = backend.gate_chat("room.png");
        let pipeline = pipeline(&backend);

        let task = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.ask(&payload("room.png"), "p1").await }
        });
        while pipeline.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let pending = pipeline.snapshot();
        assert_eq!(pending.transcript.turns(), &[ChatTurn::user("p1")]);
        assert!(pending.state.is_loading());

        release.send(answer("a chair")).expect("release");
        task.await.expect("join").expect("ask");

        let done = pipeline.snapshot();
        assert_eq!(
            done.transcript.turns(),
            &[ChatTurn::user("p1"), ChatTurn::assistant("a chair")]
        );
        let result = done.state.result().expect("succeeded");
        assert_eq!(result.depth_map, "depth");
        assert_eq!(result.rgb_image.as_deref(), Some("rgb"));
        assert_eq!(result.response_text.as_deref(), Some("a chair"));
        assert_eq!(backend.calls()[0].prompt.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn failure_appends_no_assistant_turn() {
        let backend = Arc::new(GatedBackend::default());
        backend.respond_chat("room.png", Err(BackendError::Transport("down".to_string())));
        let pipeline = pipeline(&backend);

        pipeline.ask(&payload("room.png"), "p1").await.expect("ask");

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.transcript.turns(), &[ChatTurn::user("p1")]);
        assert_eq!(snapshot.state.error(), Some(CHAT_FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn server_detail_is_surfaced_for_chat() {
        let backend = Arc::new(GatedBackend::default());
        backend.respond_chat(
            "room.png",
            Err(BackendError::Status {
                status: 400,
                detail: Some("bad prompt".to_string()),
            }),
        );
        let pipeline = pipeline(&backend);

        pipeline.ask(&payload("room.png"), "p1").await.expect("ask");
        assert_eq!(pipeline.snapshot().state.error(), Some("bad prompt"));
    }

    #[tokio::test]
    async fn missing_response_text_is_a_failure() {
        let backend = Arc::new(GatedBackend::default());
        backend.respond_chat(
            "room.png",
            Ok(DepthGptResponse {
                depth_map: Some("depth".to_string()),
                ..DepthGptResponse::default()
            }),
        );
        let pipeline = pipeline(&backend);

        pipeline.ask(&payload("room.png"), "p1").await.expect("ask");

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.state.error(), Some(MISSING_CHAT_RESPONSE_MESSAGE));
        assert_eq!(snapshot.transcript.len(), 1);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_side_effects() {
        let backend = Arc::new(GatedBackend::default());
        let pipeline = pipeline(&backend);

        let result = pipeline.ask(&payload("room.png"), "   ").await;

        assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
        assert_eq!(pipeline.snapshot(), ChatSnapshot::default());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn transcript_grows_across_turns() {
        let backend = Arc::new(GatedBackend::default());
        let pipeline = pipeline(&backend);

        backend.respond_chat("room.png", answer("first"));
        pipeline.ask(&payload("room.png"), "p1").await.expect("ask");
        backend.respond_chat("room.png", answer("second"));
        pipeline.ask(&payload("room.png"), "p2").await.expect("ask");

        let texts: Vec<_> = pipeline
            .snapshot()
            .transcript
            .turns()
            .iter()
            .map(|turn| turn.text.clone())
            .collect();
        assert_eq!(texts, vec!["p1", "first", "p2", "second"]);
        assert_eq!(pipeline.metrics().succeeded_requests, 2);
    }
}
