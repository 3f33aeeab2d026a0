use depth_view_domain::{ChatTurn, PipelineMetrics, PredictionState};

use crate::SavedDepthMap;

pub fn present_state(state: &PredictionState) -> String {
    match state {
        PredictionState::Idle => "idle".to_string(),
        PredictionState::Loading => "processing...".to_string(),
        PredictionState::Succeeded(result) => format!(
            "depth map ready ({} base64 chars)",
            result.depth_map.len()
        ),
        PredictionState::Failed(message) => format!("error: {message}"),
    }
}

pub fn present_saved(saved: &SavedDepthMap) -> String {
    format!(
        "saved {} ({}x{})",
        saved.file_path.display(),
        saved.width,
        saved.height
    )
}

pub fn present_turn(turn: &ChatTurn) -> String {
    let speaker = if turn.is_user { "you" } else { "depthgpt" };
    format!("{speaker}: {}", turn.text)
}

pub fn present_metrics(metrics: &PipelineMetrics) -> String {
    format!(
        "requests submitted={} succeeded={} failed={} stale={} skipped_ticks={}",
        metrics.submitted_requests,
        metrics.succeeded_requests,
        metrics.failed_requests,
        metrics.stale_responses,
        metrics.skipped_ticks
    )
}
