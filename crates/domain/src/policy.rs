use serde::{Deserialize, Serialize};

use crate::{MIME_JPEG, MIME_JPG, MIME_PNG};

pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const COMPRESSED_MAX_BYTES: u64 = 1_000_000;
pub const COMPRESSED_MAX_DIMENSION: u32 = 800;

pub const MISSING_DEPTH_MAP_MESSAGE: &str = "No depth map returned from the server.";
pub const PREDICTION_FALLBACK_MESSAGE: &str = "Error processing the image.";
pub const CHAT_FALLBACK_MESSAGE: &str = "Error processing the request.";
pub const MISSING_CHAT_RESPONSE_MESSAGE: &str = "No response returned from the server.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionTarget {
    pub max_bytes: u64,
    pub max_dimension: u32,
    /// Run compression on a blocking worker instead of the calling task.
    pub offload: bool,
}

impl Default for CompressionTarget {
    fn default() -> Self {
        Self {
            max_bytes: COMPRESSED_MAX_BYTES,
            max_dimension: COMPRESSED_MAX_DIMENSION,
            offload: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizePolicy {
    pub accepted_mime_types: Vec<String>,
    pub max_upload_bytes: u64,
    pub default_frame_mime: String,
    pub compression: CompressionTarget,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![
                MIME_JPEG.to_string(),
                MIME_PNG.to_string(),
                MIME_JPG.to_string(),
            ],
            max_upload_bytes: MAX_UPLOAD_BYTES,
            default_frame_mime: MIME_PNG.to_string(),
            compression: CompressionTarget::default(),
        }
    }
}

impl NormalizePolicy {
    pub fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_mime_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(mime_type))
    }
}

/// User-facing messages for the failure paths of the request pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionMessages {
    pub missing_depth_map: String,
    pub prediction_fallback: String,
    pub chat_fallback: String,
    pub missing_chat_response: String,
}

impl Default for PredictionMessages {
    fn default() -> Self {
        Self {
            missing_depth_map: MISSING_DEPTH_MAP_MESSAGE.to_string(),
            prediction_fallback: PREDICTION_FALLBACK_MESSAGE.to_string(),
            chat_fallback: CHAT_FALLBACK_MESSAGE.to_string(),
            missing_chat_response: MISSING_CHAT_RESPONSE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_exactly_jpeg_and_png() {
        let policy = NormalizePolicy::default();
        assert!(policy.accepts("image/jpeg"));
        assert!(policy.accepts("image/jpg"));
        assert!(policy.accepts("IMAGE/PNG"));
        assert!(!policy.accepts("image/gif"));
        assert!(!policy.accepts("image/webp"));
        assert_eq!(policy.max_upload_bytes, 5_242_880);
        assert_eq!(policy.default_frame_mime, "image/png");
    }

    #[test]
    fn default_compression_targets_one_megabyte_and_800px() {
        let target = CompressionTarget::default();
        assert_eq!(target.max_bytes, 1_000_000);
        assert_eq!(target.max_dimension, 800);
        assert!(target.offload);
    }

    #[test]
    fn policy_round_trips_through_json() {
        let policy = NormalizePolicy::default();
        let json = serde_json::to_string(&policy).expect("serialize");
        let parsed: NormalizePolicy = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, policy);
    }
}
