use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use depth_view_domain::{
    extension_for_mime, FileUpload, ImagePayload, ImageSource, NormalizePolicy, ValidationError,
};
use tracing::debug;

use crate::{ApplicationError, ImageCompressor};

const DATA_URL_SCHEME: &str = "data:";

pub struct ImageNormalizer {
    policy: NormalizePolicy,
    compressor: Arc<dyn ImageCompressor>,
}

impl ImageNormalizer {
    pub fn new(policy: NormalizePolicy, compressor: Arc<dyn ImageCompressor>) -> Self {
        Self { policy, compressor }
    }

    pub fn policy(&self) -> &NormalizePolicy {
        &self.policy
    }

    pub async fn normalize(&self, source: ImageSource) -> Result<ImagePayload, ApplicationError> {
        match source {
            ImageSource::File(upload) => self.normalize_upload(upload).await,
            ImageSource::CameraFrame(data_url) => Ok(self.normalize_frame(&data_url)?),
        }
    }

    /// Validates an upload and bounds its size through the compressor.
    pub async fn normalize_upload(
        &self,
        upload: FileUpload,
    ) -> Result<ImagePayload, ApplicationError> {
        let payload = validate_upload(&self.policy, upload)?;
        let original_len = payload.len();
        let target = self.policy.compression;

        let compressed = if target.offload {
            let compressor = Arc::clone(&self.compressor);
            tokio::task::spawn_blocking(move || compressor.compress(payload, &target))
                .await
                .map_err(|error| ApplicationError::Task(error.to_string()))??
        } else {
            self.compressor.compress(payload, &target)?
        };

        debug!(
            file = compressed.file_name(),
            original_len,
            compressed_len = compressed.len(),
            "normalized upload"
        );
        Ok(compressed)
    }

    pub fn normalize_frame(&self, data_url: &str) -> Result<ImagePayload, ValidationError> {
        decode_frame(&self.policy, data_url)
    }
}

/// Type check first, then size. No bytes are touched on rejection.
pub fn validate_upload(
    policy: &NormalizePolicy,
    upload: FileUpload,
) -> Result<ImagePayload, ValidationError> {
    if !policy.accepts(&upload.mime_type) {
        return Err(ValidationError::UnsupportedType(upload.mime_type));
    }

    let size = upload.bytes.len() as u64;
    if size > policy.max_upload_bytes {
        return Err(ValidationError::TooLarge {
            size,
            limit: policy.max_upload_bytes,
        });
    }

    Ok(ImagePayload::new(
        upload.file_name,
        upload.mime_type.to_ascii_lowercase(),
        upload.bytes,
    ))
}

/// Decodes a `data:<mime>;base64,<body>` screenshot. A missing or unreadable
/// header falls back to the policy's default frame MIME type.
pub fn decode_frame(
    policy: &NormalizePolicy,
    data_url: &str,
) -> Result<ImagePayload, ValidationError> {
    let (mime_type, body) = match data_url.split_once(',') {
        Some((header, body)) => (parse_mime(header), body),
        None => (None, data_url),
    };
    let mime_type = mime_type.unwrap_or_else(|| policy.default_frame_mime.clone());

    let bytes = STANDARD
        .decode(body.trim())
        .map_err(|error| ValidationError::MalformedFrame(error.to_string()))?;

    let file_name = format!("frame.{}", extension_for_mime(&mime_type));
    Ok(ImagePayload::new(file_name, mime_type, bytes))
}

fn parse_mime(header: &str) -> Option<String> {
    let rest = header.trim().strip_prefix(DATA_URL_SCHEME)?;
    let mime = rest.split(';').next()?.trim();
    let (kind, subtype) = mime.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() {
        return None;
    }
    Some(mime.to_ascii_lowercase())
}
