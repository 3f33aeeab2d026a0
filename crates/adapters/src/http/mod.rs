use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use depth_view_application::{
    ApplicationError, BackendError, DepthBackend, DepthGptResponse, PredictResponse,
};
use depth_view_domain::ImagePayload;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

const PREDICT_PATH: &str = "predict";
const DEPTHGPT_PATH: &str = "depthgpt";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct InlineImage<'a> {
    image: &'a str,
}

/// `DepthBackend` over HTTP. Paths are resolved against `base_url`.
///
/// Every request is bounded by a timeout; an unanswered request surfaces as
/// `BackendError::Transport` and releases the pipeline's in-flight slot.
#[derive(Debug, Clone)]
pub struct HttpDepthBackend {
    client: Client,
    base_url: String,
}

impl HttpDepthBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApplicationError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApplicationError> {
        if timeout.is_zero() {
            return Err(ApplicationError::InvalidInput(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApplicationError::InvalidInput(error.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T, BackendError>
    where
        T: DeserializeOwned + Default,
    {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!(status = status.as_u16(), ?detail, "backend rejected request");
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "backend responded");
        match serde_json::from_slice::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(error) => {
                warn!(%error, "unexpected response body, treating as empty");
                Ok(T::default())
            }
        }
    }
}

#[async_trait]
impl DepthBackend for HttpDepthBackend {
    async fn predict_file(&self, payload: &ImagePayload) -> Result<PredictResponse, BackendError> {
        let form = Form::new().part("file", file_part(payload)?);
        let request = self.client.post(self.endpoint(PREDICT_PATH)).multipart(form);
        self.send(request).await
    }

    async fn predict_inline(
        &self,
        payload: &ImagePayload,
    ) -> Result<PredictResponse, BackendError> {
        let encoded = STANDARD.encode(payload.bytes());
        let request = self
            .client
            .post(self.endpoint(PREDICT_PATH))
            .json(&InlineImage { image: &encoded });
        self.send(request).await
    }

    async fn depthgpt(
        &self,
        payload: &ImagePayload,
        prompt: &str,
    ) -> Result<DepthGptResponse, BackendError> {
        let form = Form::new()
            .part("file", file_part(payload)?)
            .text("prompt", prompt.to_string());
        let request = self.client.post(self.endpoint(DEPTHGPT_PATH)).multipart(form);
        self.send(request).await
    }
}

fn file_part(payload: &ImagePayload) -> Result<Part, BackendError> {
    Part::bytes(payload.bytes().to_vec())
        .file_name(payload.file_name().to_string())
        .mime_str(payload.mime_type())
        .map_err(|error| BackendError::Transport(format!("invalid mime type: {error}")))
}

fn transport_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        warn!(%error, "backend request timed out");
    }
    BackendError::Transport(error.to_string())
}

/// Only a string `detail` counts as a server message.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}
