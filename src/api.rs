// API client module: a small blocking HTTP client that posts one image to
// the detection backend's `/detect` endpoint and parses the labels back.

use crate::config::Config;
use crate::error::{DetectError, DetectResult};
use crate::upload;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Blocking client for the detection backend. Clones share the pending
/// flag, so at most one submission is in flight per client family.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    detect_url: Url,
    retry: bool,
    pending: Arc<AtomicBool>,
}

/// Body of `POST /detect`: the base64 image without its data URI prefix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub image: String,
}

impl UploadRequest {
    /// Build the request from a `data:...;base64,` URI or a bare payload.
    pub fn from_data_uri(data_uri: &str) -> Self {
        UploadRequest {
            image: upload::strip_data_uri(data_uri).to_string(),
        }
    }
}

/// One detected class. Field names follow the backend's JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Label {
    #[serde(rename = "Name")]
    pub name: String,
    /// Percentage in 0..=100.
    #[serde(rename = "Confidence")]
    pub confidence: f64,
}

/// Successful answer from the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    /// Missing or `null` labels read as an empty set.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<Label>,
    /// Id of the stored record, when the backend keeps one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Label>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Label>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Shape of a non-2xx body; every field is optional.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> DetectResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(ApiClient {
            client,
            detect_url: config.detect_url(),
            retry: config.retry,
            pending: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn detect_url(&self) -> &Url {
        &self.detect_url
    }

    /// Whether a submission is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Full flow for one selected file: encode it and submit it.
    pub fn analyze_file(&self, path: &Path) -> DetectResult<DetectionResult> {
        let data_uri = upload::encode(path)?;
        self.detect(&UploadRequest::from_data_uri(&data_uri))
    }

    /// POST the image and parse the labels. Refuses to start while another
    /// submission from this client is pending.
    pub fn detect(&self, req: &UploadRequest) -> DetectResult<DetectionResult> {
        let _guard = PendingGuard::acquire(&self.pending)?;

        match self.send(req) {
            Err(e) if self.retry && e.is_transient() => {
                warn!(error = %e, "detect request failed, retrying once");
                self.send(req)
            }
            other => other,
        }
    }

    fn send(&self, req: &UploadRequest) -> DetectResult<DetectionResult> {
        debug!(url = %self.detect_url, payload_len = req.image.len(), "posting image");
        let res = self
            .client
            .post(self.detect_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(req)
            .send()?;

        let status = res.status();
        let body = res.text()?;
        debug!(%status, body_len = body.len(), "detect response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty());
            return Err(DetectError::Backend { status, message });
        }

        let result: DetectionResult = serde_json::from_str(&body)
            .map_err(|e| DetectError::MalformedResponse(e.to_string()))?;
        info!(labels = result.labels.len(), id = ?result.id, "detection complete");
        Ok(result)
    }
}

/// Holds the pending flag for the duration of one submission.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> DetectResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| DetectError::Busy)?;
        Ok(PendingGuard { flag })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
