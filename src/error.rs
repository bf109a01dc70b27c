// Error taxonomy for a single upload-and-analyze submission. Every variant
// is terminal for the current submission only; the user can always retry.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

pub type DetectResult<T> = Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum DetectError {
    /// Submit was triggered without a file. Never shown to the user.
    #[error("no file selected")]
    NoFileSelected,

    #[error("failed to read image file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    /// Non-2xx answer. `message` is the body's `error` field when present.
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("Unknown error"))]
    Backend {
        status: StatusCode,
        message: Option<String>,
    },

    /// Selected file does not look like an image by its extension.
    #[error("not an image file: {}", .0.display())]
    NotAnImage(PathBuf),

    #[error("invalid response from backend: {0}")]
    MalformedResponse(String),

    #[error("a detection request is already pending")]
    Busy,
}

impl DetectError {
    /// Whether a failed attempt is worth one more try. Only connection
    /// failures and timeouts qualify; the backend answering is final.
    pub fn is_transient(&self) -> bool {
        match self {
            DetectError::Network(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Silent errors are swallowed by the UI instead of rendered.
    pub fn is_silent(&self) -> bool {
        matches!(self, DetectError::NoFileSelected)
    }
}
