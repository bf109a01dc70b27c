// Turns the outcome of a submission into the one line the user sees.

use crate::api::{DetectionResult, Label};
use crate::error::DetectError;

/// A rendered outcome: the text plus whether it reads as success.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Success(String),
    Failure(String),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Message::Success(s) | Message::Failure(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Message::Success(_))
    }
}

/// `Name (Confidence%)` with two decimals.
pub fn format_label(label: &Label) -> String {
    format!("{} ({:.2}%)", label.name, label.confidence)
}

pub fn render_result(result: &DetectionResult) -> Message {
    if result.labels.is_empty() {
        return Message::Success("No labels detected".into());
    }
    let labels = result
        .labels
        .iter()
        .map(format_label)
        .collect::<Vec<_>>()
        .join(", ");
    Message::Success(format!("Labels: {}", labels))
}

/// Render an error, or `None` for errors that are silently ignored.
pub fn render_error(err: &DetectError) -> Option<Message> {
    let text = match err {
        DetectError::NoFileSelected => return None,
        DetectError::Backend { message, .. } => {
            format!("Error: {}", message.as_deref().unwrap_or("Unknown error"))
        }
        DetectError::MalformedResponse(detail) => {
            format!("Error: Invalid response from backend: {}", detail)
        }
        DetectError::NotAnImage(path) => format!("Error: Not an image file: {}", path.display()),
        DetectError::Busy => "Error: A request is already in progress".into(),
        DetectError::FileRead { .. } | DetectError::Network(_) => format!("Fetch error: {}", err),
    };
    Some(Message::Failure(text))
}

pub fn render(outcome: &Result<DetectionResult, DetectError>) -> Option<Message> {
    match outcome {
        Ok(result) => Some(render_result(result)),
        Err(e) => render_error(e),
    }
}
