// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to run the upload-and-analyze flow.
//
// Module responsibilities:
// - `config`: backend URL, timeout and retry settings.
// - `upload`: preview and base64 encoding of the selected image.
// - `api`: the `POST /detect` client and its wire types.
// - `render`: turns a detection result or error into the shown message.
// - `ui`: the terminal menu, file picker and spinner.
pub mod api;
pub mod config;
pub mod error;
pub mod render;
pub mod ui;
pub mod upload;

pub use api::{ApiClient, DetectionResult, Label, UploadRequest};
pub use config::Config;
pub use error::{DetectError, DetectResult};
