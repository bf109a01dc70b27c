// Local side of a submission: turning the selected file into a preview
// and into the base64 payload the backend expects.

use crate::error::{DetectError, DetectResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Extensions accepted by the file picker, the `image/*` filter.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// Guess the MIME type from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub fn is_image(path: &Path) -> bool {
    mime_for(path).starts_with("image/")
}

/// What gets shown as soon as a file is picked, before any network call.
#[derive(Debug, Clone)]
pub struct Preview {
    pub url: Url,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime: &'static str,
}

impl std::fmt::Display for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {})\n{}",
            self.file_name,
            self.mime,
            human_size(self.size_bytes),
            self.url
        )
    }
}

/// Build a local `file://` preview of the selected image.
pub fn preview(path: &Path) -> DetectResult<Preview> {
    let absolute = path.canonicalize().map_err(|e| read_error(path, e))?;
    let meta = std::fs::metadata(&absolute).map_err(|e| read_error(path, e))?;
    let url = Url::from_file_path(&absolute).map_err(|_| {
        read_error(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is not absolute"),
        )
    })?;
    let file_name = absolute
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(Preview {
        url,
        file_name,
        size_bytes: meta.len(),
        mime: mime_for(&absolute),
    })
}

/// Read the file into a `data:<mime>;base64,<payload>` URI.
pub fn encode(path: &Path) -> DetectResult<String> {
    let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
    Ok(format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes)))
}

/// Strip the data URI scheme, keeping everything after the first comma.
/// Input without a comma is taken to be a bare payload already.
pub fn strip_data_uri(data_uri: &str) -> &str {
    match data_uri.split_once(',') {
        Some((_, payload)) => payload,
        None => data_uri,
    }
}

/// Resolve an optional selection into a path, rejecting an empty one.
pub fn selected(path: Option<PathBuf>) -> DetectResult<PathBuf> {
    match path {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        _ => Err(DetectError::NoFileSelected),
    }
}

/// Reject files outside the image filter before anything is read or sent.
pub fn require_image(path: &Path) -> DetectResult<()> {
    if is_image(path) {
        Ok(())
    } else {
        Err(DetectError::NotAnImage(path.to_path_buf()))
    }
}

fn read_error(path: &Path, source: std::io::Error) -> DetectError {
    DetectError::FileRead {
        path: path.to_path_buf(),
        source,
    }
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
