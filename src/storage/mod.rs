/// Content storage
///
/// Uploads of raw bytes (collection manifests, banner and thumbnail
/// images) as signed data items.

pub mod bundler;

pub use bundler::BundlerClient;

use crate::{
    error::{UploadError, UploadResult},
    tags::Tag,
    wallet::DataItemSigner,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Uploads byte payloads with tags; returns the content id
#[async_trait]
pub trait ContentUploader: Send + Sync {
    async fn upload(
        &self,
        data: Vec<u8>,
        tags: Vec<Tag>,
        signer: &dyn DataItemSigner,
    ) -> UploadResult<String>;
}

/// Decoded `data:<type>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> UploadResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::Validation("Not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| UploadError::Validation("Data URL has no payload".to_string()))?;
        let content_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| UploadError::Validation("Data URL is not base64 encoded".to_string()))?;

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| UploadError::Validation(format!("Invalid data URL payload: {}", e)))?;

        Ok(Self {
            content_type: if content_type.is_empty() {
                OCTET_STREAM.to_string()
            } else {
                content_type.to_string()
            },
            data,
        })
    }
}

/// Content type of a file: explicit type, sniffed image format, extension,
/// then `application/octet-stream`
pub fn detect_content_type(path: &Path, data: &[u8], explicit: Option<&str>) -> String {
    if let Some(content_type) = explicit.filter(|c| !c.is_empty()) {
        return content_type.to_string();
    }

    if let Ok(format) = image::guess_format(data) {
        return format.to_mime_type().to_string();
    }

    if let Ok(format) = image::ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => OCTET_STREAM,
    }
    .to_string()
}
