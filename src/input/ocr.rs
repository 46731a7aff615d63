//! Image to text through a remote OCR endpoint.
//!
//! Defines the [`OcrExtractor`] seam and the OCR.space-compatible
//! implementation, which uploads the image as multipart form data with the
//! credential carried as a form field.

use crate::config::{OcrSettings, OCR_KEY};
use crate::error::{truncate_chars, InputError};
use crate::provider::AuthStyle;
use crate::transport::{FilePart, FormBody, HttpTransport, OutboundRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw image bytes plus the name they were uploaded or read under.
#[derive(Debug, Clone)]
pub struct OcrInput {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Async trait implemented by each OCR backend.
#[async_trait::async_trait]
pub trait OcrExtractor: Send + Sync {
    fn name(&self) -> &str;
    async fn extract_text(&self, input: &OcrInput) -> Result<String, InputError>;
}

// ── OCR.space response types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

pub struct OcrSpaceExtractor {
    settings: OcrSettings,
    credential: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl OcrSpaceExtractor {
    pub fn new(
        settings: OcrSettings,
        credential: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            settings,
            credential,
            transport,
        }
    }

    fn form(&self, input: &OcrInput) -> FormBody {
        FormBody {
            fields: vec![
                ("language".to_string(), self.settings.language.clone()),
                ("OCREngine".to_string(), self.settings.engine.clone()),
            ],
            file: Some(FilePart {
                field: "file".to_string(),
                file_name: input.file_name.clone(),
                mime: image_mime(&input.file_name).to_string(),
                data: input.data.clone(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl OcrExtractor for OcrSpaceExtractor {
    fn name(&self) -> &str {
        "ocr_space"
    }

    async fn extract_text(&self, input: &OcrInput) -> Result<String, InputError> {
        let credential = self
            .credential
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(InputError::MissingCredential(OCR_KEY))?;

        let request = OutboundRequest::form(&self.settings.endpoint, self.form(input))
            .authenticate(AuthStyle::MultipartField, credential)
            .map_err(|e| InputError::Transport(e.to_string()))?;

        info!(
            "OCR: uploading {} ({} bytes)",
            input.file_name,
            input.data.len()
        );

        let response = self
            .transport
            .post(request)
            .await
            .map_err(|e| InputError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(InputError::RemoteRejected(format!(
                "OCR API error ({}): {}",
                response.status,
                truncate_chars(&response.body, 1000)
            )));
        }

        debug!(
            "OCR: raw response ({} bytes): {}",
            response.body.len(),
            truncate_chars(&response.body, 500)
        );

        let parsed: OcrResponse = serde_json::from_str(&response.body)
            .map_err(|e| InputError::Malformed(format!("OCR response: {}", e)))?;

        if parsed.is_errored_on_processing {
            let message = parsed
                .error_message
                .map(|m| error_message_text(&m))
                .unwrap_or_else(|| "processing failed".to_string());
            warn!("OCR: remote processing error: {}", message);
            return Err(InputError::Ocr(message));
        }

        parsed
            .parsed_results
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.parsed_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| InputError::NoTextFound(input.file_name.clone()))
    }
}

/// `ErrorMessage` arrives as a string or a list of strings.
fn error_message_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

fn image_mime(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}
