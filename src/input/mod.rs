//! Input resolution: a path, URL or upload turned into plain text.

pub mod html;
pub mod ocr;
pub mod pdf;

use crate::config::FetchSettings;
use crate::error::{truncate_chars, InputError};
use html::HtmlTextExtractor;
use ocr::{OcrExtractor, OcrInput};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What the payload was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Text,
    Image,
    Pdf,
}

impl ContentKind {
    /// Classify by file extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(Self::Html),
            "txt" | "text" | "md" => Some(Self::Text),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Url(String),
    File { path: PathBuf, kind: ContentKind },
}

impl InputSource {
    /// `http(s)://` arguments are URLs; anything else is a file path.
    pub fn parse(arg: &str) -> Result<Self, InputError> {
        let arg = arg.trim();
        let lower = arg.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Url(arg.to_string()));
        }
        let kind = ContentKind::from_file_name(arg)
            .ok_or_else(|| InputError::UnsupportedFormat(arg.to_string()))?;
        Ok(Self::File {
            path: PathBuf::from(arg),
            kind,
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }
}

/// Extracted payload, ready for analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedInput {
    pub source: String,
    pub kind: ContentKind,
    pub text: String,
}

impl ResolvedInput {
    /// Wrap already-plain text, rejecting blank payloads.
    pub fn from_text(source: impl Into<String>, text: &str) -> Result<Self, InputError> {
        let source = source.into();
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::EmptyText(source));
        }
        Ok(Self {
            source,
            kind: ContentKind::Text,
            text: text.to_string(),
        })
    }
}

/// Downloads pages for URL inputs.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(settings: &FetchSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, InputError> {
        info!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InputError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InputError::RemoteRejected(format!(
                "{} - {}",
                status.as_u16(),
                truncate_chars(&body, 1000)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InputError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Dispatches on content kind to the matching extractor.
#[derive(Clone)]
pub struct InputResolver {
    html: HtmlTextExtractor,
    ocr: Arc<dyn OcrExtractor>,
    fetcher: PageFetcher,
}

impl InputResolver {
    pub fn new(ocr: Arc<dyn OcrExtractor>, fetcher: PageFetcher) -> Self {
        Self {
            html: HtmlTextExtractor,
            ocr,
            fetcher,
        }
    }

    pub async fn resolve(&self, source: &InputSource) -> Result<ResolvedInput, InputError> {
        match source {
            InputSource::Url(url) => {
                let page = self.fetcher.fetch(url).await?;
                let text = self.html.extract_bytes(&page);
                finish(url.clone(), ContentKind::Html, text)
            }
            InputSource::File { path, kind } => {
                let name = path.display().to_string();
                let data = match tokio::fs::read(path).await {
                    Ok(data) => data,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(InputError::NotFound(name))
                    }
                    Err(source) => return Err(InputError::Io { path: name, source }),
                };
                info!("Read {} ({} bytes) as {:?}", name, data.len(), kind);
                self.extract(&name, *kind, data).await
            }
        }
    }

    /// Resolve uploaded bytes, classifying by the file name.
    pub async fn resolve_bytes(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<ResolvedInput, InputError> {
        let kind = ContentKind::from_file_name(file_name)
            .ok_or_else(|| InputError::UnsupportedFormat(file_name.to_string()))?;
        self.extract(file_name, kind, data).await
    }

    async fn extract(
        &self,
        name: &str,
        kind: ContentKind,
        data: Vec<u8>,
    ) -> Result<ResolvedInput, InputError> {
        let text = match kind {
            ContentKind::Html => self.html.extract_bytes(&data),
            ContentKind::Text => String::from_utf8_lossy(&data).into_owned(),
            ContentKind::Pdf => pdf::extract_pdf_text(&data)?,
            ContentKind::Image => {
                let file_name = Path::new(name)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(name)
                    .to_string();
                info!("Running OCR via {}", self.ocr.name());
                self.ocr.extract_text(&OcrInput { file_name, data }).await?
            }
        };
        finish(name.to_string(), kind, text)
    }
}

fn finish(source: String, kind: ContentKind, text: String) -> Result<ResolvedInput, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::EmptyText(source));
    }
    Ok(ResolvedInput {
        source,
        kind,
        text: text.to_string(),
    })
}
