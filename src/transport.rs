//! HTTP seam shared by the provider client and the OCR extractor.
//!
//! Requests are described as plain data ([`OutboundRequest`]) so that
//! authentication can be applied without I/O and tests can swap the
//! transport for a double.

use crate::provider::AuthStyle;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Form field carrying the credential for [`AuthStyle::MultipartField`].
pub const MULTIPART_KEY_FIELD: &str = "apikey";

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Form(FormBody),
}

#[derive(Debug, Clone, Default)]
pub struct FormBody {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request failed: {0}")]
    Other(String),
}

impl OutboundRequest {
    pub fn json(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Json(body),
        }
    }

    pub fn form(url: impl Into<String>, form: FormBody) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Form(form),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach `credential` the way `style` requires.
    pub fn authenticate(mut self, style: AuthStyle, credential: &str) -> Result<Self, TransportError> {
        match style {
            AuthStyle::QueryParam => {
                let mut url = reqwest::Url::parse(&self.url)
                    .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", self.url, e)))?;
                url.query_pairs_mut().append_pair("key", credential);
                self.url = url.to_string();
            }
            AuthStyle::BearerHeader => {
                self.headers
                    .push(("Authorization".to_string(), format!("Bearer {}", credential)));
            }
            AuthStyle::MultipartField => match &mut self.body {
                RequestBody::Form(form) => form
                    .fields
                    .push((MULTIPART_KEY_FIELD.to_string(), credential.to_string())),
                RequestBody::Json(_) => {
                    return Err(TransportError::InvalidRequest(
                        "multipart-field authentication needs a form body".to_string(),
                    ))
                }
            },
        }
        Ok(self)
    }
}

/// Issues one POST and returns status plus body text. No retries.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        use reqwest::multipart::{Form, Part};

        debug!("POST {}", redact_query(&request.url));

        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(form) => {
                let mut multipart = Form::new();
                for (name, value) in form.fields {
                    multipart = multipart.text(name, value);
                }
                if let Some(file) = form.file {
                    let part = Part::bytes(file.data)
                        .file_name(file.file_name)
                        .mime_str(&file.mime)
                        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                    multipart = multipart.part(file.field, part);
                }
                builder.multipart(multipart)
            }
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        debug!("Response {} ({} bytes)", status, body.len());
        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let (timeout, connect) = (err.is_timeout(), err.is_connect());
    let message = err.without_url().to_string();
    if timeout {
        TransportError::Timeout(message)
    } else if connect {
        TransportError::Connect(message)
    } else {
        TransportError::Other(message)
    }
}

/// Strip the query string so query-param credentials never reach the logs.
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
