//! Provider client: one authenticated POST per call, mapped to an outcome.

use crate::error::{truncate_chars, ErrorKind};
use crate::normalize;
use crate::outcome::AnalysisOutcome;
use crate::provider::ProviderConfig;
use crate::transport::{HttpTransport, OutboundRequest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Calls providers through a shared [`HttpTransport`].
#[derive(Clone)]
pub struct ProviderClient {
    transport: Arc<dyn HttpTransport>,
}

impl ProviderClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Send `text` to the provider described by `config`.
    ///
    /// A missing credential returns before any request is built. Every other
    /// failure is reported as an [`AnalysisOutcome::Failure`], never an error.
    pub async fn call(
        &self,
        config: &ProviderConfig,
        credential: Option<&str>,
        text: &str,
    ) -> AnalysisOutcome {
        let Some(credential) = credential.filter(|c| !c.trim().is_empty()) else {
            warn!("{}: {} not set, skipping request", config.id, config.credential_name);
            return AnalysisOutcome::failure(
                ErrorKind::MissingCredential,
                format!("credential for {} not configured", config.id),
            );
        };

        let mut request = OutboundRequest::json(&config.endpoint, config.build_request(text));
        for (name, value) in config.extra_headers() {
            request = request.header(name, value);
        }
        let request = match request.authenticate(config.auth, credential) {
            Ok(request) => request,
            Err(e) => return AnalysisOutcome::failure(ErrorKind::Transport, e.to_string()),
        };

        info!("{}: sending {} chars of text", config.id, text.chars().count());

        let response = match self.transport.post(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{}: transport failure: {}", config.id, e);
                return AnalysisOutcome::failure(ErrorKind::Transport, e.to_string());
            }
        };

        if !response.is_success() {
            warn!("{}: remote rejected request with status {}", config.id, response.status);
            return AnalysisOutcome::failure(
                ErrorKind::RemoteRejected,
                format!(
                    "{} - {}",
                    response.status,
                    truncate_chars(&response.body, MAX_ERROR_BODY_CHARS)
                ),
            );
        }

        let raw_body: Value = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(e) => {
                warn!("{}: response is not JSON: {}", config.id, e);
                return AnalysisOutcome::failure(
                    ErrorKind::MalformedResponse,
                    format!(
                        "invalid JSON from {}: {} (body: {})",
                        config.id,
                        e,
                        truncate_chars(&response.body, 200)
                    ),
                );
            }
        };

        let summary = normalize::summarize(config.id, &raw_body);
        debug!("{}: summary is {} chars", config.id, summary.len());

        AnalysisOutcome::Success { raw_body, summary }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::provider::ProviderId;
    use crate::transport::{ReqwestTransport, TransportError, TransportResponse};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fails the test if any request reaches it.
    pub(crate) struct ForbiddenTransport;

    #[async_trait::async_trait]
    impl HttpTransport for ForbiddenTransport {
        async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
            panic!("unexpected network call to {}", request.url);
        }
    }

    /// Replies with a fixed response and records what was sent.
    pub(crate) struct CannedTransport {
        pub reply: Result<(u16, String), String>,
        pub seen: Mutex<Vec<OutboundRequest>>,
    }

    impl CannedTransport {
        pub(crate) fn ok(status: u16, body: impl Into<String>) -> Self {
            Self {
                reply: Ok((status, body.into())),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn timeout() -> Self {
            Self {
                reply: Err("operation timed out".to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for CannedTransport {
        async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok((status, body)) => Ok(TransportResponse {
                    status: *status,
                    body: body.clone(),
                }),
                Err(message) => Err(TransportError::Timeout(message.clone())),
            }
        }
    }

    fn config(id: ProviderId) -> ProviderConfig {
        ProviderConfig::new(id, &Settings::default())
    }

    fn failure_kind(outcome: &AnalysisOutcome) -> ErrorKind {
        match outcome {
            AnalysisOutcome::Failure(f) => f.kind,
            AnalysisOutcome::Success { .. } => panic!("expected failure, got {:?}", outcome),
        }
    }

    #[tokio::test]
    async fn missing_credential_never_touches_network() {
        let client = ProviderClient::new(Arc::new(ForbiddenTransport));
        for id in ProviderId::ALL {
            let outcome = client.call(&config(id), None, "text").await;
            assert_eq!(failure_kind(&outcome), ErrorKind::MissingCredential);
            assert_eq!(
                outcome.display(),
                format!("ERROR: missing_credential: credential for {} not configured", id)
            );
        }
        let outcome = client.call(&config(ProviderId::Chat), Some("  "), "text").await;
        assert_eq!(failure_kind(&outcome), ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn non_2xx_is_remote_rejected_with_truncated_body() {
        let long_body = "x".repeat(5000);
        let client = ProviderClient::new(Arc::new(CannedTransport::ok(503, long_body)));
        let outcome = client.call(&config(ProviderId::Classifier), Some("k"), "t").await;

        match outcome {
            AnalysisOutcome::Failure(f) => {
                assert_eq!(f.kind, ErrorKind::RemoteRejected);
                assert!(f.message.starts_with("503 - "));
                assert_eq!(f.message.len(), "503 - ".len() + 1000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn timeout_is_transport_failure() {
        let client = ProviderClient::new(Arc::new(CannedTransport::timeout()));
        let outcome = client.call(&config(ProviderId::Generative), Some("k"), "t").await;
        assert_eq!(failure_kind(&outcome), ErrorKind::Transport);
        assert!(outcome.display().contains("timed out"));
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let client = ProviderClient::new(Arc::new(CannedTransport::ok(200, "<html>")));
        let outcome = client.call(&config(ProviderId::Chat), Some("k"), "t").await;
        assert_eq!(failure_kind(&outcome), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn success_carries_raw_body_and_summary() {
        let transport = Arc::new(CannedTransport::ok(
            200,
            r#"[{"label":"4 stars","score":0.5}]"#,
        ));
        let client = ProviderClient::new(transport.clone());
        let outcome = client.call(&config(ProviderId::Classifier), Some("hf"), "nice").await;

        assert_eq!(
            outcome,
            AnalysisOutcome::Success {
                raw_body: json!([{ "label": "4 stars", "score": 0.5 }]),
                summary: "4 stars (0.500)".to_string(),
            }
        );

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer hf".to_string())));
    }

    #[tokio::test]
    async fn generative_call_over_http_uses_query_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gen:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Neutral" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.generative.endpoint = format!("{}/v1beta/models/gen:generateContent", server.uri());
        let config = ProviderConfig::new(ProviderId::Generative, &settings);

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let client = ProviderClient::new(Arc::new(transport));
        let outcome = client.call(&config, Some("g-key"), "Prices held.").await;

        assert_eq!(outcome.display(), "Neutral");
    }

    #[tokio::test]
    async fn chat_call_over_http_uses_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer c-key"))
            .and(body_partial_json(json!({ "model": "deepseek/deepseek-chat-v3.1:free" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Positive" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.chat.endpoint = server.uri();
        let config = ProviderConfig::new(ProviderId::Chat, &settings);

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let client = ProviderClient::new(Arc::new(transport));
        let outcome = client.call(&config, Some("c-key"), "Good news.").await;

        assert_eq!(outcome.display(), "Positive");
    }
}
