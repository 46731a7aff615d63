//! HTTP facade over the analyzer.

use crate::app::{Analyzer, ComparisonAnalysis, SingleAnalysis};
use crate::error::InputError;
use crate::input::ResolvedInput;
use crate::provider::{parse_provider_list, ProviderId};
use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    analyzer: Analyzer,
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn router(analyzer: Analyzer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/providers", get(list_providers))
        .route("/analyze", post(analyze))
        .route("/compare", post(compare))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { analyzer })
}

pub async fn serve(analyzer: Analyzer, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ProviderStatus {
    id: ProviderId,
    credential: &'static str,
    configured: bool,
}

/// List registered providers and whether their credential is present.
async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderStatus>> {
    let driver = state.analyzer.driver();
    let statuses = driver
        .registry()
        .iter()
        .map(|config| ProviderStatus {
            id: config.id,
            credential: config.credential_name,
            configured: driver.credentials().contains(config.credential_name),
        })
        .collect();
    Json(statuses)
}

#[derive(Debug, Deserialize)]
struct AnalyzeQuery {
    provider: Option<String>,
    #[serde(default)]
    raw: bool,
}

/// Run one provider over the posted text or file. When the provider fails,
/// the sentiment label comes from the keyword lexicon instead.
async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    request: Request,
) -> Result<Json<SingleAnalysis>, ApiError> {
    let provider = match query.provider.as_deref() {
        Some(raw) => raw
            .parse::<ProviderId>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => ProviderId::Generative,
    };

    let input = read_input(&state, request).await?;
    info!("Analyzing {} ({} chars) with {}", input.source, input.text.len(), provider);

    let analysis = state.analyzer.analyze(&input, provider, query.raw).await;
    if let Some(kind) = analysis.error {
        warn!("{} failed ({}), using keyword sentiment", provider, kind);
    }
    Ok(Json(analysis.with_lexicon_fallback(&input.text)))
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    providers: Option<String>,
}

/// Run every provider (or the requested subset) over the posted text or file.
async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
    request: Request,
) -> Result<Json<ComparisonAnalysis>, ApiError> {
    let providers = match query.providers.as_deref() {
        Some(raw) => parse_provider_list(raw)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => ProviderId::ALL.to_vec(),
    };
    if providers.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No providers requested"));
    }

    let input = read_input(&state, request).await?;
    info!("Comparing {} ({} chars)", input.source, input.text.len());

    Ok(Json(state.analyzer.compare(&input, &providers).await))
}

// ============================================================================
// Helper functions
// ============================================================================

#[derive(Debug, Deserialize)]
struct TextBody {
    text: Option<String>,
}

/// Accept either a JSON `{"text": ...}` body or a multipart upload.
async fn read_input(state: &AppState, request: Request) -> Result<ResolvedInput, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let Json(body) = Json::<TextBody>::from_request(request, state)
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
        let text = body
            .text
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Text or file is required"))?;
        return ResolvedInput::from_text("request", &text).map_err(input_error);
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let mut text = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
                })?;
                info!("Received file: {} ({} bytes)", filename, data.len());
                return state
                    .analyzer
                    .resolver()
                    .resolve_bytes(&filename, data.to_vec())
                    .await
                    .map_err(input_error);
            }
            Some("text") => {
                text = Some(field.text().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("Failed to read text: {}", e))
                })?);
            }
            _ => {}
        }
    }

    match text {
        Some(text) => ResolvedInput::from_text("request", &text).map_err(input_error),
        None => Err(api_error(StatusCode::BAD_REQUEST, "Text or file is required")),
    }
}

fn input_error(err: InputError) -> ApiError {
    let status = match &err {
        InputError::EmptyText(_) | InputError::NotFound(_) => StatusCode::BAD_REQUEST,
        InputError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        InputError::MissingCredential(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    warn!("Input rejected ({}): {}", err.kind(), err);
    api_error(status, format!("{}: {}", err.kind(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::CannedTransport;
    use crate::config::{self, CredentialSource, Settings};
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn spawn(analyzer: Analyzer) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(analyzer)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn classifier_only() -> Analyzer {
        Analyzer::with_transport(
            &Settings::default(),
            CredentialSource::from_pairs([(config::CLASSIFIER_KEY, "hf")]),
            Arc::new(CannedTransport::ok(200, r#"[{"label":"3 stars","score":0.4}]"#)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn health_and_provider_listing() {
        let base = spawn(classifier_only()).await;
        let client = reqwest::Client::new();

        let health = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let providers: Value = client
            .get(format!("{}/providers", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(providers[0]["id"], "generative");
        assert_eq!(providers[0]["configured"], false);
        assert_eq!(providers[2]["id"], "classifier");
        assert_eq!(providers[2]["configured"], true);
    }

    #[tokio::test]
    async fn analyze_json_text() {
        let base = spawn(classifier_only()).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{}/analyze?provider=bert", base))
            .json(&json!({ "text": "Okay results." }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["provider"], "classifier");
        assert_eq!(body["result"], "3 stars (0.400)");
        assert_eq!(body["sentiment"], "Neutral");
        assert_eq!(body["sentiment_score"], 0.5);
        assert_eq!(body["sentiment_source"], "provider");
        assert_eq!(body["stats"]["word_count"], 2);
    }

    #[tokio::test]
    async fn failed_provider_falls_back_to_keywords() {
        let base = spawn(classifier_only()).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{}/analyze?provider=generative", base))
            .json(&json!({ "text": "Harga menurun dan perusahaan rugi." }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["error"], "missing_credential");
        assert!(body["result"].as_str().unwrap().starts_with("ERROR: "));
        assert_eq!(body["sentiment"], "Negative");
        assert_eq!(body["sentiment_score"], 0.3);
        assert_eq!(body["sentiment_source"], "lexicon");
    }

    #[tokio::test]
    async fn compare_reports_every_provider() {
        let base = spawn(classifier_only()).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{}/compare", base))
            .json(&json!({ "text": "Okay results." }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let report = body["report"].as_object().unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report["classifier"], "3 stars (0.400)");
        assert_eq!(
            report["chat"],
            "ERROR: missing_credential: credential for chat not configured"
        );
        assert!(body.get("sentiment").is_none());
    }

    #[tokio::test]
    async fn multipart_text_file_upload() {
        let base = spawn(classifier_only()).await;
        let part = reqwest::multipart::Part::bytes(b"Shares slid.".to_vec()).file_name("news.txt");
        let form = reqwest::multipart::Form::new().part("file", part);

        let body: Value = reqwest::Client::new()
            .post(format!("{}/analyze?provider=classifier", base))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["source"], "news.txt");
        assert_eq!(body["result"], "3 stars (0.400)");
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let base = spawn(classifier_only()).await;
        let client = reqwest::Client::new();

        let blank = client
            .post(format!("{}/analyze", base))
            .json(&json!({ "text": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(blank.status(), 400);

        let unknown = client
            .post(format!("{}/analyze?provider=gpt", base))
            .json(&json!({ "text": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), 400);

        let part = reqwest::multipart::Part::bytes(b"x".to_vec()).file_name("notes.docx");
        let unsupported = client
            .post(format!("{}/compare", base))
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        assert_eq!(unsupported.status(), 415);
        let body: Value = unsupported.json().await.unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("unsupported_input_format"));
    }
}
