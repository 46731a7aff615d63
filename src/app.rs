//! Wiring: settings and credentials in, ready-to-use analyzer out.

use crate::client::ProviderClient;
use crate::compare::ComparisonDriver;
use crate::config::{CredentialSource, Settings, OCR_KEY};
use crate::error::{ErrorKind, InputError};
use crate::input::ocr::OcrSpaceExtractor;
use crate::input::{ContentKind, InputResolver, InputSource, PageFetcher, ResolvedInput};
use crate::outcome::{AnalysisOutcome, ComparisonReport};
use crate::provider::{ProviderId, ProviderRegistry};
use crate::sentiment::{self, SentimentVerdict};
use crate::stats::{self, TextStats};
use crate::transport::{HttpTransport, ReqwestTransport};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Single-provider result as printed or returned over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct SingleAnalysis {
    pub source: String,
    pub kind: ContentKind,
    pub provider: ProviderId,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(flatten)]
    pub sentiment: Option<SentimentVerdict>,
    pub stats: TextStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl SingleAnalysis {
    /// Fill a missing verdict from the keyword lexicon over `text`.
    /// The provider result and error stay as they are.
    pub fn with_lexicon_fallback(mut self, text: &str) -> Self {
        if self.sentiment.is_none() {
            self.sentiment = Some(sentiment::from_lexicon(text));
        }
        self
    }
}

/// Comparison-mode result as printed or returned over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonAnalysis {
    pub source: String,
    pub kind: ContentKind,
    pub stats: TextStats,
    pub report: ComparisonReport,
}

/// Input resolver plus comparison driver, shared by the CLI and the server.
#[derive(Clone)]
pub struct Analyzer {
    resolver: InputResolver,
    driver: ComparisonDriver,
}

impl Analyzer {
    pub fn new(resolver: InputResolver, driver: ComparisonDriver) -> Self {
        Self { resolver, driver }
    }

    /// Build every component from configuration, sharing one HTTP client.
    pub fn from_settings(settings: &Settings, credentials: CredentialSource) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(settings.request_timeout())?);
        Self::with_transport(settings, credentials, transport)
    }

    pub fn with_transport(
        settings: &Settings,
        credentials: CredentialSource,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let ocr = OcrSpaceExtractor::new(
            settings.ocr.clone(),
            credentials.get(OCR_KEY).map(str::to_string),
            Arc::clone(&transport),
        );
        let resolver = InputResolver::new(Arc::new(ocr), PageFetcher::new(&settings.fetch)?);
        let driver = ComparisonDriver::new(
            Arc::new(ProviderRegistry::from_settings(settings)),
            Arc::new(credentials),
            ProviderClient::new(transport),
        );
        Ok(Self::new(resolver, driver))
    }

    pub fn resolver(&self) -> &InputResolver {
        &self.resolver
    }

    pub fn driver(&self) -> &ComparisonDriver {
        &self.driver
    }

    pub async fn resolve(&self, source: &InputSource) -> Result<ResolvedInput, InputError> {
        self.resolver.resolve(source).await
    }

    pub async fn analyze(
        &self,
        input: &ResolvedInput,
        provider: ProviderId,
        keep_raw: bool,
    ) -> SingleAnalysis {
        let outcome = self.driver.analyze(provider, &input.text).await;
        let (error, verdict, raw) = match &outcome {
            AnalysisOutcome::Success { raw_body, summary } => (
                None,
                Some(sentiment::from_summary(provider, summary)),
                keep_raw.then(|| raw_body.clone()),
            ),
            AnalysisOutcome::Failure(failure) => (Some(failure.kind), None, None),
        };
        SingleAnalysis {
            source: input.source.clone(),
            kind: input.kind,
            provider,
            result: outcome.display(),
            error,
            sentiment: verdict,
            stats: stats::analyze(&input.text),
            raw,
        }
    }

    pub async fn compare(
        &self,
        input: &ResolvedInput,
        providers: &[ProviderId],
    ) -> ComparisonAnalysis {
        let report = self.driver.compare_all(&input.text, providers).await;
        ComparisonAnalysis {
            source: input.source.clone(),
            kind: input.kind,
            stats: stats::analyze(&input.text),
            report,
        }
    }
}
