//! Comparison driver: the same payload through several providers at once.

use crate::client::ProviderClient;
use crate::config::CredentialSource;
use crate::error::ErrorKind;
use crate::outcome::{AnalysisOutcome, ComparisonReport};
use crate::provider::{ProviderId, ProviderRegistry};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Orchestrates provider calls and collects one report entry per provider.
#[derive(Clone)]
pub struct ComparisonDriver {
    registry: Arc<ProviderRegistry>,
    credentials: Arc<CredentialSource>,
    client: ProviderClient,
}

impl ComparisonDriver {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<CredentialSource>,
        client: ProviderClient,
    ) -> Self {
        Self {
            registry,
            credentials,
            client,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn credentials(&self) -> &CredentialSource {
        &self.credentials
    }

    /// Single-provider mode: look up, call, and return the full outcome.
    pub async fn analyze(&self, id: ProviderId, payload: &str) -> AnalysisOutcome {
        match self.registry.lookup(id) {
            Ok(config) => {
                let credential = self.credentials.get(config.credential_name);
                self.client.call(config, credential, payload).await
            }
            Err(e) => AnalysisOutcome::failure(ErrorKind::ProviderNotRegistered, e.to_string()),
        }
    }

    /// Run `payload` through every provider in `providers`, concurrently.
    ///
    /// The report holds exactly one entry per distinct provider, in the given
    /// order, whatever each call's outcome.
    pub async fn compare_all(&self, payload: &str, providers: &[ProviderId]) -> ComparisonReport {
        let mut order: Vec<ProviderId> = Vec::with_capacity(providers.len());
        for id in providers {
            if !order.contains(id) {
                order.push(*id);
            }
        }

        info!("Comparing {} providers: {:?}", order.len(), order);

        let payload: Arc<str> = Arc::from(payload);
        let mut tasks = JoinSet::new();
        for (slot, id) in order.iter().copied().enumerate() {
            let driver = self.clone();
            let payload = Arc::clone(&payload);
            tasks.spawn(async move {
                let outcome = driver.analyze(id, &payload).await;
                (slot, outcome.is_success(), outcome.display())
            });
        }

        let mut slots: Vec<Option<String>> = vec![None; order.len()];
        let mut succeeded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, ok, text)) => {
                    succeeded += usize::from(ok);
                    slots[slot] = Some(text);
                }
                Err(e) => error!("Provider task failed: {}", e),
            }
        }

        let entries = order
            .into_iter()
            .zip(slots)
            .map(|(id, text)| {
                let text = text.unwrap_or_else(|| "ERROR: provider task aborted".to_string());
                (id, text)
            })
            .collect();

        let report = ComparisonReport::from_entries(entries);
        if report.is_empty() {
            warn!("Comparison requested with no providers");
        } else {
            info!("Comparison finished: {}/{} providers succeeded", succeeded, report.len());
        }
        report
    }
}
