//! Provider registry: one immutable [`ProviderConfig`] per [`ProviderId`].

use crate::config::{self, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

/// The analysis backends, in the fixed comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Generative-language API (Gemini style).
    Generative,
    /// Chat-completion API (OpenRouter style).
    Chat,
    /// Transformer sentiment classifier (hosted inference style).
    Classifier,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [Self::Generative, Self::Chat, Self::Classifier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generative => "generative",
            Self::Chat => "chat",
            Self::Classifier => "classifier",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider '{0}' (expected generative, chat or classifier)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generative" | "gemini" => Ok(Self::Generative),
            "chat" | "deepseek" => Ok(Self::Chat),
            "classifier" | "bert" => Ok(Self::Classifier),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// How the credential travels with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStyle {
    /// `?key=<credential>` appended to the endpoint.
    QueryParam,
    /// `Authorization: Bearer <credential>`.
    BearerHeader,
    /// Credential sent as a form field of a multipart body.
    MultipartField,
}

/// Everything needed to call one provider. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub endpoint: String,
    pub credential_name: &'static str,
    pub auth: AuthStyle,
    model: Option<String>,
    prompt: Option<String>,
}

impl ProviderConfig {
    pub fn new(id: ProviderId, settings: &Settings) -> Self {
        match id {
            ProviderId::Generative => Self {
                id,
                endpoint: settings.generative.endpoint.clone(),
                credential_name: config::GENERATIVE_KEY,
                auth: AuthStyle::QueryParam,
                model: None,
                prompt: Some(settings.generative.prompt.clone()),
            },
            ProviderId::Chat => Self {
                id,
                endpoint: settings.chat.endpoint.clone(),
                credential_name: config::CHAT_KEY,
                auth: AuthStyle::BearerHeader,
                model: Some(settings.chat.model.clone()),
                prompt: Some(settings.chat.prompt.clone()),
            },
            ProviderId::Classifier => Self {
                id,
                endpoint: settings.classifier.endpoint.clone(),
                credential_name: config::CLASSIFIER_KEY,
                auth: AuthStyle::BearerHeader,
                model: None,
                prompt: None,
            },
        }
    }

    /// Build the JSON request body for `text`. Pure, no I/O.
    pub fn build_request(&self, text: &str) -> Value {
        let prompt = || config::render_prompt(self.prompt.as_deref().unwrap_or("{text}"), text);
        match self.id {
            ProviderId::Generative => json!({
                "contents": [
                    { "parts": [ { "text": prompt() } ] }
                ]
            }),
            ProviderId::Chat => json!({
                "model": self.model.as_deref().unwrap_or_default(),
                "messages": [
                    { "role": "user", "content": prompt() }
                ]
            }),
            // The classifier scores raw text, no prompt.
            ProviderId::Classifier => json!({ "inputs": text }),
        }
    }

    /// Provider-specific headers beyond authentication.
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        match self.id {
            ProviderId::Chat => vec![("X-Title".to_string(), "sentiment-compare".to_string())],
            ProviderId::Generative | ProviderId::Classifier => Vec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("provider {0} is not registered")]
pub struct ProviderNotFound(pub ProviderId);

/// Lookup table from [`ProviderId`] to its configuration.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    configs: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    /// Register every known provider.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_providers(settings, &ProviderId::ALL)
    }

    /// Register only `ids`, e.g. to run against a subset.
    pub fn with_providers(settings: &Settings, ids: &[ProviderId]) -> Self {
        let mut configs: Vec<ProviderConfig> = Vec::with_capacity(ids.len());
        for id in ids {
            if !configs.iter().any(|c| c.id == *id) {
                configs.push(ProviderConfig::new(*id, settings));
            }
        }
        Self { configs }
    }

    pub fn lookup(&self, id: ProviderId) -> Result<&ProviderConfig, ProviderNotFound> {
        self.configs
            .iter()
            .find(|c| c.id == id)
            .ok_or(ProviderNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.configs.iter()
    }
}

/// Parse a comma-separated provider list, keeping first-seen order.
pub fn parse_provider_list(raw: &str) -> Result<Vec<ProviderId>, UnknownProvider> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: ProviderId = part.parse()?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
