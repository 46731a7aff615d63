//! Runtime configuration: endpoints, prompts and credentials.
//!
//! Settings start from built-in defaults, are optionally overlaid by a JSON
//! file, then by a handful of environment overrides. Credentials are read
//! once into an immutable [`CredentialSource`] and threaded explicitly into
//! the components that need them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const GENERATIVE_KEY: &str = "API_KEY_GEMINI";
pub const CHAT_KEY: &str = "API_KEY_DEEPSEEK";
pub const CLASSIFIER_KEY: &str = "API_KEY_BERT";
pub const OCR_KEY: &str = "API_KEY_OCR";

const KNOWN_KEYS: [&str; 4] = [GENERATIVE_KEY, CHAT_KEY, CLASSIFIER_KEY, OCR_KEY];

const GENERATIVE_PROMPT: &str = "Analisis sentimen dari berita berikut: '{text}'. \
Apakah sentimennya positif, negatif, atau netral? Berikan alasannya dan highlight kata-kata penyebabnya. \
Lalu, berikan juga analisis keterbacaan (readability) dari teks tersebut.";

const CHAT_PROMPT: &str = "Analisis sentimen dan keterbacaan dari teks berikut: '{text}'. \
Tentukan apakah sentimennya positif, negatif, atau netral. Berikan alasannya dan highlight kata-kata yang relevan. \
Sertakan juga analisis keterbacaan (readability) dari teks tersebut.";

/// Read-only credential store, populated once at startup.
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    values: HashMap<String, String>,
}

impl CredentialSource {
    /// Read every known credential from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::from_pairs(KNOWN_KEYS.iter().filter_map(|key| lookup(key).map(|v| (*key, v))))
    }

    /// Build from explicit pairs. Blank values are treated as absent.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Log a warning for every known credential that is absent.
    pub fn warn_missing(&self) {
        for key in KNOWN_KEYS {
            if !self.contains(key) {
                warn!("{} not set; calls needing it will fail with missing_credential", key);
            }
        }
    }
}

/// Full runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generative: GenerativeSettings,
    pub chat: ChatSettings,
    pub classifier: ClassifierSettings,
    pub ocr: OcrSettings,
    pub fetch: FetchSettings,
    /// Per-call timeout for provider and OCR requests.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeSettings {
    pub endpoint: String,
    /// Prompt template; `{text}` is replaced by the payload.
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub endpoint: String,
    pub language: String,
    pub engine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generative: GenerativeSettings::default(),
            chat: ChatSettings::default(),
            classifier: ClassifierSettings::default(),
            ocr: OcrSettings::default(),
            fetch: FetchSettings::default(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for GenerativeSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                .to_string(),
            prompt: GENERATIVE_PROMPT.to_string(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            prompt: CHAT_PROMPT.to_string(),
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models/nlptown/bert-base-multilingual-uncased-sentiment"
                .to_string(),
        }
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ocr.space/parse/image".to_string(),
            language: "eng".to_string(),
            engine: "2".to_string(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid by an optional JSON file, then by environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Apply `GEMINI_API_URL`-style overrides from the given lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("GEMINI_API_URL") {
            self.generative.endpoint = url;
        }
        if let Some(url) = non_empty("DEEPSEEK_API_URL") {
            self.chat.endpoint = url;
        }
        if let Some(url) = non_empty("BERT_API_URL") {
            self.classifier.endpoint = url;
        }
        if let Some(url) = non_empty("OCR_API_URL") {
            self.ocr.endpoint = url;
        }
        if let Some(raw) = non_empty("HTTP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!("Ignoring invalid HTTP_TIMEOUT_SECS={}", raw),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Substitute the payload into a prompt template.
pub fn render_prompt(template: &str, text: &str) -> String {
    if template.contains("{text}") {
        template.replace("{text}", text)
    } else {
        format!("{}\n\n{}", template, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blank_credentials_are_absent() {
        let creds = CredentialSource::from_pairs([(GENERATIVE_KEY, "abc"), (CHAT_KEY, "   ")]);
        assert_eq!(creds.get(GENERATIVE_KEY), Some("abc"));
        assert!(!creds.contains(CHAT_KEY));
        assert!(creds.get(CLASSIFIER_KEY).is_none());
    }

    #[test]
    fn lookup_only_reads_known_keys() {
        let creds = CredentialSource::from_lookup(|key| match key {
            "API_KEY_BERT" => Some("hf".to_string()),
            _ => None,
        });
        assert_eq!(creds.get(CLASSIFIER_KEY), Some("hf"));
        assert!(!creds.contains(OCR_KEY));
    }

    #[test]
    fn defaults_match_observed_endpoints() {
        let settings = Settings::default();
        assert_eq!(settings.request_timeout_secs, 60);
        assert!(settings.chat.endpoint.ends_with("/chat/completions"));
        assert_eq!(settings.chat.model, "deepseek/deepseek-chat-v3.1:free");
        assert_eq!(settings.ocr.engine, "2");
    }

    #[test]
    fn chat_prompt_differs_from_generative() {
        let settings = Settings::default();
        assert_ne!(settings.chat.prompt, settings.generative.prompt);
        assert!(settings.chat.prompt.starts_with("Analisis sentimen dan keterbacaan"));
        assert!(settings.generative.prompt.starts_with("Analisis sentimen dari berita"));
        for prompt in [&settings.chat.prompt, &settings.generative.prompt] {
            assert!(prompt.contains("'{text}'"));
            assert!(prompt.contains("readability"));
        }
    }

    #[test]
    fn env_overrides_replace_endpoints_and_ignore_bad_timeout() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            "GEMINI_API_URL" => Some("http://localhost:9/gen".to_string()),
            "HTTP_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(settings.generative.endpoint, "http://localhost:9/gen");
        assert_eq!(settings.request_timeout_secs, 60);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chat": {{"model": "other/model"}}, "request_timeout_secs": 5}}"#).unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.chat.model, "other/model");
        assert!(settings.chat.endpoint.starts_with("https://openrouter.ai"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn prompt_placeholder_is_filled() {
        assert_eq!(render_prompt("Rate: '{text}'", "good"), "Rate: 'good'");
        assert_eq!(render_prompt("Rate this", "good"), "Rate this\n\ngood");
    }
}
