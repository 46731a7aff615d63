//! Per-provider outcomes and the ordered comparison report.

use crate::error::ErrorKind;
use crate::provider::ProviderId;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A typed provider failure, rendered as `kind: message`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of calling one provider.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success { raw_body: Value, summary: String },
    Failure(Failure),
}

impl AnalysisOutcome {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The display string used in reports: the summary, or
    /// `ERROR: <kind>: <message>`.
    pub fn display(&self) -> String {
        match self {
            Self::Success { summary, .. } => summary.clone(),
            Self::Failure(failure) => format!("ERROR: {}", failure),
        }
    }
}

/// Provider → display string, in provider iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    entries: Vec<(ProviderId, String)>,
}

impl ComparisonReport {
    pub(crate) fn from_entries(entries: Vec<(ProviderId, String)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: ProviderId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == id)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.entries.iter().map(|(p, _)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderId, &str)> {
        self.entries.iter().map(|(p, text)| (*p, text.as_str()))
    }
}

impl Serialize for ComparisonReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, text) in &self.entries {
            map.serialize_entry(id.as_str(), text)?;
        }
        map.end()
    }
}
