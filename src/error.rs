//! Error kinds shared by the input resolver, provider client and driver.

use serde::Serialize;
use thiserror::Error;

/// Classification of every failure the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    Transport,
    RemoteRejected,
    MalformedResponse,
    NotExtractable,
    UnsupportedInputFormat,
    InputNotFound,
    InputUnreadable,
    ProviderNotRegistered,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Transport => "transport",
            Self::RemoteRejected => "remote_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::NotExtractable => "not_extractable",
            Self::UnsupportedInputFormat => "unsupported_input_format",
            Self::InputNotFound => "input_not_found",
            Self::InputUnreadable => "input_unreadable",
            Self::ProviderNotRegistered => "provider_not_registered",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while turning a path or URL into plain text.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input not found: {0}")]
    NotFound(String),

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("credential for {0} not configured")]
    MissingCredential(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{0}")]
    RemoteRejected(String),

    #[error("unreadable response: {0}")]
    Malformed(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("no text detected in {0}")]
    NoTextFound(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("no text to analyse in {0}")]
    EmptyText(String),
}

impl InputError {
    /// Maps the failure onto the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::InputNotFound,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedInputFormat,
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::InputNotFound
            }
            Self::Io { .. } => ErrorKind::InputUnreadable,
            Self::Transport(_) => ErrorKind::Transport,
            Self::RemoteRejected(_) | Self::Ocr(_) => ErrorKind::RemoteRejected,
            Self::Malformed(_) | Self::Pdf(_) => ErrorKind::MalformedResponse,
            Self::NoTextFound(_) | Self::EmptyText(_) => ErrorKind::NotExtractable,
        }
    }
}

/// Cap an error body so oversized responses stay readable in logs and output.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
        assert_eq!(truncate_chars(text, 10), text);
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn io_errors_split_into_not_found_and_unreadable() {
        let err = InputError::Io {
            path: "x.txt".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.kind(), ErrorKind::InputNotFound);

        let denied = InputError::Io {
            path: "x.txt".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(denied.kind(), ErrorKind::InputUnreadable);
        assert_eq!(
            InputError::Transport("reset".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            InputError::UnsupportedFormat("a.docx".into()).kind(),
            ErrorKind::UnsupportedInputFormat
        );
    }

    #[test]
    fn kinds_serialize_in_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RemoteRejected).unwrap();
        assert_eq!(json, "\"remote_rejected\"");
        assert_eq!(ErrorKind::MissingCredential.to_string(), "missing_credential");
    }
}
