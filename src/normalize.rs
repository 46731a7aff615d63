//! Response normalization: one readable summary per provider response.
//!
//! Each provider gets a structured extraction attempt that walks the JSON
//! with `get` lookups only, so no response shape can make it fail. When the
//! attempt finds nothing usable it reports [`NotExtractable`] and callers
//! degrade to a pretty-printed dump of the raw body.

use crate::provider::ProviderId;
use serde_json::Value;
use thiserror::Error;

const FRAGMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no usable text in {0} response")]
pub struct NotExtractable(pub ProviderId);

/// Structured extraction only. Never panics.
pub fn normalize(id: ProviderId, raw: &Value) -> Result<String, NotExtractable> {
    let extracted = match id {
        ProviderId::Generative => generative_text(raw),
        ProviderId::Chat => chat_text(raw),
        ProviderId::Classifier => classifier_labels(raw),
    };
    extracted.ok_or(NotExtractable(id))
}

/// Structured extraction with the pretty-printed dump as fallback.
pub fn summarize(id: ProviderId, raw: &Value) -> String {
    normalize(id, raw).unwrap_or_else(|_| pretty_dump(raw))
}

pub fn pretty_dump(raw: &Value) -> String {
    serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
}

/// `candidates[].content.parts[].text`, in candidate-then-part order.
fn generative_text(raw: &Value) -> Option<String> {
    let fragments: Vec<&str> = raw
        .get("candidates")?
        .as_array()?
        .iter()
        .filter_map(|candidate| candidate.get("content")?.get("parts")?.as_array())
        .flatten()
        .filter_map(|part| part.get("text")?.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect();

    join_fragments(fragments)
}

/// `choices[].message.content`, else `choices[].text` or `choices[].content`.
fn chat_text(raw: &Value) -> Option<String> {
    let fragments: Vec<String> = raw
        .get("choices")?
        .as_array()?
        .iter()
        .filter_map(choice_text)
        .filter(|text| !text.trim().is_empty())
        .collect();

    join_fragments(fragments)
}

fn choice_text(choice: &Value) -> Option<String> {
    choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(content_text)
        .or_else(|| choice.get("text").and_then(content_text))
        .or_else(|| choice.get("content").and_then(content_text))
}

/// Content is either a string or a list of `{ "text": ... }` parts.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.as_str().or_else(|| part.get("text")?.as_str()))
                .collect();
            join_fragments(texts)
        }
        _ => None,
    }
}

/// `[{label, score}]` (or one level of nesting) as `label (0.870), ...`.
fn classifier_labels(raw: &Value) -> Option<String> {
    let records: Vec<&Value> = raw
        .as_array()?
        .iter()
        .flat_map(|item| match item {
            Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect();

    if records.is_empty() {
        return None;
    }

    let labels = records
        .into_iter()
        .map(|record| {
            let label = record.get("label")?.as_str()?;
            let score = record.get("score")?.as_f64()?;
            Some(format!("{} ({:.3})", label, score))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(labels.join(", "))
}

fn join_fragments<S: AsRef<str>>(fragments: Vec<S>) -> Option<String> {
    if fragments.is_empty() {
        return None;
    }
    Some(
        fragments
            .iter()
            .map(|fragment| fragment.as_ref())
            .collect::<Vec<&str>>()
            .join(FRAGMENT_SEPARATOR),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifier_scores_use_three_decimals() {
        let raw = json!([{ "label": "5 stars", "score": 0.87 }]);
        assert_eq!(normalize(ProviderId::Classifier, &raw).unwrap(), "5 stars (0.870)");
    }

    #[test]
    fn classifier_accepts_nested_list() {
        let raw = json!([[
            { "label": "5 stars", "score": 0.61234 },
            { "label": "1 star", "score": 0.01 }
        ]]);
        assert_eq!(
            summarize(ProviderId::Classifier, &raw),
            "5 stars (0.612), 1 star (0.010)"
        );
    }

    #[test]
    fn generative_single_part() {
        let raw = json!({ "candidates": [{ "content": { "parts": [{ "text": "Positive" }] } }] });
        assert_eq!(normalize(ProviderId::Generative, &raw).unwrap(), "Positive");
    }

    #[test]
    fn generative_joins_candidates_then_parts() {
        let raw = json!({ "candidates": [
            { "content": { "parts": [{ "text": "a" }, { "inline": true }, { "text": "b" }] } },
            { "finishReason": "SAFETY" },
            { "content": { "parts": [{ "text": "c" }] } }
        ] });
        assert_eq!(normalize(ProviderId::Generative, &raw).unwrap(), "a\n\nb\n\nc");
    }

    #[test]
    fn chat_message_content() {
        let raw = json!({ "choices": [{ "message": { "content": "Negative, due to word X" } }] });
        assert_eq!(
            normalize(ProviderId::Chat, &raw).unwrap(),
            "Negative, due to word X"
        );
    }

    #[test]
    fn chat_falls_back_to_text_and_content_fields() {
        let raw = json!({ "choices": [
            { "text": "first" },
            { "content": "second" },
            { "message": { "content": [{ "type": "text", "text": "third" }] } },
            { "message": { "role": "assistant" } }
        ] });
        assert_eq!(
            normalize(ProviderId::Chat, &raw).unwrap(),
            "first\n\nsecond\n\nthird"
        );
    }

    #[test]
    fn unexpected_shapes_fall_back_to_dump() {
        let cases = [
            (ProviderId::Generative, json!({ "error": { "code": 429 } })),
            (ProviderId::Chat, json!({ "choices": "nope" })),
            (ProviderId::Classifier, json!([])),
            (ProviderId::Classifier, json!([{ "label": "x" }])),
            (ProviderId::Classifier, json!({ "error": "Model is loading" })),
            (ProviderId::Generative, json!(null)),
        ];
        for (id, raw) in cases {
            assert_eq!(normalize(id, &raw), Err(NotExtractable(id)));
            assert_eq!(summarize(id, &raw), pretty_dump(&raw));
        }
    }

    #[test]
    fn dump_fallback_is_idempotent() {
        let raw = json!({ "unexpected": [1, 2, { "deep": "value" }] });
        for id in ProviderId::ALL {
            let dump = summarize(id, &raw);
            let reparsed: Value = serde_json::from_str(&dump).unwrap();
            assert_eq!(summarize(id, &reparsed), dump);
        }
    }

    #[test]
    fn blank_fragments_do_not_count() {
        let raw = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert!(normalize(ProviderId::Generative, &raw).is_err());
    }
}
