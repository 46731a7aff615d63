//! Sentiment labels derived from provider summaries, with a keyword lexicon
//! for when no provider answer is available.

use crate::provider::ProviderId;
use serde::Serialize;

const POSITIVE_SCORE: f64 = 0.75;
const NEGATIVE_SCORE: f64 = 0.25;
const NEUTRAL_SCORE: f64 = 0.5;

const LEXICON_POSITIVE_SCORE: f64 = 0.7;
const LEXICON_NEGATIVE_SCORE: f64 = 0.3;

/// Stems matched in free-text answers. Cover English and Indonesian
/// ("positive"/"positif", "negative"/"negatif", "neutral"/"netral").
const POSITIVE_MARKER: &str = "positi";
const NEGATIVE_MARKER: &str = "negati";

const POSITIVE_WORDS: [&str; 16] = [
    "baik", "bagus", "hebat", "senang", "sukses", "positif", "maju", "unggul", "meningkat",
    "berkembang", "good", "great", "success", "improve", "growth", "gain",
];
const NEGATIVE_WORDS: [&str; 15] = [
    "buruk", "jelek", "gagal", "sedih", "negatif", "mundur", "korupsi", "menurun", "rugi", "bad",
    "fail", "loss", "decline", "corruption", "crisis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    Provider,
    Lexicon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentVerdict {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    #[serde(rename = "sentiment_score")]
    pub score: f64,
    #[serde(rename = "sentiment_source")]
    pub source: VerdictSource,
}

impl SentimentVerdict {
    fn from_label(label: SentimentLabel, source: VerdictSource) -> Self {
        let score = match (label, source) {
            (SentimentLabel::Positive, VerdictSource::Provider) => POSITIVE_SCORE,
            (SentimentLabel::Negative, VerdictSource::Provider) => NEGATIVE_SCORE,
            (SentimentLabel::Positive, VerdictSource::Lexicon) => LEXICON_POSITIVE_SCORE,
            (SentimentLabel::Negative, VerdictSource::Lexicon) => LEXICON_NEGATIVE_SCORE,
            (SentimentLabel::Neutral, _) => NEUTRAL_SCORE,
        };
        Self {
            label,
            score,
            source,
        }
    }
}

/// Derive a label from a provider's normalized summary.
///
/// Classifier summaries (`"5 stars (0.870), ..."`) are read by their highest
/// scored label. Free-text answers take whichever of positive or negative is
/// mentioned first; no mention means neutral.
pub fn from_summary(id: ProviderId, summary: &str) -> SentimentVerdict {
    let label = match id {
        ProviderId::Classifier => classifier_label(summary).unwrap_or_else(|| first_mention(summary)),
        ProviderId::Generative | ProviderId::Chat => first_mention(summary),
    };
    SentimentVerdict::from_label(label, VerdictSource::Provider)
}

/// Keyword count over the analysed text itself.
pub fn from_lexicon(text: &str) -> SentimentVerdict {
    let lower = text.to_lowercase();
    let count = |words: &[&str]| -> usize { words.iter().map(|w| lower.matches(w).count()).sum() };
    let positive = count(&POSITIVE_WORDS[..]);
    let negative = count(&NEGATIVE_WORDS[..]);

    let label = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => SentimentLabel::Positive,
        std::cmp::Ordering::Less => SentimentLabel::Negative,
        std::cmp::Ordering::Equal => SentimentLabel::Neutral,
    };
    SentimentVerdict::from_label(label, VerdictSource::Lexicon)
}

fn first_mention(summary: &str) -> SentimentLabel {
    let lower = summary.to_lowercase();
    match (lower.find(POSITIVE_MARKER), lower.find(NEGATIVE_MARKER)) {
        (Some(p), Some(n)) if n < p => SentimentLabel::Negative,
        (Some(_), _) => SentimentLabel::Positive,
        (None, Some(_)) => SentimentLabel::Negative,
        (None, None) => SentimentLabel::Neutral,
    }
}

/// Highest-scored `label (score)` entry. Star ratings map 0-2 negative,
/// 3 neutral, 4-5 positive; other labels fall back to keyword matching.
fn classifier_label(summary: &str) -> Option<SentimentLabel> {
    let (label, _) = summary
        .split(", ")
        .filter_map(|entry| {
            let (label, score) = entry.rsplit_once(" (")?;
            let score: f64 = score.strip_suffix(')')?.parse().ok()?;
            Some((label, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let stars = label
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<u8>().ok());
    Some(match stars {
        Some(0..=2) => SentimentLabel::Negative,
        Some(3) => SentimentLabel::Neutral,
        Some(_) => SentimentLabel::Positive,
        None => first_mention(label),
    })
}
