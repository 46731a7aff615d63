//! Local text statistics: word and sentence counts and Flesch reading ease.
//!
//! Pure functions, no network. Computed alongside every provider run.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub reading_ease: f64,
    pub reading_level: ReadingLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadingLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::VeryEasy,
            s if s >= 80.0 => Self::Easy,
            s if s >= 70.0 => Self::FairlyEasy,
            s if s >= 60.0 => Self::Standard,
            s if s >= 50.0 => Self::FairlyDifficult,
            s if s >= 30.0 => Self::Difficult,
            _ => Self::VeryDifficult,
        }
    }
}

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[\p{L}'-]*\p{L}[\p{L}'-]*").expect("word pattern is valid"))
}

pub fn words(text: &str) -> Vec<&str> {
    word_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

/// Non-empty segments between runs of `.`, `!` and `?`.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

/// Vowel groups, at least one per word.
pub fn syllables(word: &str) -> usize {
    let mut count = 0;
    let mut previous_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }
    count.max(1)
}

/// Flesch reading ease, rounded to two decimals.
pub fn reading_ease(text: &str) -> f64 {
    let words = words(text);
    let word_count = words.len().max(1) as f64;
    let sentences = sentence_count(text).max(1) as f64;
    let syllable_count: usize = words.iter().map(|w| syllables(w)).sum();

    let score =
        206.835 - 1.015 * (word_count / sentences) - 84.6 * (syllable_count as f64 / word_count);
    (score * 100.0).round() / 100.0
}

pub fn analyze(text: &str) -> TextStats {
    let reading_ease = reading_ease(text);
    TextStats {
        word_count: words(text).len(),
        sentence_count: sentence_count(text),
        reading_ease,
        reading_level: ReadingLevel::from_score(reading_ease),
    }
}
