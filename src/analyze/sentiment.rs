// src/analyze/sentiment.rs
//! Keyword-lexicon sentiment (the `lexicon` sentiment mode).
//!
//! Sample = the draft's scoring claims (see `DraftRecord::scoring_claims`), joined
//! by spaces and cut to `SAMPLE_CHAR_LIMIT` chars. Each lexicon word counts once
//! if it occurs anywhere in the lower-cased sample, so `improved` hits `improve`
//! and `unclear` hits both `unclear` and `clear`.
//!
//! score = (pos - neg) / (pos + neg) * 0.5 + 0.5, or `NO_HITS` without any hit.

use crate::draft::DraftRecord;

pub const POSITIVE: [&str; 6] = ["excellent", "good", "clear", "strong", "improve", "win"];
pub const NEGATIVE: [&str; 6] = ["bad", "poor", "unclear", "weak", "worse", "lose"];

pub const SAMPLE_CHAR_LIMIT: usize = 8000;
/// Returned when the sample has no lexicon words at all.
pub const NO_HITS: f64 = 0.6;

/// Positive/negative lexicon words present in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexiconHits {
    pub positive: usize,
    pub negative: usize,
}

impl LexiconHits {
    pub fn count(text: &str) -> Self {
        let lower = text.to_lowercase();
        let present = |words: &[&str]| words.iter().filter(|w| lower.contains(**w)).count();
        Self {
            positive: present(&POSITIVE),
            negative: present(&NEGATIVE),
        }
    }

    pub fn score(&self) -> f64 {
        let total = self.positive + self.negative;
        if total == 0 {
            return NO_HITS;
        }
        let balance = (self.positive as f64 - self.negative as f64) / total as f64;
        (balance * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

/// Text the lexicon looks at.
pub fn sample_text(draft: &DraftRecord) -> String {
    draft
        .scoring_claims()
        .join(" ")
        .chars()
        .take(SAMPLE_CHAR_LIMIT)
        .collect()
}

pub fn lexicon_sentiment(draft: &DraftRecord) -> f64 {
    LexiconHits::count(&sample_text(draft)).score()
}
