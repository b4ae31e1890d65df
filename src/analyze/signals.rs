// src/analyze/signals.rs
//! Signal extraction: five normalized heuristics in [0,1] from a draft's text.
//!
//! - `coherence` : word count of the generated content (longer → more developed)
//! - `evidence`  : citation-like markers in the content (urls, md links, doi:, "source", ...)
//! - `novelty`   : distinct alphabetic terms (len >= 4) in the content
//! - `clarity`   : bullet-like lines in the outline
//! - `sentiment` : constant baseline, or the keyword lexicon (see `sentiment.rs`)
//!
//! Every signal is a saturating proxy: `min(1, measure / threshold)`.
//! Extraction is pure: same draft + same config → same vector.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::sentiment;
use crate::draft::DraftRecord;

static UNIQUE_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z]{4,}\b").expect("unique term regex"));
static ENUMERATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("enumerated regex"));

/// Substrings counted (case-insensitive, non-overlapping) as evidence.
pub const CITATION_HINTS: [&str; 9] = [
    "http://",
    "https://",
    "[",
    "](",
    "doi:",
    "arxiv.org",
    "source",
    "citation",
    "references",
];

const BULLET_PREFIXES: [char; 3] = ['-', '*', '•'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalName {
    Coherence,
    Evidence,
    Novelty,
    Clarity,
    Sentiment,
}

impl SignalName {
    pub const ALL: [SignalName; 5] = [
        SignalName::Coherence,
        SignalName::Evidence,
        SignalName::Novelty,
        SignalName::Clarity,
        SignalName::Sentiment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalName::Coherence => "coherence",
            SignalName::Evidence => "evidence",
            SignalName::Novelty => "novelty",
            SignalName::Clarity => "clarity",
            SignalName::Sentiment => "sentiment",
        }
    }

    /// Exact (lowercase) name lookup; weight keys are matched this way.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == key)
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five signals. A struct, so the key set is always complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalVector {
    pub coherence: f64,
    pub evidence: f64,
    pub novelty: f64,
    pub clarity: f64,
    pub sentiment: f64,
}

impl SignalVector {
    /// Safe constructor with clamping.
    pub fn new(coherence: f64, evidence: f64, novelty: f64, clarity: f64, sentiment: f64) -> Self {
        Self {
            coherence: clamp01(coherence),
            evidence: clamp01(evidence),
            novelty: clamp01(novelty),
            clarity: clamp01(clarity),
            sentiment: clamp01(sentiment),
        }
    }

    pub fn get(&self, name: SignalName) -> f64 {
        match name {
            SignalName::Coherence => self.coherence,
            SignalName::Evidence => self.evidence,
            SignalName::Novelty => self.novelty,
            SignalName::Clarity => self.clarity,
            SignalName::Sentiment => self.sentiment,
        }
    }

    /// Value by weight key; `None` for keys outside the five names.
    pub fn value_of(&self, key: &str) -> Option<f64> {
        SignalName::from_key(key).map(|n| self.get(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalName, f64)> + '_ {
        SignalName::ALL.into_iter().map(move |n| (n, self.get(n)))
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum::<f64>() / SignalName::ALL.len() as f64
    }

    /// Copy with every value rounded to `decimals` places (storage form).
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals.min(12) as i32);
        let r = |x: f64| (x * factor).round() / factor;
        Self {
            coherence: r(self.coherence),
            evidence: r(self.evidence),
            novelty: r(self.novelty),
            clarity: r(self.clarity),
            sentiment: r(self.sentiment),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentMode {
    /// Fixed baseline (0.7 unless configured).
    #[default]
    Constant,
    /// Positive/negative keyword count over the draft's claims.
    Lexicon,
}

impl FromStr for SentimentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(SentimentMode::Constant),
            "lexicon" => Ok(SentimentMode::Lexicon),
            other => anyhow::bail!("unknown sentiment mode: {other}"),
        }
    }
}

fn default_coherence_words() -> f64 {
    800.0
}
fn default_evidence_hits() -> f64 {
    6.0
}
fn default_clarity_bullets() -> f64 {
    8.0
}
fn default_novelty_terms() -> f64 {
    800.0
}
fn default_sentiment_baseline() -> f64 {
    0.7
}

/// Calibration constants (`[signals]` in `config/studio.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_coherence_words")]
    pub coherence_words: f64,
    #[serde(default = "default_evidence_hits")]
    pub evidence_hits: f64,
    #[serde(default = "default_clarity_bullets")]
    pub clarity_bullets: f64,
    #[serde(default = "default_novelty_terms")]
    pub novelty_terms: f64,
    #[serde(default)]
    pub sentiment: SentimentMode,
    #[serde(default = "default_sentiment_baseline")]
    pub sentiment_baseline: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            coherence_words: default_coherence_words(),
            evidence_hits: default_evidence_hits(),
            clarity_bullets: default_clarity_bullets(),
            novelty_terms: default_novelty_terms(),
            sentiment: SentimentMode::default(),
            sentiment_baseline: default_sentiment_baseline(),
        }
    }
}

/// Text buckets the heuristics look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftText {
    /// lede, body, counterpoints, conclusion joined by blank lines, trimmed.
    pub content: String,
    /// outline entries joined by newlines.
    pub outline: String,
    pub thesis: String,
}

impl DraftText {
    pub fn assemble(draft: &DraftRecord) -> Self {
        let content = draft
            .generated_sections
            .in_order()
            .iter()
            .map(|s| s.joined())
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string();
        Self {
            content,
            outline: draft.outline.join("\n"),
            thesis: draft.thesis.clone(),
        }
    }
}

/// Extract the five signals from a draft.
pub fn extract_signals(draft: &DraftRecord, cfg: &SignalConfig) -> SignalVector {
    let text = DraftText::assemble(draft);

    let coherence = saturate(word_count(&text.content) as f64, cfg.coherence_words);
    let evidence = saturate(count_citations(&text.content) as f64, cfg.evidence_hits);
    let clarity = saturate(count_bullets(&text.outline) as f64, cfg.clarity_bullets);
    let novelty = saturate(count_unique_terms(&text.content) as f64, cfg.novelty_terms);
    let sentiment = match cfg.sentiment {
        SentimentMode::Constant => cfg.sentiment_baseline,
        SentimentMode::Lexicon => sentiment::lexicon_sentiment(draft),
    };

    SignalVector::new(coherence, evidence, novelty, clarity, sentiment)
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Case-insensitive, non-overlapping hint occurrences summed over all hints.
pub fn count_citations(s: &str) -> usize {
    let lower = s.to_lowercase();
    CITATION_HINTS
        .iter()
        .map(|hint| lower.matches(hint).count())
        .sum()
}

/// Lines starting with `-`, `*`, `•` or `<digits>.` after trimming.
pub fn count_bullets(s: &str) -> usize {
    s.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BULLET_PREFIXES) || ENUMERATED.is_match(line))
        .count()
}

pub fn count_unique_terms(s: &str) -> usize {
    UNIQUE_TERM
        .find_iter(s)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

// Non-positive or NaN thresholds mean "no signal".
fn saturate(measure: f64, threshold: f64) -> f64 {
    if threshold.is_nan() || threshold <= 0.0 {
        return 0.0;
    }
    clamp01(measure / threshold)
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
