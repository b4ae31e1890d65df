// src/analyze/mod.rs
//! Scoring pipeline entry: draft → signals → weights → ripple score → `draft.meta`.
//!
//! The selected draft and equation are passed in explicitly; nothing here reads
//! ambient state. Equation precedence:
//! 1) the explicit `selection`
//! 2) `draft.intention_equation`
//! 3) `draft.meta.equation` from a previous run
//! otherwise (or when the registry has no usable weights) equal weights.

pub mod equations;
pub mod scoring;
pub mod sentiment;
pub mod signals;

use tracing::debug;

use crate::config::StudioConfig;
use crate::devlog::dev_log_score;
use crate::draft::DraftRecord;

// Re-export convenient types.
pub use crate::analyze::equations::{
    load_equations, Equation, EquationRegistry, EquationSnapshot, HotReloadEquations,
    RegistryLoad, WeightVector,
};
pub use crate::analyze::scoring::{
    apply_equation, equal_weights, resolve_weights, ResolvedWeights, ScoreReport, NO_EQUATION,
};
pub use crate::analyze::signals::{
    extract_signals, SentimentMode, SignalConfig, SignalName, SignalVector,
};

/// Pick the equation key for a draft (see module docs for the order).
pub fn equation_selection<'a>(draft: &'a DraftRecord, selection: Option<&'a str>) -> Option<&'a str> {
    selection
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(draft.intention_equation.as_deref())
        .or_else(|| draft.meta_equation())
}

/// Compute the report without touching the draft.
pub fn preview_score(
    draft: &DraftRecord,
    selection: Option<&str>,
    registry: &EquationRegistry,
    cfg: &StudioConfig,
) -> ScoreReport {
    let signals = extract_signals(draft, &cfg.signals);
    let resolved = resolve_weights(registry, equation_selection(draft, selection));
    ScoreReport::compute(&signals, resolved, cfg.storage.round_decimals)
}

/// Score a draft and write the result onto `draft.meta`.
pub fn score_draft(
    draft: &mut DraftRecord,
    selection: Option<&str>,
    registry: &EquationRegistry,
    cfg: &StudioConfig,
) -> ScoreReport {
    let report = preview_score(draft, selection, registry, cfg);
    report.write_meta(&mut draft.meta);

    metrics::counter!("ripple_scores_computed_total", "equation" => report.equation.clone())
        .increment(1);
    metrics::histogram!("ripple_score_value").record(report.ripple_score);

    debug!(
        equation = %report.equation,
        score = report.ripple_score,
        "draft scored"
    );
    dev_log_score(&draft.slug(), &report.signals, &report.equation, report.ripple_score);

    report
}
