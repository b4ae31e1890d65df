// src/lib.rs
// Public library surface for the server binary, the CLI and integration tests.

pub mod api;
pub mod config;
pub mod devlog;
pub mod draft;
pub mod errors;
pub mod metrics;

// Scoring core: signals, sentiment lexicon, equation registry, combiner
pub mod analyze;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    extract_signals, preview_score, score_draft, EquationRegistry, ScoreReport, SignalVector,
};
pub use crate::api::{router, AppState};
pub use crate::config::StudioConfig;
pub use crate::draft::{DraftRecord, DraftStore};

use axum::Router;
use tracing::info;

/// Build the full in-process app: API routes + `/metrics`.
///
/// Reads `config/studio.toml` (or `$RIPPLE_CONFIG_PATH`) relative to the
/// current working directory.
pub async fn app() -> anyhow::Result<Router> {
    // Recorder first, so the registry gauge set during warm-up is kept.
    let metrics = crate::metrics::Metrics::init();

    let state = AppState::from_env()?;
    info!(
        equations = %state.config.paths.equations.display(),
        drafts = %state.config.paths.drafts.display(),
        sentiment = ?state.config.signals.sentiment,
        "studio config loaded"
    );
    // Warm the registry so a broken equations file shows up in the boot log.
    if let Some(w) = state.equations.current().warning {
        tracing::warn!("{w}");
    }

    Ok(router(state).merge(metrics.router()))
}
