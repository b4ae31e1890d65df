// src/devlog.rs
//! Dev-only scoring logs. Drafts are private writing, so these logs never carry
//! raw text: only a short hashed id plus the numbers.

use tracing::info;

use crate::analyze::signals::SignalVector;

pub const ENV_DEV_LOG: &str = "RIPPLE_DEV_LOG";

// Dev logging gate: RIPPLE_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// First 6 bytes of SHA-256 as hex.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for a scoring event.
pub fn dev_log_score(key: &str, signals: &SignalVector, equation: &str, score: f64) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(key);
    info!(
        target: "ripple",
        %id, %equation, %score,
        coherence = signals.coherence,
        evidence = signals.evidence,
        novelty = signals.novelty,
        clarity = signals.clarity,
        sentiment = signals.sentiment,
        "draft scored"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("My Draft");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("My Draft"));
        assert_ne!(a, anon_hash("Other Draft"));
    }

    #[serial_test::serial]
    #[test]
    fn gate_off_without_env() {
        std::env::remove_var(ENV_DEV_LOG);
        assert!(!dev_logging_enabled());
    }
}
