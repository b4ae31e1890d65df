//! Score combiner: weighted mean of the signals with |w| normalization.
//!
//! ripple_score = clamp( Σ w_k * s_k / Σ |w_k| , 0, 1 )   over keys k of the weights
//!
//! - keys outside the five signal names contribute 0 to the numerator but still
//!   count in the denominator
//! - negative weights invert a signal's contribution
//! - empty / all-zero weights → exactly 0.0

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Number, Value};

use super::equations::{EquationRegistry, WeightVector};
use super::signals::{SignalName, SignalVector};

/// `meta.equation` when no registry equation supplied the weights.
pub const NO_EQUATION: &str = "none";

/// Combine signals with weights.
pub fn apply_equation(signals: &SignalVector, weights: &WeightVector) -> f64 {
    combine(|k| signals.value_of(k), weights)
}

/// Combiner over an arbitrary signal lookup (`None` counts as 0.0).
pub fn combine(lookup: impl Fn(&str) -> Option<f64>, weights: &WeightVector) -> f64 {
    let (num, den) = weights
        .iter()
        .filter(|(_, w)| w.is_finite())
        .fold((0.0_f64, 0.0_f64), |(num, den), (k, &w)| {
            let v = lookup(k).filter(|v| v.is_finite()).unwrap_or(0.0);
            (num + w * v, den + w.abs())
        });

    if den == 0.0 {
        return 0.0;
    }
    (num / den).clamp(0.0, 1.0)
}

/// 1.0 for every signal name.
pub fn equal_weights() -> WeightVector {
    SignalName::ALL
        .iter()
        .map(|n| (n.as_str().to_string(), 1.0))
        .collect()
}

/// Weights chosen for one scoring call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeights {
    /// Registry id, or `NO_EQUATION` for synthesized equal weights.
    pub equation: String,
    pub weights: WeightVector,
}

/// Registry weights for `selection`, or equal weights when the selection is
/// absent, unknown, or has no weights.
pub fn resolve_weights(registry: &EquationRegistry, selection: Option<&str>) -> ResolvedWeights {
    match selection.and_then(|s| registry.get(s)) {
        Some(eq) if !eq.weights.is_empty() => ResolvedWeights {
            equation: eq.id.clone(),
            weights: eq.weights.clone(),
        },
        _ => ResolvedWeights {
            equation: NO_EQUATION.to_string(),
            weights: equal_weights(),
        },
    }
}

/// One scoring event, in the form stored on `draft.meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Rounded for storage.
    pub signals: SignalVector,
    pub ripple_score: f64,
    pub equation: String,
    pub weights: WeightVector,
}

impl ScoreReport {
    /// Score with unrounded signals, store rounded ones.
    pub fn compute(signals: &SignalVector, resolved: ResolvedWeights, round_decimals: u32) -> Self {
        let ripple_score = apply_equation(signals, &resolved.weights);
        Self {
            signals: signals.rounded(round_decimals),
            ripple_score,
            equation: resolved.equation,
            weights: resolved.weights,
        }
    }

    /// Overwrite `signals`, `ripple_score`, `equation`, `weights`; keep other keys.
    pub fn write_meta(&self, meta: &mut Mapping) {
        let signals: Mapping = self
            .signals
            .iter()
            .map(|(n, v)| (Value::from(n.as_str()), float(v)))
            .collect();
        let weights: Mapping = self
            .weights
            .iter()
            .map(|(k, &w)| (Value::from(k.as_str()), float(w)))
            .collect();

        meta.insert("signals".into(), Value::Mapping(signals));
        meta.insert("ripple_score".into(), float(self.ripple_score));
        meta.insert("equation".into(), Value::from(self.equation.as_str()));
        meta.insert("weights".into(), Value::Mapping(weights));
    }

    /// Score as a whole percentage for display.
    pub fn percent(&self) -> u32 {
        (self.ripple_score * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

fn float(x: f64) -> Value {
    Value::Number(Number::from(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn w(pairs: &[(&str, f64)]) -> WeightVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn opposing_weights_cancel() {
        let s = SignalVector::new(0.8, 0.8, 0.0, 0.0, 0.0);
        let score = apply_equation(&s, &w(&[("coherence", 1.0), ("evidence", -1.0)]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn empty_weights_score_zero() {
        let empty: BTreeMap<String, f64> = BTreeMap::new();
        assert_eq!(combine(|_| None, &empty), 0.0);
        assert_eq!(apply_equation(&SignalVector::new(1.0, 1.0, 1.0, 1.0, 1.0), &empty), 0.0);
        assert_eq!(
            apply_equation(&SignalVector::default(), &w(&[("coherence", 0.0)])),
            0.0
        );
    }

    #[test]
    fn equal_weights_give_the_mean() {
        let s = SignalVector::new(0.1, 0.2, 0.3, 0.4, 0.5);
        assert!((apply_equation(&s, &equal_weights()) - s.mean()).abs() < 1e-12);
    }

    #[test]
    fn unknown_keys_dilute() {
        let s = SignalVector::new(1.0, 0.0, 0.0, 0.0, 0.0);
        let score = apply_equation(&s, &w(&[("coherence", 1.0), ("charisma", 1.0)]));
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn result_is_clamped() {
        let s = SignalVector::new(0.0, 0.9, 0.0, 0.0, 0.0);
        assert_eq!(apply_equation(&s, &w(&[("evidence", -2.0)])), 0.0);
        assert_eq!(
            apply_equation(&s, &w(&[("evidence", 1.0), ("bad", f64::NAN)])),
            0.9
        );
    }

    #[test]
    fn resolve_falls_back_to_equal_weights() {
        let reg = EquationRegistry::from_yaml_str(
            "equations:\n  calm: {weights: {sentiment: 2}}\n  hollow: {desc: no weights}\n",
        )
        .unwrap();

        let r = resolve_weights(&reg, Some("calm"));
        assert_eq!(r.equation, "calm");
        assert_eq!(r.weights, w(&[("sentiment", 2.0)]));

        for sel in [None, Some("missing"), Some("hollow")] {
            let r = resolve_weights(&reg, sel);
            assert_eq!(r.equation, NO_EQUATION);
            assert_eq!(r.weights, equal_weights());
        }
    }

    #[test]
    fn write_meta_overwrites_four_keys_only() {
        let mut meta = Mapping::new();
        meta.insert("reviewer".into(), "ana".into());
        meta.insert("ripple_score".into(), "stale".into());

        let report = ScoreReport::compute(
            &SignalVector::new(1.0 / 3.0, 0.0, 0.0, 0.0, 0.7),
            ResolvedWeights {
                equation: NO_EQUATION.into(),
                weights: equal_weights(),
            },
            4,
        );
        report.write_meta(&mut meta);

        assert_eq!(meta.get("reviewer").and_then(Value::as_str), Some("ana"));
        assert_eq!(meta.get("equation").and_then(Value::as_str), Some("none"));
        let stored = meta
            .get("signals")
            .and_then(|s| s.get("coherence"))
            .and_then(Value::as_f64);
        assert_eq!(stored, Some(0.3333));
        let score = meta.get("ripple_score").and_then(Value::as_f64).unwrap();
        assert!((score - (1.0 / 3.0 + 0.7) / 5.0).abs() < 1e-12);
        assert_eq!(report.percent(), 21);
    }
}
