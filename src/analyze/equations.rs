// src/analyze/equations.rs
//! Equation registry: named weight vectors from `config/equations.yaml`,
//! hot-reloaded on mtime change.
//!
//! Accepted YAML shapes (all normalize to the same canonical records):
//! ```yaml
//! # 1) wrapped mapping
//! equations:
//!   peace-vector: { weights: { coherence: 1.0, evidence: 2.0 } }
//! # 2) wrapped sequence
//! equations:
//!   - { id: peace-vector, weights: { coherence: 1.0, evidence: 2.0 } }
//! # 3) bare mapping
//! peace-vector: { weights: { coherence: 1.0, evidence: 2.0 } }
//! # 4) bare sequence, either record form
//! - { name: peace-vector, weights: { coherence: 1.0, evidence: 2.0 } }
//! - peace-vector: { weights: { coherence: 1.0, evidence: 2.0 } }
//! ```
//! Records that are not mappings are dropped; loading never fails.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};
use tracing::{info, warn};

use crate::errors::{friendly_yaml_missing, friendly_yaml_parse};

pub const DEFAULT_EQUATIONS_PATH: &str = "config/equations.yaml";

/// Signal name → weight. Sign and magnitude both matter.
pub type WeightVector = BTreeMap<String, f64>;

/// Canonical equation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub weights: WeightVector,
}

/// Ordered set of equations, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EquationRegistry {
    equations: Vec<Equation>,
}

impl EquationRegistry {
    /// Normalize any parsed YAML value. Unrecognized shapes give an empty registry.
    pub fn from_value(value: Value) -> Self {
        EquationSource::classify(value).normalize()
    }

    /// Parse + normalize. Only YAML syntax errors fail.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(s)?;
        Ok(Self::from_value(value))
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Equation> {
        self.equations.iter()
    }

    /// Exact id first, then case-insensitive id or display name.
    pub fn get(&self, key: &str) -> Option<&Equation> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.equations.iter().find(|e| e.id == key).or_else(|| {
            self.equations
                .iter()
                .find(|e| e.id.eq_ignore_ascii_case(key) || e.name.eq_ignore_ascii_case(key))
        })
    }

    // Later records with the same id replace earlier ones in place.
    fn upsert(&mut self, eq: Equation) {
        match self.equations.iter_mut().find(|e| e.id == eq.id) {
            Some(slot) => *slot = eq,
            None => self.equations.push(eq),
        }
    }
}

/// The on-disk shapes, resolved once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum EquationSource {
    WrappedMapping(Mapping),
    WrappedSequence(Vec<Value>),
    BareMapping(Mapping),
    BareSequence(Vec<Value>),
    Unrecognized,
}

impl EquationSource {
    pub fn classify(value: Value) -> Self {
        match untag(value) {
            Value::Mapping(mut map) => match map.get("equations").cloned().map(untag) {
                Some(Value::Mapping(inner)) => EquationSource::WrappedMapping(inner),
                Some(Value::Sequence(items)) => EquationSource::WrappedSequence(items),
                _ => {
                    // `equations: ~` and friends carry nothing; the rest is bare.
                    map.remove("equations");
                    EquationSource::BareMapping(map)
                }
            },
            Value::Sequence(items) => EquationSource::BareSequence(items),
            _ => EquationSource::Unrecognized,
        }
    }

    pub fn normalize(self) -> EquationRegistry {
        let mut reg = EquationRegistry::default();
        match self {
            EquationSource::WrappedMapping(map) | EquationSource::BareMapping(map) => {
                push_keyed(&mut reg, map);
            }
            EquationSource::WrappedSequence(items) | EquationSource::BareSequence(items) => {
                for item in items {
                    let Value::Mapping(record) = untag(item) else {
                        continue;
                    };
                    if record.contains_key("id") || record.contains_key("name") {
                        if let Some(eq) = from_sequence_record(&record) {
                            reg.upsert(eq);
                        }
                    } else {
                        // [{EqName: {weights: {...}}}]
                        push_keyed(&mut reg, record);
                    }
                }
            }
            EquationSource::Unrecognized => {}
        }
        reg
    }
}

/// `id` derived from a display name: lowercase, whitespace runs → `-`.
pub fn equation_id_from_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn push_keyed(reg: &mut EquationRegistry, map: Mapping) {
    for (key, record) in map {
        let Some(key) = scalar_str(&key) else {
            continue;
        };
        let Value::Mapping(record) = untag(record) else {
            continue;
        };
        let id = text_field(&record, "id").unwrap_or_else(|| key.clone());
        let name = text_field(&record, "name").unwrap_or_else(|| key.clone());
        if let Some(eq) = build(id, name, &record) {
            reg.upsert(eq);
        }
    }
}

fn from_sequence_record(record: &Mapping) -> Option<Equation> {
    let name = text_field(record, "name");
    let id = text_field(record, "id").or_else(|| name.as_deref().map(equation_id_from_name))?;
    let name = name.unwrap_or_else(|| id.clone());
    build(id, name, record)
}

fn build(id: String, name: String, record: &Mapping) -> Option<Equation> {
    let id = id.trim().to_string();
    if id.is_empty() {
        return None;
    }
    Some(Equation {
        id,
        name: name.trim().to_string(),
        desc: text_field(record, "desc").unwrap_or_default(),
        weights: record.get("weights").map(parse_weights).unwrap_or_default(),
    })
}

/// Numeric (or numeric-string) finite weights; everything else is skipped.
fn parse_weights(value: &Value) -> WeightVector {
    let Value::Mapping(map) = untag(value.clone()) else {
        return WeightVector::new();
    };
    map.iter()
        .filter_map(|(k, v)| {
            let key = scalar_str(k)?.trim().to_string();
            let w = match untag(v.clone()) {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            (!key.is_empty() && w.is_finite()).then_some((key, w))
        })
        .collect()
}

fn text_field(record: &Mapping, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(scalar_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn scalar_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(t) => scalar_str(&t.value),
        _ => None,
    }
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

/* ----------------------------
Loading
---------------------------- */

/// Registry plus an optional user-visible warning (missing or broken file).
#[derive(Debug, Clone, Default)]
pub struct RegistryLoad {
    pub registry: EquationRegistry,
    pub warning: Option<String>,
}

/// Load the registry from disk. Never fails: problems become an empty
/// registry and a warning for the caller to surface.
pub fn load_equations(path: &Path) -> RegistryLoad {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let warning = if e.kind() == std::io::ErrorKind::NotFound {
                friendly_yaml_missing(path)
            } else {
                friendly_yaml_parse(path, &e.to_string())
            };
            warn!(path = %path.display(), error = %e, "equations file unreadable");
            return RegistryLoad {
                registry: EquationRegistry::default(),
                warning: Some(warning),
            };
        }
    };

    match EquationRegistry::from_yaml_str(&content) {
        Ok(registry) => RegistryLoad {
            registry,
            warning: None,
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "equations file failed to parse");
            RegistryLoad {
                registry: EquationRegistry::default(),
                warning: Some(friendly_yaml_parse(path, &e.to_string())),
            }
        }
    }
}

/// Immutable view handed to one scoring request.
#[derive(Debug, Clone, Default)]
pub struct EquationSnapshot {
    pub registry: Arc<EquationRegistry>,
    pub warning: Option<String>,
}

/// Hot-reload wrapper: reloads when the file's mtime changes (or it appears/disappears).
#[derive(Debug)]
pub struct HotReloadEquations {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    snapshot: EquationSnapshot,
    last_modified: Option<SystemTime>,
    loaded: bool,
}

impl State {
    fn is_fresh(&self, mtime: Option<SystemTime>) -> bool {
        self.loaded && self.last_modified == mtime
    }
}

impl HotReloadEquations {
    /// Create with a path (defaults to "config/equations.yaml" if `None`).
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EQUATIONS_PATH));
        Self {
            path,
            inner: RwLock::new(State::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest registry snapshot, reloading if the file changed.
    pub fn current(&self) -> EquationSnapshot {
        let mtime = fs::metadata(&self.path).and_then(|m| m.modified()).ok();

        // Fast path: read lock only.
        {
            let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if guard.is_fresh(mtime) {
                return guard.snapshot.clone();
            }
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Double-check in case of races.
        if !guard.is_fresh(mtime) {
            let load = load_equations(&self.path);
            info!(
                path = %self.path.display(),
                count = load.registry.len(),
                warning = load.warning.is_some(),
                "equations (re)loaded"
            );
            metrics::gauge!("ripple_equations_loaded").set(load.registry.len() as f64);
            guard.snapshot = EquationSnapshot {
                registry: Arc::new(load.registry),
                warning: load.warning,
            };
            guard.last_modified = mtime;
            guard.loaded = true;
        }
        guard.snapshot.clone()
    }
}
