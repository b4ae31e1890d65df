// src/config/studio.rs
//! Studio configuration from `config/studio.toml`.
//!
//! ```toml
//! [paths]
//! equations = "config/equations.yaml"
//! drafts = "articles"
//!
//! [signals]
//! coherence_words = 800
//! evidence_hits = 6
//! clarity_bullets = 8
//! novelty_terms = 800
//! sentiment = "constant"   # or "lexicon"
//! sentiment_baseline = 0.7
//!
//! [storage]
//! round_decimals = 4
//! ```
//! Every key is optional. Env overrides win over the file:
//! `RIPPLE_EQUATIONS_PATH`, `RIPPLE_DRAFTS_DIR`, `RIPPLE_SENTIMENT_MODE`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::analyze::equations::DEFAULT_EQUATIONS_PATH;
use crate::analyze::signals::{SentimentMode, SignalConfig};

pub const DEFAULT_STUDIO_CONFIG_PATH: &str = "config/studio.toml";
pub const DEFAULT_DRAFTS_DIR: &str = "articles";

pub const ENV_STUDIO_CONFIG_PATH: &str = "RIPPLE_CONFIG_PATH";
pub const ENV_EQUATIONS_PATH: &str = "RIPPLE_EQUATIONS_PATH";
pub const ENV_DRAFTS_DIR: &str = "RIPPLE_DRAFTS_DIR";
pub const ENV_SENTIMENT_MODE: &str = "RIPPLE_SENTIMENT_MODE";

fn default_equations_path() -> PathBuf {
    PathBuf::from(DEFAULT_EQUATIONS_PATH)
}
fn default_drafts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DRAFTS_DIR)
}
fn default_round_decimals() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_equations_path")]
    pub equations: PathBuf,
    #[serde(default = "default_drafts_dir")]
    pub drafts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            equations: default_equations_path(),
            drafts: default_drafts_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Decimal places for `meta.signals`.
    #[serde(default = "default_round_decimals")]
    pub round_decimals: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            round_decimals: default_round_decimals(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl StudioConfig {
    /// Resolve the config path ($RIPPLE_CONFIG_PATH or "config/studio.toml"), load it,
    /// then apply env overrides.
    ///
    /// A missing default file means defaults; a missing file named by the env var
    /// or a malformed file is an error.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(ENV_STUDIO_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(anyhow!(
                        "{ENV_STUDIO_CONFIG_PATH} points to non-existent path {}",
                        path.display()
                    ));
                }
                Self::from_path(&path)?
            }
            Err(_) => {
                let path = PathBuf::from(DEFAULT_STUDIO_CONFIG_PATH);
                if path.exists() {
                    Self::from_path(&path)?
                } else {
                    info!("no {DEFAULT_STUDIO_CONFIG_PATH}; using defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading studio config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing studio config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: StudioConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(p) = env::var(ENV_EQUATIONS_PATH) {
            self.paths.equations = PathBuf::from(p);
        }
        if let Ok(p) = env::var(ENV_DRAFTS_DIR) {
            self.paths.drafts = PathBuf::from(p);
        }
        if let Ok(m) = env::var(ENV_SENTIMENT_MODE) {
            self.signals.sentiment = m
                .parse::<SentimentMode>()
                .with_context(|| format!("invalid {ENV_SENTIMENT_MODE}"))?;
        }
        Ok(())
    }

    // Keep the baseline inside [0,1]; thresholds are guarded at use.
    fn sanitize(&mut self) {
        let b = self.signals.sentiment_baseline;
        if !(0.0..=1.0).contains(&b) {
            warn!(baseline = b, "sentiment_baseline out of range; using 0.7");
            self.signals.sentiment_baseline = SignalConfig::default().sentiment_baseline;
        }
        if self.storage.round_decimals > 12 {
            self.storage.round_decimals = 12;
        }
    }
}
