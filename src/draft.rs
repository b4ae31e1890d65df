// src/draft.rs
//! Draft records and the YAML draft directory.
//!
//! Drafts come from hand-edited YAML and LLM output, so decoding is lenient:
//! a `DraftRecord` can be built from *any* YAML/JSON value and never fails.
//! - scalars where strings are expected are stringified
//! - sequences keep their scalar elements (stringified), other elements are dropped
//! - wrong-typed containers become empty, a non-mapping document becomes an empty draft
//! - unknown top-level keys and unknown `meta` keys survive a load/save cycle

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{friendly_yaml_missing, friendly_yaml_parse};

/// Fixed analysis order of the generated sections.
pub const SECTION_ORDER: [&str; 4] = ["lede", "body", "counterpoints", "conclusion"];

/// One generated section: plain text, or lines as some LLMs return them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionText {
    Text(String),
    Lines(Vec<String>),
}

impl Default for SectionText {
    fn default() -> Self {
        SectionText::Text(String::new())
    }
}

impl SectionText {
    /// Text used for analysis: lines are joined with `\n`.
    pub fn joined(&self) -> String {
        match self {
            SectionText::Text(s) => s.clone(),
            SectionText::Lines(lines) => lines.join("\n"),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            SectionText::Text(s) => s.trim().is_empty(),
            SectionText::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
        }
    }

    fn from_value(value: Value) -> Self {
        match untag(value) {
            Value::Sequence(items) => {
                SectionText::Lines(items.into_iter().filter_map(scalar_to_string).collect())
            }
            other => SectionText::Text(scalar_to_string(other).unwrap_or_default()),
        }
    }
}

impl From<&str> for SectionText {
    fn from(s: &str) -> Self {
        SectionText::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedSections {
    pub lede: SectionText,
    pub body: SectionText,
    pub counterpoints: SectionText,
    pub conclusion: SectionText,
    /// Sections outside the fixed set; kept, never analyzed.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl GeneratedSections {
    /// Sections in `SECTION_ORDER`.
    pub fn in_order(&self) -> [&SectionText; 4] {
        [&self.lede, &self.body, &self.counterpoints, &self.conclusion]
    }

    fn from_value(value: Value) -> Self {
        let Value::Mapping(mut map) = untag(value) else {
            return Self::default();
        };
        let mut section = |key: &str| {
            map.remove(key)
                .map(SectionText::from_value)
                .unwrap_or_default()
        };
        let lede = section("lede");
        let body = section("body");
        let counterpoints = section("counterpoints");
        let conclusion = section("conclusion");
        Self {
            lede,
            body,
            counterpoints,
            conclusion,
            extra: map,
        }
    }
}

/// One article under composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct DraftRecord {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    pub thesis: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audience: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tone: String,
    pub outline: Vec<String>,
    pub claims: Vec<String>,
    pub generated_sections: GeneratedSections,
    /// Equation id or display name chosen for this draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intention_equation: Option<String>,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub meta: Mapping,
    /// slug, date, format, images, publish, ...
    #[serde(flatten)]
    pub extra: Mapping,
    /// Document as decoded. Saving a loaded draft writes this back with only
    /// `meta` replaced, so the typed view above never reshapes the file.
    #[serde(skip)]
    pub(crate) source: Option<Mapping>,
}

impl From<Value> for DraftRecord {
    fn from(value: Value) -> Self {
        let Value::Mapping(mut map) = untag(value) else {
            return Self::default();
        };
        let source = Some(map.clone());

        let title = take_string(&mut map, "title");
        let author = take_string(&mut map, "author");
        let thesis = take_string(&mut map, "thesis");
        let audience = take_string(&mut map, "audience");
        let tone = take_string(&mut map, "tone");
        let outline = take_lines(&mut map, "outline");
        let claims = take_lines(&mut map, "claims");
        let generated_sections = map
            .remove("generated_sections")
            .map(GeneratedSections::from_value)
            .unwrap_or_default();
        let intention_equation = map
            .remove("intention_equation")
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let meta = match map.remove("meta").map(untag) {
            Some(Value::Mapping(m)) => m,
            _ => Mapping::new(),
        };

        Self {
            title,
            author,
            thesis,
            audience,
            tone,
            outline,
            claims,
            generated_sections,
            intention_equation,
            meta,
            extra: map,
            source,
        }
    }
}

impl DraftRecord {
    /// Parse YAML text. Only YAML syntax errors fail; shape problems degrade.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(s)?;
        Ok(Self::from(value))
    }

    /// YAML for saving. A draft decoded from a document keeps that document
    /// verbatim apart from `meta`; other drafts use the typed fields.
    pub fn to_yaml_string(&self) -> Result<String> {
        let Some(doc) = &self.source else {
            return Ok(serde_yaml::to_string(self)?);
        };
        let mut doc = doc.clone();
        if !self.meta.is_empty() {
            doc.insert("meta".into(), Value::Mapping(self.meta.clone()));
        }
        Ok(serde_yaml::to_string(&doc)?)
    }

    /// Equation recorded by a previous scoring run, if any.
    pub fn meta_equation(&self) -> Option<&str> {
        self.meta
            .get("equation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Explicit `slug` if present, else derived from the title.
    pub fn slug(&self) -> String {
        let explicit = self.extra.get("slug").and_then(Value::as_str).unwrap_or("");
        let base = if explicit.trim().is_empty() {
            self.title.as_str()
        } else {
            explicit
        };
        let slug = slugify(base);
        if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug
        }
    }

    /// Short claim list used by the lexicon sentiment sample.
    ///
    /// Falls back from `claims` to the outline, then to the first long
    /// sentences of each generated section. Capped at 8 entries.
    pub fn scoring_claims(&self) -> Vec<String> {
        let non_blank = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect()
        };

        let mut claims = non_blank(&self.claims);
        if claims.is_empty() {
            claims = non_blank(&self.outline);
        }
        if claims.is_empty() {
            for section in self.generated_sections.in_order() {
                let SectionText::Text(text) = section else {
                    continue;
                };
                claims.extend(
                    text.split(". ")
                        .map(str::trim)
                        .filter(|s| s.chars().count() > 40)
                        .take(3)
                        .map(str::to_string),
                );
            }
        }
        claims.truncate(8);
        claims
    }
}

/// Lowercase alphanumerics, everything else becomes `-`, trimmed of dashes.
pub fn slugify(s: &str) -> String {
    let raw: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '-'
            }
        })
        .collect();
    raw.trim_matches('-').to_string()
}

/* ----------------------------
Draft directory
---------------------------- */

/// A directory of `*.yaml` drafts. Thin load/save only.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted draft file names. A missing directory is simply empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("listing drafts in {}", self.dir.display()))
            }
        };

        let mut names: Vec<String> = read_dir
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let ext = path.extension().and_then(|s| s.to_str())?;
                if !matches!(ext, "yaml" | "yml") {
                    return None;
                }
                path.file_name()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Path for a draft name; `None` when the name could escape the directory.
    /// A name without extension gets `.yaml`.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return None;
        }
        let file = if name.ends_with(".yaml") || name.ends_with(".yml") {
            name.to_string()
        } else {
            format!("{name}.yaml")
        };
        Some(self.dir.join(file))
    }

    pub fn load(&self, name: &str) -> Result<DraftRecord> {
        let path = self
            .resolve(name)
            .ok_or_else(|| anyhow!("invalid draft name `{name}`"))?;
        load_draft_file(&path)
    }

    pub fn save(&self, name: &str, draft: &DraftRecord) -> Result<PathBuf> {
        let path = self
            .resolve(name)
            .ok_or_else(|| anyhow!("invalid draft name `{name}`"))?;
        save_draft_file(&path, draft)?;
        Ok(path)
    }
}

/// Load one draft file.
pub fn load_draft_file(path: &Path) -> Result<DraftRecord> {
    if !path.exists() {
        return Err(anyhow!(friendly_yaml_missing(path)));
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading draft {}", path.display()))?;
    let draft = DraftRecord::from_yaml_str(&content)
        .map_err(|e| anyhow!(friendly_yaml_parse(path, &e.to_string())))?;
    debug!(path = %path.display(), "draft loaded");
    Ok(draft)
}

/// Write one draft file, creating the parent directory if needed.
pub fn save_draft_file(path: &Path, draft: &DraftRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating draft dir {}", parent.display()))?;
    }
    let yaml = draft.to_yaml_string()?;
    fs::write(path, yaml).with_context(|| format!("writing draft {}", path.display()))?;
    debug!(path = %path.display(), "draft saved");
    Ok(())
}

// --- internals ---

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn take_string(map: &mut Mapping, key: &str) -> String {
    map.remove(key)
        .and_then(scalar_to_string)
        .unwrap_or_default()
}

// Claim entries are sometimes written as `{text: ...}` records.
fn take_lines(map: &mut Mapping, key: &str) -> Vec<String> {
    let Some(Value::Sequence(items)) = map.remove(key).map(untag) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match untag(item) {
            Value::Mapping(m) => ["text", "claim"]
                .iter()
                .find_map(|k| m.get(*k).cloned().and_then(scalar_to_string)),
            other => scalar_to_string(other),
        })
        .collect()
}
