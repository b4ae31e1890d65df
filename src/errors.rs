// src/errors.rs
//! User-facing messages for configuration and draft file problems.
//!
//! The scoring core never fails; these messages are what the caller surfaces
//! when a YAML file is missing or unreadable. Codes are stable so the UI can
//! link to help text.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    YamlNotFound,
    YamlParse,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::YamlNotFound => "RW-YAML-001",
            ErrorCode::YamlParse => "RW-YAML-002",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message for a YAML file that does not exist.
pub fn friendly_yaml_missing(path: &Path) -> String {
    format!(
        "{}: Missing YAML file. RippleWriter could not find `{}`. \
         Make sure the file exists or point the config at the right location.",
        ErrorCode::YamlNotFound,
        path.display()
    )
}

/// Message for a YAML file that exists but cannot be parsed.
pub fn friendly_yaml_parse(path: &Path, details: &str) -> String {
    format!(
        "{}: YAML format issue in `{}` ({details}). \
         Look for indentation mistakes or missing colons.",
        ErrorCode::YamlParse,
        path.display()
    )
}
