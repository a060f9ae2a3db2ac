//! Catalog entry types.
//!
//! Guidance notes are parsed into structured links at load time. A link is
//! either an exact code ("N18.6") or a family prefix ("N18", "I50") that
//! matches every code beginning with it; no free-text note is ever scanned
//! at coding time.

use serde::{Deserialize, Serialize};

/// Structured guidance links attached to one code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNotes {
    /// Conditions the code includes (index terms, used by search).
    pub includes: Vec<String>,
    /// "Not coded here" links: the related code never appears together
    /// with this one.
    pub excludes1: Vec<String>,
    /// "Not included here" links: both codes may appear; advisory only.
    pub excludes2: Vec<String>,
    /// "Use additional code" links.
    pub use_additional: Vec<String>,
    /// "Code first" links: the referenced code sequences before this one.
    pub code_first: Vec<String>,
}

impl CodeNotes {
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
            && self.excludes1.is_empty()
            && self.excludes2.is_empty()
            && self.use_additional.is_empty()
            && self.code_first.is_empty()
    }
}

/// One immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Dotted ICD-10-CM code as published (e.g. "E11.22").
    pub code: String,
    pub description: String,
    pub notes: CodeNotes,
}

/// Canonical lookup key: uppercase, formatting characters removed.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// True when `code` is covered by `reference`: an exact match or a family
/// prefix match on the normalized forms.
pub fn reference_matches(reference: &str, code: &str) -> bool {
    let reference = normalize_code(reference);
    let code = normalize_code(code);
    !reference.is_empty() && code.starts_with(&reference)
}
