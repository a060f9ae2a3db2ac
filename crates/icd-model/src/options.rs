//! Configuration options for the coding pipeline.

use serde::{Deserialize, Serialize};

/// How strictly missing attributes on documented conditions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeStrictness {
    /// A documented condition missing a required attribute (e.g. CKD without
    /// a stage) is a hard stop: no codes are generated for that input.
    Strict,
    /// Missing attributes degrade to the unspecified code with a warning.
    #[default]
    Lenient,
}

/// Options for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Hard-stop vs degrade behavior for underspecified conditions.
    /// The structured front-end defaults to Strict, free text to Lenient.
    pub strictness: AttributeStrictness,

    /// Apply catalog "use additional code" / "code first" guidance notes.
    /// Default: true.
    pub apply_catalog_guidance: bool,

    /// Maximum codes in the final list. Default: no limit.
    pub max_codes: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strictness: AttributeStrictness::default(),
            apply_catalog_guidance: true,
            max_codes: None,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict preset used by the structured front-end.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strictness: AttributeStrictness::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: AttributeStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    #[must_use]
    pub fn with_catalog_guidance(mut self, enable: bool) -> Self {
        self.apply_catalog_guidance = enable;
        self
    }
}
