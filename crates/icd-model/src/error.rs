use thiserror::Error;

/// Errors surfaced by the coding pipeline.
///
/// The three tiers map to the error handling design: structural parse errors
/// abort a run before any coding happens, missing-attribute errors are
/// hard stops raised when a documented condition lacks a required detail,
/// and catalog errors are fatal load/lookup failures.
#[derive(Debug, Error)]
pub enum CodingError {
    /// Malformed structured input. The pipeline never runs on input that
    /// fails to parse.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A documented condition is missing an attribute that coding requires
    /// (e.g. CKD without a stage under strict options). Never defaulted.
    #[error("{condition} documented without required {attribute}")]
    MissingAttribute {
        condition: String,
        attribute: String,
    },

    /// Reference catalog failure. The only fatal condition.
    #[error("catalog error: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, CodingError>;
