//! Immutable ICD-10-CM reference catalog.
//!
//! The catalog is a code → metadata registry loaded once (embedded seed data
//! or an external CSV with the same schema) and then only read. Guidance
//! notes (includes, Excludes1/Excludes2, "use additional code", "code
//! first") are parsed into structured links at load time so the rule engine
//! never scans free text. Exact lookup and ranked free-text search are pure
//! read operations, safe to share across threads without locking.

pub mod catalog;
pub mod entry;
pub mod error;
pub mod search;

pub use catalog::{Catalog, default_catalog};
pub use entry::{CodeEntry, CodeNotes, normalize_code, reference_matches};
pub use error::CatalogError;
pub use search::SearchHit;
