//! Concept extraction for the diagnosis coding pipeline.
//!
//! Two front-ends share one [`Concept`](icd_model::Concept) contract: the
//! free-text extractor (normalize, then run per-domain detectors) and the
//! structured "Field: Value" parser. Extraction is deterministic and never
//! guesses an attribute the text does not state.

pub mod concepts;
pub mod error;
pub mod normalize;
pub mod structured;

pub use concepts::ConceptExtractor;
pub use error::ExtractError;
pub use normalize::normalize;
pub use structured::{ParsedNote, parse_structured};
