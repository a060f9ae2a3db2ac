//! Guideline rule engine and coding pipeline.
//!
//! The engine turns extracted concepts into a ranked, guideline-compliant
//! code list: candidate generation, an ordered chain of pure guideline
//! modules, catalog-driven exclusion resolution, invariant enforcement, and
//! deterministic sequencing. Identical input always yields identical
//! output: codes, order, and messages.

pub mod exclusion;
pub mod generate;
pub mod invariants;
pub mod modules;
pub mod pipeline;
pub mod sequence;
pub mod state;

pub use modules::{GuidelineModule, ModuleContext, default_modules};
pub use pipeline::{CodingPipeline, code_structured, code_text};
pub use state::CodingState;
