//! Read-only compliance validation for sequenced code lists.
//!
//! Independent predicate rules are evaluated against the final output of the
//! coding pipeline. Rules never mutate the list; every firing rule is
//! reported, with no early exit.

pub mod checks;
pub mod context;
pub mod rules;

pub use context::ValidationContext;
pub use rules::{Rule, all_rules};

use icd_catalog::Catalog;
use icd_model::{Concept, SequencedCode, ValidationReport};

/// Evaluate the full rule set against a sequenced code list.
pub fn validate(
    codes: &[SequencedCode],
    concepts: &[Concept],
    catalog: &Catalog,
) -> ValidationReport {
    let ctx = ValidationContext::new(codes, concepts, catalog);
    let findings = all_rules()
        .iter()
        .filter_map(|rule| rule.evaluate(&ctx))
        .collect();
    ValidationReport::from_findings(findings)
}
