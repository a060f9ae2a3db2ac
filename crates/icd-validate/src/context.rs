//! Shared read-only context handed to every compliance rule.

use icd_catalog::Catalog;
use icd_model::{Concept, ConceptAttributes, SequencedCode};

/// Everything a rule may inspect. Rules never mutate the list.
pub struct ValidationContext<'a> {
    pub codes: &'a [SequencedCode],
    pub concepts: &'a [Concept],
    pub catalog: &'a Catalog,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        codes: &'a [SequencedCode],
        concepts: &'a [Concept],
        catalog: &'a Catalog,
    ) -> Self {
        Self {
            codes,
            concepts,
            catalog,
        }
    }

    /// The order-1 code, if present.
    pub fn principal(&self) -> Option<&SequencedCode> {
        self.codes.iter().find(|c| c.order == 1)
    }

    pub fn has_code(&self, code: &str) -> bool {
        let key = icd_catalog::normalize_code(code);
        self.codes
            .iter()
            .any(|c| icd_catalog::normalize_code(&c.code) == key)
    }

    /// Codes whose normalized form starts with the given prefix.
    pub fn codes_with_prefix(&self, prefix: &str) -> Vec<&SequencedCode> {
        self.codes
            .iter()
            .filter(|c| icd_catalog::reference_matches(prefix, &c.code))
            .collect()
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        !self.codes_with_prefix(prefix).is_empty()
    }

    pub fn kidney_attributes(&self) -> Option<&ConceptAttributes> {
        self.concepts
            .iter()
            .map(|c| &c.attributes)
            .find(|a| matches!(a, ConceptAttributes::KidneyDisease { .. }))
    }

    pub fn sepsis_attributes(&self) -> Option<&ConceptAttributes> {
        self.concepts
            .iter()
            .map(|c| &c.attributes)
            .find(|a| matches!(a, ConceptAttributes::Sepsis { .. }))
    }

    pub fn has_encephalopathy_concept(&self) -> bool {
        self.concepts
            .iter()
            .any(|c| matches!(c.attributes, ConceptAttributes::Encephalopathy { .. }))
    }

    pub fn has_injury_concept(&self) -> bool {
        self.concepts
            .iter()
            .any(|c| matches!(c.attributes, ConceptAttributes::Injury { .. }))
    }
}
