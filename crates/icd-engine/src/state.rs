//! Call-local pipeline state.
//!
//! One [`CodingState`] is threaded through the reducer pipeline: the
//! generator seeds it, each guideline module consumes and returns it, and
//! the sequencer drains it. Candidates are keyed by normalized code, so
//! inserting an existing code merges instead of duplicating.

use std::collections::BTreeMap;

use icd_catalog::normalize_code;
use icd_model::{CandidateCode, Concept, ConceptAttributes};

/// Concept list plus the mutable candidate set and run diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CodingState {
    pub concepts: Vec<Concept>,
    candidates: BTreeMap<String, CandidateCode>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Codes to sequence first, in emission order.
    lead_hints: Vec<String>,
}

impl CodingState {
    pub fn new(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            ..Self::default()
        }
    }

    /// Insert a candidate; a duplicate code merges by max score with
    /// unioned provenance.
    pub fn insert(&mut self, candidate: CandidateCode) {
        let key = normalize_code(&candidate.code);
        match self.candidates.get_mut(&key) {
            Some(existing) => existing.merge(candidate),
            None => {
                self.candidates.insert(key, candidate);
            }
        }
    }

    pub fn remove(&mut self, code: &str) -> Option<CandidateCode> {
        self.candidates.remove(&normalize_code(code))
    }

    /// Remove a candidate and record why.
    pub fn remove_with_message(&mut self, code: &str, message: impl Into<String>) -> bool {
        if self.remove(code).is_some() {
            self.warnings.push(message.into());
            return true;
        }
        false
    }

    pub fn get(&self, code: &str) -> Option<&CandidateCode> {
        self.candidates.get(&normalize_code(code))
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut CandidateCode> {
        self.candidates.get_mut(&normalize_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.candidates.contains_key(&normalize_code(code))
    }

    /// Candidates in normalized-code order.
    pub fn candidates(&self) -> impl Iterator<Item = &CandidateCode> {
        self.candidates.values()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Dotted code values in normalized order.
    pub fn codes(&self) -> Vec<String> {
        self.candidates.values().map(|c| c.code.clone()).collect()
    }

    pub fn codes_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.candidates
            .values()
            .filter(|c| icd_catalog::reference_matches(prefix, &c.code))
            .map(|c| c.code.clone())
            .collect()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a warning unless the identical message is already present.
    /// Used by passes that re-evaluate a stable situation.
    pub fn warn_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Ask the sequencer to place this code ahead of score-ranked ones.
    /// Hints are kept in emission order; repeats are ignored.
    pub fn hint_lead(&mut self, code: impl Into<String>) {
        let code = code.into();
        let key = normalize_code(&code);
        if !self
            .lead_hints
            .iter()
            .any(|existing| normalize_code(existing) == key)
        {
            self.lead_hints.push(code);
        }
    }

    pub fn lead_hints(&self) -> &[String] {
        &self.lead_hints
    }

    // Concept accessors used by the guideline modules.

    fn attributes_where(
        &self,
        pred: impl Fn(&ConceptAttributes) -> bool,
    ) -> Option<(usize, &ConceptAttributes)> {
        self.concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (i, &c.attributes))
            .find(|(_, a)| pred(a))
    }

    pub fn diabetes(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Diabetes { .. }))
    }

    pub fn kidney(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::KidneyDisease { .. }))
    }

    pub fn hypertension(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Hypertension))
    }

    pub fn heart_failure(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::HeartFailure { .. }))
    }

    pub fn copd(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Copd { .. }))
    }

    pub fn asthma(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Asthma { .. }))
    }

    pub fn neoplasm(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Neoplasm { .. }))
    }

    pub fn pregnancy(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Pregnancy { .. }))
    }

    pub fn injury(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Injury { .. }))
    }

    pub fn isolated_neuropathy(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Neuropathy { .. }))
    }

    pub fn sepsis(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Sepsis { .. }))
    }

    pub fn encephalopathy(&self) -> Option<(usize, &ConceptAttributes)> {
        self.attributes_where(|a| matches!(a, ConceptAttributes::Encephalopathy { .. }))
    }
}
