//! Candidate codes and catalog exclusion relations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A proposed diagnosis code with traceable reason and score, prior to
/// conflict resolution. Identity is the `code` string: inserting the same
/// code twice merges rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCode {
    /// ICD-10-CM code, dotted form (e.g. "E11.22").
    pub code: String,
    /// Why this candidate exists.
    pub reason: String,
    /// Specificity-weighted base score.
    pub base_score: f64,
    /// Indices of the concepts this candidate originated from.
    pub origins: BTreeSet<usize>,
    /// Guideline rule that produced or last reshaped this candidate.
    pub rule_id: Option<String>,
    /// Advisory notes attached by Excludes2 relations and catalog guidance.
    pub advisories: Vec<String>,
}

impl CandidateCode {
    pub fn new(code: impl Into<String>, reason: impl Into<String>, base_score: f64) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
            base_score,
            origins: BTreeSet::new(),
            rule_id: None,
            advisories: Vec::new(),
        }
    }

    /// Attach an originating concept index.
    #[must_use]
    pub fn with_origin(mut self, concept_index: usize) -> Self {
        self.origins.insert(concept_index);
        self
    }

    /// Attach the guideline rule id.
    #[must_use]
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Merge a duplicate insertion of the same code: the higher score wins,
    /// provenance is unioned, the first reason and rule id are kept. The
    /// caller decides code identity (formatting-insensitive in the engine).
    pub fn merge(&mut self, other: CandidateCode) {
        if other.base_score > self.base_score {
            self.base_score = other.base_score;
            self.reason = other.reason;
        }
        self.origins.extend(other.origins);
        if self.rule_id.is_none() {
            self.rule_id = other.rule_id;
        }
        self.advisories.extend(other.advisories);
    }

    /// Code specificity: character count ignoring formatting. Used by the
    /// Excludes1 resolver as the first tie-break key.
    pub fn specificity(&self) -> usize {
        self.code.chars().filter(|c| c.is_ascii_alphanumeric()).count()
    }
}

/// Kind of a catalog exclusion relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionKind {
    /// "Not coded here": the two codes never appear together.
    Excludes1,
    /// "Not included here": both may appear; advisory only.
    Excludes2,
}

/// A directed exclusion relation sourced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRelation {
    pub code: String,
    pub excluded_code: String,
    pub kind: ExclusionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_max_score_and_unions_origins() {
        let mut a = CandidateCode::new("E11.22", "diabetic CKD", 0.7).with_origin(0);
        let b = CandidateCode::new("E11.22", "diabetes with kidney disease", 0.9)
            .with_origin(1)
            .with_rule("diabetes-ckd");
        a.merge(b);
        assert_eq!(a.base_score, 0.9);
        assert_eq!(a.reason, "diabetes with kidney disease");
        assert_eq!(a.origins.len(), 2);
        assert_eq!(a.rule_id.as_deref(), Some("diabetes-ckd"));
    }

    #[test]
    fn specificity_ignores_the_dot() {
        let c = CandidateCode::new("N18.31", "stage 3a", 0.5);
        assert_eq!(c.specificity(), 5);
        let plain = CandidateCode::new("I10", "hypertension", 0.5);
        assert_eq!(plain.specificity(), 3);
    }
}
