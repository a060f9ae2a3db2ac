//! Deterministic sequencing of surviving candidates.
//!
//! Order: (1) lead hints from guideline modules, in emission order; (2) the
//! rest by base score plus a per-category bonus minus an unspecified-suffix
//! penalty; (3) ties broken by code order. `order` is dense from 1, and
//! element 1 is the principal code.

use std::cmp::Ordering;

use icd_catalog::Catalog;
use icd_model::{CandidateCode, PipelineOptions, SequencedCode};

use crate::state::CodingState;

/// Cardio combination codes outrank everything else in a tie.
const BONUS_CARDIO_COMBINATION: f64 = 0.30;
/// Diabetes/CKD combination codes.
const BONUS_DIABETES_COMBINATION: f64 = 0.25;
/// Staged (not unspecified) CKD codes.
const BONUS_STAGED_CKD: f64 = 0.15;
/// Penalty for codes whose description marks them unspecified.
const UNSPECIFIED_PENALTY: f64 = 0.10;

const CONFIDENCE_FLOOR: f64 = 0.01;
const CONFIDENCE_CEILING: f64 = 0.99;

/// Produce the final dense-ordered list.
pub fn sequence(state: &CodingState, catalog: &Catalog, options: &PipelineOptions) -> Vec<SequencedCode> {
    let mut remaining: Vec<&CandidateCode> = state.candidates().collect();

    // Lead hints first, in emission order.
    let mut ordered: Vec<&CandidateCode> = Vec::new();
    for hint in state.lead_hints() {
        if let Some(pos) = remaining
            .iter()
            .position(|c| icd_catalog::normalize_code(&c.code) == icd_catalog::normalize_code(hint))
        {
            ordered.push(remaining.remove(pos));
        }
    }

    // The rest by ranking score, ties by code order.
    remaining.sort_by(|a, b| {
        ranking_score(b, catalog)
            .partial_cmp(&ranking_score(a, catalog))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.code.cmp(&b.code))
    });
    ordered.extend(remaining);

    if let Some(max) = options.max_codes {
        ordered.truncate(max);
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| SequencedCode {
            code: candidate.code.clone(),
            description: catalog
                .describe(&candidate.code)
                .unwrap_or(&candidate.reason)
                .to_string(),
            reason: candidate.reason.clone(),
            order: i as u32 + 1,
            confidence: confidence(candidate, catalog),
            rule_id: candidate.rule_id.clone(),
        })
        .collect()
}

fn ranking_score(candidate: &CandidateCode, catalog: &Catalog) -> f64 {
    candidate.base_score + category_bonus(&candidate.code) - unspecified_penalty(candidate, catalog)
}

fn category_bonus(code: &str) -> f64 {
    let key = icd_catalog::normalize_code(code);
    if key.starts_with("I13") || key.starts_with("I12") || key.starts_with("I11") {
        return BONUS_CARDIO_COMBINATION;
    }
    if (key.starts_with("E10") || key.starts_with("E11")) && key.ends_with("22") && key.len() == 5 {
        return BONUS_DIABETES_COMBINATION;
    }
    if key.starts_with("N18") && key != "N189" {
        return BONUS_STAGED_CKD;
    }
    0.0
}

fn unspecified_penalty(candidate: &CandidateCode, catalog: &Catalog) -> f64 {
    let unspecified = catalog
        .describe(&candidate.code)
        .is_some_and(|d| d.to_lowercase().contains("unspecified"));
    if unspecified { UNSPECIFIED_PENALTY } else { 0.0 }
}

fn confidence(candidate: &CandidateCode, catalog: &Catalog) -> f64 {
    ranking_score(candidate, catalog).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}
