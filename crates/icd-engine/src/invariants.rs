//! Cross-cutting invariant enforcement.
//!
//! A final corrective pass independent of which guideline modules ran.
//! Each violation is corrected (the offending code removed or the missing
//! one added) and reported as a warning.

use icd_model::{CandidateCode, ConceptAttributes, DialysisStatus};
use tracing::warn;

use crate::generate::SCORE_BROAD;
use crate::state::CodingState;

/// Enforce the clinical truths the final list must satisfy.
pub fn enforce_invariants(mut state: CodingState) -> CodingState {
    state = enforce_dialysis_dependence(state);
    state = enforce_acute_kidney_injury(state);
    state = enforce_encephalopathy(state);
    enforce_severe_sepsis(state)
}

/// Z99.2 appears iff dialysis status is chronic.
fn enforce_dialysis_dependence(mut state: CodingState) -> CodingState {
    let chronic = matches!(
        state.kidney(),
        Some((
            _,
            ConceptAttributes::KidneyDisease {
                dialysis: Some(DialysisStatus::Chronic),
                ..
            },
        ))
    );
    let present = state.contains("Z99.2");
    if present && !chronic {
        state.remove_with_message(
            "Z99.2",
            "invariant: removed Z99.2, chronic dialysis is not documented",
        );
        warn!("removed Z99.2 without chronic dialysis");
    } else if !present && chronic {
        let index = state.kidney().map(|(i, _)| i);
        let mut candidate =
            CandidateCode::new("Z99.2", "dependence on renal dialysis", SCORE_BROAD)
                .with_rule("invariant-dialysis");
        if let Some(index) = index {
            candidate = candidate.with_origin(index);
        }
        state.insert(candidate);
        state.warn_once(
            "invariant: added Z99.2 for documented chronic dialysis".to_string(),
        );
    }
    state
}

/// N17.- appears only with a documented acute kidney injury.
fn enforce_acute_kidney_injury(mut state: CodingState) -> CodingState {
    let documented = matches!(
        state.kidney(),
        Some((
            _,
            ConceptAttributes::KidneyDisease {
                acute_injury: true,
                ..
            },
        ))
    );
    if documented {
        return state;
    }
    for code in state.codes_with_prefix("N17") {
        state.remove_with_message(
            &code,
            format!("invariant: removed {code}, acute kidney injury is not documented"),
        );
    }
    state
}

/// Encephalopathy codes require an encephalopathy concept.
fn enforce_encephalopathy(mut state: CodingState) -> CodingState {
    if state.encephalopathy().is_some() {
        return state;
    }
    for code in state.codes_with_prefix("G93.4") {
        state.remove_with_message(
            &code,
            format!("invariant: removed {code}, no encephalopathy is documented"),
        );
    }
    state
}

/// R65.2- requires severe sepsis; R65.21 additionally requires shock.
fn enforce_severe_sepsis(mut state: CodingState) -> CodingState {
    let (severe, shock) = match state.sepsis() {
        Some((
            _,
            ConceptAttributes::Sepsis {
                severe,
                septic_shock,
                ..
            },
        )) => (*severe, *septic_shock),
        _ => (false, false),
    };
    if !severe {
        for code in state.codes_with_prefix("R65.2") {
            state.remove_with_message(
                &code,
                format!("invariant: removed {code}, severe sepsis is not documented"),
            );
        }
        return state;
    }
    if !shock && state.contains("R65.21") {
        state.remove_with_message(
            "R65.21",
            "invariant: removed R65.21, septic shock is not documented",
        );
        if !state.contains("R65.20") {
            let index = state.sepsis().map(|(i, _)| i);
            let mut candidate = CandidateCode::new(
                "R65.20",
                "severe sepsis without septic shock",
                SCORE_BROAD,
            )
            .with_rule("invariant-severe-sepsis");
            if let Some(index) = index {
                candidate = candidate.with_origin(index);
            }
            state.insert(candidate);
            state.warn_once(
                "invariant: corrected severe sepsis coding to R65.20".to_string(),
            );
        }
    }
    state
}
