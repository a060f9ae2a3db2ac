//! Cardio-renal combination hierarchy.
//!
//! The richest documented combination wins: hypertension + heart failure +
//! CKD collapses to the I13.- code, superseding the two-way combinations
//! and plain hypertension; each two-way combination supersedes I10. The
//! heart-failure type code stays and is coded independently.

use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct CardioRenalModule;

impl GuidelineModule for CardioRenalModule {
    fn rule_id(&self) -> &'static str {
        "cardio-renal-combination"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let has_triple = !state.codes_with_prefix("I13").is_empty();
        let has_htn_ckd = !state.codes_with_prefix("I12").is_empty();
        let has_htn_hf = state.contains("I11.0");

        if has_triple {
            for code in state.codes_with_prefix("I12") {
                state.remove_with_message(
                    &code,
                    format!("removed {code}: superseded by the hypertensive heart and CKD code"),
                );
            }
            state.remove_with_message(
                "I11.0",
                "removed I11.0: superseded by the hypertensive heart and CKD code",
            );
        }
        if has_triple || has_htn_ckd || has_htn_hf {
            state.remove_with_message(
                "I10",
                "removed I10: a richer hypertension combination applies",
            );
        }

        state
    }
}
