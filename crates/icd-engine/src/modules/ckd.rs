//! CKD staging.
//!
//! Exactly one N18.- stage code survives once a stage is known; the
//! unspecified stage code never lingers next to a specific one. Chronic
//! dialysis dependence carries its status code.

use icd_model::{CandidateCode, ConceptAttributes, DialysisStatus};

use crate::generate::{SCORE_BROAD, ckd_stage_code};
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct CkdStagingModule;

impl GuidelineModule for CkdStagingModule {
    fn rule_id(&self) -> &'static str {
        "ckd-staging"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((index, ConceptAttributes::KidneyDisease {
            stage, dialysis, ..
        })) = state.kidney()
        else {
            return state;
        };
        let stage = *stage;
        let dialysis = *dialysis;

        if let Some(stage) = stage {
            let keep = ckd_stage_code(stage);
            for code in state.codes_with_prefix("N18") {
                if icd_catalog::normalize_code(&code) != icd_catalog::normalize_code(keep) {
                    state.remove_with_message(
                        &code,
                        format!("removed {code}: the documented stage maps to {keep}"),
                    );
                }
            }
        } else if state.contains("N18.9") {
            state.warn_once(
                "chronic kidney disease documented without a stage; coding N18.9".to_string(),
            );
        }

        if dialysis == Some(DialysisStatus::Chronic) && !state.contains("Z99.2") {
            state.insert(
                CandidateCode::new("Z99.2", "dependence on renal dialysis", SCORE_BROAD)
                    .with_origin(index)
                    .with_rule(self.rule_id()),
            );
        }

        state
    }
}
