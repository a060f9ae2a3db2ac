//! Pregnancy override.
//!
//! Conditions complicating a pregnancy are coded from the obstetric
//! chapter; the endocrine and cardiac candidates they replace are removed.
//! The incidental-pregnancy code only stays when nothing is complicated.

use icd_model::{CandidateCode, ConceptAttributes};

use crate::generate::SCORE_COMBINATION;
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct PregnancyModule;

impl GuidelineModule for PregnancyModule {
    fn rule_id(&self) -> &'static str {
        "pregnancy-override"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((index, ConceptAttributes::Pregnancy {
            gestational_diabetes,
            ..
        })) = state.pregnancy()
        else {
            return state;
        };
        let gestational = *gestational_diabetes;
        let mut replaced = false;

        // Endocrine chapter → O24.-.
        let mut removed_endocrine = false;
        for prefix in ["E08", "E09", "E10", "E11", "E13"] {
            for code in state.codes_with_prefix(prefix) {
                removed_endocrine |= state.remove_with_message(
                    &code,
                    format!("removed {code}: diabetes in pregnancy is coded from chapter 15"),
                );
            }
        }
        if removed_endocrine || gestational {
            let code = if gestational { "O24.419" } else { "O24.919" };
            if !state.contains(code) {
                state.insert(
                    CandidateCode::new(code, "diabetes complicating pregnancy", SCORE_COMBINATION)
                        .with_origin(index)
                        .with_rule(self.rule_id()),
                );
                state.warn(format!("pregnancy overrides diabetes coding to {code}"));
            }
            replaced = true;
        }

        // Cardiac and hypertension chapters → O10.- / O99.4-.
        let mut removed_htn = false;
        for prefix in ["I10", "I11", "I12", "I13"] {
            for code in state.codes_with_prefix(prefix) {
                removed_htn |= state.remove_with_message(
                    &code,
                    format!("removed {code}: hypertension in pregnancy is coded from chapter 15"),
                );
            }
        }
        if removed_htn && !state.contains("O10.919") {
            state.insert(
                CandidateCode::new(
                    "O10.919",
                    "pre-existing hypertension complicating pregnancy",
                    SCORE_COMBINATION,
                )
                .with_origin(index)
                .with_rule(self.rule_id()),
            );
            state.warn("pregnancy overrides hypertension coding to O10.919".to_string());
            replaced = true;
        }
        let mut removed_cardiac = false;
        for code in state.codes_with_prefix("I50") {
            removed_cardiac |= state.remove_with_message(
                &code,
                format!("removed {code}: circulatory disease in pregnancy is coded from chapter 15"),
            );
        }
        if removed_cardiac && !state.contains("O99.419") {
            state.insert(
                CandidateCode::new(
                    "O99.419",
                    "circulatory disease complicating pregnancy",
                    SCORE_COMBINATION,
                )
                .with_origin(index)
                .with_rule(self.rule_id()),
            );
            state.warn("pregnancy overrides heart failure coding to O99.419".to_string());
            replaced = true;
        }

        // Z33.1 is only for an incidental pregnant state.
        if replaced || state.codes_with_prefix("O24").len()
            + state.codes_with_prefix("O10").len()
            + state.codes_with_prefix("O99").len()
            > 0
        {
            state.remove("Z33.1");
        }

        state
    }
}
