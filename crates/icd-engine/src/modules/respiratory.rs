//! Respiratory rules: COPD variants and asthma status.

use icd_model::{AsthmaStatus, CandidateCode, ConceptAttributes, Organism};

use crate::generate::{SCORE_SPECIFIC, SCORE_UNSPECIFIED, asthma_code};
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct RespiratoryModule;

fn pneumonia_code(organism: Organism) -> &'static str {
    match organism {
        Organism::Streptococcus => "J13",
        Organism::Haemophilus => "J14",
        Organism::Klebsiella => "J15.0",
        Organism::Pseudomonas => "J15.1",
        Organism::Staphylococcus => "J15.20",
        Organism::EscherichiaColi => "J15.5",
    }
}

impl GuidelineModule for RespiratoryModule {
    fn rule_id(&self) -> &'static str {
        "respiratory-copd-asthma"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        state = self.apply_copd(state);
        self.apply_asthma(state)
    }
}

impl RespiratoryModule {
    fn apply_copd(&self, mut state: CodingState) -> CodingState {
        let Some((index, ConceptAttributes::Copd {
            lower_respiratory_infection,
            organism,
            ..
        })) = state.copd()
        else {
            return state;
        };
        let infection = *lower_respiratory_infection;
        let organism = *organism;

        // Infection and exacerbation variants are mutually exclusive; the
        // infection wins.
        if state.contains("J44.0") {
            state.remove_with_message(
                "J44.1",
                "removed J44.1: the lower respiratory infection variant takes precedence",
            );
        }

        if infection {
            let has_pneumonia = ["J13", "J14", "J15", "J18"]
                .iter()
                .any(|p| !state.codes_with_prefix(p).is_empty());
            if !has_pneumonia {
                match organism {
                    Some(organism) => {
                        state.insert(
                            CandidateCode::new(
                                pneumonia_code(organism),
                                "pneumonia by documented organism",
                                SCORE_SPECIFIC,
                            )
                            .with_origin(index)
                            .with_rule(self.rule_id()),
                        );
                    }
                    None => {
                        state.insert(
                            CandidateCode::new(
                                "J18.9",
                                "pneumonia, organism not documented",
                                SCORE_UNSPECIFIED,
                            )
                            .with_origin(index)
                            .with_rule(self.rule_id()),
                        );
                        state.warn(
                            "lower respiratory infection without a documented organism; \
                             defaulting to unspecified-organism pneumonia"
                                .to_string(),
                        );
                    }
                }
            }
        }

        state
    }

    fn apply_asthma(&self, mut state: CodingState) -> CodingState {
        let Some((index, ConceptAttributes::Asthma { severity, status })) = state.asthma() else {
            return state;
        };
        let severity = *severity;
        let status = *status;
        if status == AsthmaStatus::Uncomplicated {
            return state;
        }

        let plain = asthma_code(severity, AsthmaStatus::Uncomplicated);
        let target = asthma_code(severity, status);
        if state.contains(target) {
            return state;
        }
        let score = state
            .remove(plain)
            .map(|c| c.base_score)
            .unwrap_or(SCORE_SPECIFIC);
        state.insert(
            CandidateCode::new(target, "asthma severity with documented status", score)
                .with_origin(index)
                .with_rule(self.rule_id()),
        );
        state
    }
}
