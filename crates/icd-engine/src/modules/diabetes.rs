//! Diabetes primary-manifestation selection.

use std::collections::BTreeSet;

use icd_model::{ConceptAttributes, DiabetesComplication};

use crate::generate::{complication_suffix, diabetes_prefix, kidney_is_chronic};
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct DiabetesModule;

/// Precedence of documented complications when choosing the manifestation
/// that leads the diabetes coding. One table, so a confirmed guideline
/// correction is a single reorder.
fn precedence_rank(complication: &DiabetesComplication) -> u8 {
    match complication {
        DiabetesComplication::HyperosmolarState => 0,
        DiabetesComplication::Ketoacidosis => 1,
        DiabetesComplication::Hypoglycemia => 2,
        DiabetesComplication::Hyperglycemia => 3,
        DiabetesComplication::FootUlcer => 4,
        DiabetesComplication::PeripheralAngiopathy { .. } => 5,
        DiabetesComplication::CharcotJoint => 6,
        DiabetesComplication::Retinopathy { .. } => 7,
        DiabetesComplication::Nephropathy => 8,
        DiabetesComplication::Neuropathy(_) => 9,
        DiabetesComplication::Cataract => 10,
    }
}

/// Score assigned to the selected primary manifestation so it leads the
/// diabetes block without outranking cardio-renal combination codes.
const PRIMARY_SCORE: f64 = 0.92;

impl GuidelineModule for DiabetesModule {
    fn rule_id(&self) -> &'static str {
        "diabetes-primary-manifestation"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((_, ConceptAttributes::Diabetes {
            diabetes_type,
            complications,
            uncontrolled,
        })) = state.diabetes()
        else {
            return state;
        };
        let diabetes_type = *diabetes_type;
        let complications = complications.clone();
        let uncontrolled = *uncontrolled;
        let prefix = diabetes_prefix(diabetes_type);
        let ckd_linked = state.kidney().is_some_and(|(_, a)| kidney_is_chronic(a));

        let allowed = allowed_suffixes(&complications, uncontrolled, ckd_linked);

        // Purge diabetes-chapter candidates outside the documented
        // complication families.
        for code in state.codes_with_prefix(prefix) {
            let suffix = code[prefix.len()..].to_string();
            if !allowed.contains(&suffix) {
                state.remove_with_message(
                    &code,
                    format!("removed {code}: not among the documented diabetes manifestations"),
                );
            }
        }

        // With diabetic CKD the combination code covers the nephropathy.
        if ckd_linked {
            let nephropathy = format!("{prefix}.21");
            if complications.contains(&DiabetesComplication::Nephropathy)
                && state.contains(&nephropathy)
            {
                state.remove_with_message(
                    &nephropathy,
                    format!("removed {nephropathy}: superseded by the diabetic CKD code"),
                );
            }
        }

        // Select the primary manifestation by precedence.
        if let Some(primary) = primary_code(prefix, &complications, uncontrolled, ckd_linked) {
            let rule = self.rule_id();
            if let Some(candidate) = state.get_mut(&primary) {
                candidate.base_score = PRIMARY_SCORE;
                candidate.rule_id = Some(rule.to_string());
            }
        }

        state
    }
}

fn allowed_suffixes(
    complications: &BTreeSet<DiabetesComplication>,
    uncontrolled: bool,
    ckd_linked: bool,
) -> BTreeSet<String> {
    let mut allowed: BTreeSet<String> = complications
        .iter()
        .map(|c| complication_suffix(c).0)
        .collect();
    if uncontrolled {
        allowed.insert(".65".to_string());
    }
    if ckd_linked {
        allowed.insert(".22".to_string());
    }
    if complications.is_empty() && !uncontrolled && !ckd_linked {
        allowed.insert(".9".to_string());
    }
    allowed
}

fn primary_code(
    prefix: &str,
    complications: &BTreeSet<DiabetesComplication>,
    uncontrolled: bool,
    ckd_linked: bool,
) -> Option<String> {
    let primary = complications.iter().min_by_key(|c| precedence_rank(c));
    match primary {
        Some(DiabetesComplication::Nephropathy) if ckd_linked => Some(format!("{prefix}.22")),
        Some(complication) => {
            // An uncontrolled flag outranks complications below the
            // hyperglycemia slot.
            if uncontrolled && precedence_rank(complication) > 3 {
                return Some(format!("{prefix}.65"));
            }
            Some(format!("{prefix}{}", complication_suffix(complication).0))
        }
        None if ckd_linked => Some(format!("{prefix}.22")),
        None if uncontrolled => Some(format!("{prefix}.65")),
        None => None,
    }
}
