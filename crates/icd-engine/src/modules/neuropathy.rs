//! Neuropathy refinement.
//!
//! When a neuropathy is documented alongside diabetes it is coded as a
//! diabetic manifestation, not a standalone G-chapter condition; a specific
//! subtype upgrades an unspecified diabetic neuropathy code.

use icd_model::{ConceptAttributes, DiabetesComplication, NeuropathySubtype};

use crate::generate::{SCORE_SPECIFIC, diabetes_prefix};
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct NeuropathyModule;

/// Standalone neuropathy codes superseded in a diabetes context.
const STANDALONE_CODES: &[&str] = &["G58.9", "G62.9", "G90.9", "G54.5"];

fn diabetic_suffix(subtype: NeuropathySubtype) -> &'static str {
    match subtype {
        NeuropathySubtype::Mononeuropathy => ".41",
        NeuropathySubtype::Polyneuropathy => ".42",
        NeuropathySubtype::Autonomic => ".43",
        NeuropathySubtype::Amyotrophy => ".44",
        NeuropathySubtype::Unspecified => ".40",
    }
}

impl GuidelineModule for NeuropathyModule {
    fn rule_id(&self) -> &'static str {
        "neuropathy-refinement"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((_, ConceptAttributes::Diabetes {
            diabetes_type,
            complications,
            ..
        })) = state.diabetes()
        else {
            return state;
        };
        let diabetes_type = *diabetes_type;
        let documented_subtype = complications.iter().find_map(|c| match c {
            DiabetesComplication::Neuropathy(subtype) => Some(*subtype),
            _ => None,
        });
        let isolated_subtype = state.isolated_neuropathy().and_then(|(_, a)| match a {
            ConceptAttributes::Neuropathy { subtype } => Some(*subtype),
            _ => None,
        });

        // Standalone codes never coexist with a diabetes concept.
        for code in STANDALONE_CODES {
            state.remove_with_message(
                code,
                format!("removed {code}: neuropathy is coded as a diabetic manifestation"),
            );
        }

        let Some(subtype) = isolated_subtype.or(documented_subtype) else {
            return state;
        };
        if subtype == NeuropathySubtype::Unspecified {
            return state;
        }

        // Upgrade an unspecified diabetic neuropathy to the subtype code.
        let prefix = diabetes_prefix(diabetes_type);
        let unspecified = format!("{prefix}.40");
        if let Some(old) = state.remove(&unspecified) {
            let refined = format!("{prefix}{}", diabetic_suffix(subtype));
            let mut candidate = old;
            candidate.code = refined.clone();
            candidate.base_score = candidate.base_score.max(SCORE_SPECIFIC);
            candidate.rule_id = Some(self.rule_id().to_string());
            state.insert(candidate);
            state.warn(format!(
                "refined {unspecified} to {refined} from the documented neuropathy subtype"
            ));
        }

        state
    }
}
