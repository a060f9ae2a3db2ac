//! Neoplasm sequencing.
//!
//! Secondary (metastatic) site codes sequence before the primary site code.
//! A site-specific secondary displaces the unspecified secondary, and a
//! primary equal to a stated metastatic site is a data error.

use icd_model::ConceptAttributes;

use crate::generate::secondary_site_code;
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct NeoplasmModule;

impl GuidelineModule for NeoplasmModule {
    fn rule_id(&self) -> &'static str {
        "neoplasm-sequencing"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((_, ConceptAttributes::Neoplasm {
            primary_site,
            secondary_sites,
            ..
        })) = state.neoplasm()
        else {
            return state;
        };
        let primary_site = *primary_site;
        let secondary_sites = secondary_sites.clone();

        if let Some(primary) = primary_site
            && secondary_sites.contains(&primary)
        {
            state.error(format!(
                "data error: primary site {primary} equals a stated metastatic site"
            ));
        }

        // A site-specific secondary makes the unspecified one redundant.
        let site_specific: Vec<String> = secondary_sites
            .iter()
            .map(|s| secondary_site_code(*s).to_string())
            .filter(|code| state.contains(code))
            .collect();
        if !site_specific.is_empty() {
            state.remove_with_message(
                "C79.9",
                "removed C79.9: a site-specific secondary code is present",
            );
        }

        // Metastatic disease sequences ahead of the primary.
        for code in &site_specific {
            state.hint_lead(code.clone());
        }
        if site_specific.is_empty() && state.contains("C79.9") {
            state.hint_lead("C79.9");
        }

        state
    }
}
