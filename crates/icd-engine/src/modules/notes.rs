//! Catalog-driven guidance: "use additional code" and "code first" links.
//!
//! Links were parsed into structured references at catalog load. A note's
//! reference list is a set of alternatives: any matching candidate
//! satisfies it. When nothing matches and the references name exactly one
//! catalog code, the missing code is added with a warning; when they
//! resolve to several, a warning lists them all for manual resolution,
//! never a silent guess.

use icd_model::CandidateCode;

use crate::generate::SCORE_BROAD;
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct CatalogNotesModule;

impl GuidelineModule for CatalogNotesModule {
    fn rule_id(&self) -> &'static str {
        "catalog-guidance"
    }

    fn apply(&self, mut state: CodingState, ctx: &ModuleContext<'_>) -> CodingState {
        if !ctx.options.apply_catalog_guidance {
            return state;
        }

        for code in state.codes() {
            let use_additional = ctx.catalog.use_additional_for(&code).to_vec();
            if !use_additional.is_empty() && first_match(&state, &use_additional).is_none() {
                self.resolve_missing(&mut state, ctx, &code, &use_additional, false);
            }

            let code_first = ctx.catalog.code_first_for(&code).to_vec();
            if !code_first.is_empty() {
                match first_match(&state, &code_first) {
                    // The dependency exists; make sure it sequences first.
                    Some(existing) => state.hint_lead(existing),
                    None => self.resolve_missing(&mut state, ctx, &code, &code_first, true),
                }
            }
        }

        state
    }
}

impl CatalogNotesModule {
    /// No candidate satisfies the note. Resolve its references to concrete
    /// catalog codes and either add the single named code or report the
    /// choices.
    fn resolve_missing(
        &self,
        state: &mut CodingState,
        ctx: &ModuleContext<'_>,
        code: &str,
        references: &[String],
        sequence_first: bool,
    ) {
        let mut members: Vec<String> = references
            .iter()
            .flat_map(|reference| ctx.catalog.resolve_reference(reference))
            .map(|entry| entry.code.clone())
            .collect();
        members.sort();
        members.dedup();

        match members.as_slice() {
            [] => {}
            [only] => {
                let added = only.clone();
                state.insert(
                    CandidateCode::new(
                        added.clone(),
                        format!("added per catalog guidance on {code}"),
                        SCORE_BROAD,
                    )
                    .with_rule(self.rule_id()),
                );
                if sequence_first {
                    state.hint_lead(added.clone());
                }
                state.warn_once(format!("catalog guidance on {code}: added missing {added}"));
            }
            several => {
                state.warn_once(format!(
                    "catalog guidance on {code}: one of {} should also be coded; \
                     resolve manually",
                    several.join(", ")
                ));
            }
        }
    }
}

/// The first candidate code satisfying any of the note references, in
/// candidate order.
fn first_match(state: &CodingState, references: &[String]) -> Option<String> {
    state
        .candidates()
        .find(|c| {
            references
                .iter()
                .any(|reference| icd_catalog::reference_matches(reference, &c.code))
        })
        .map(|c| c.code.clone())
}
