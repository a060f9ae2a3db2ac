//! Excludes1/Excludes2 conflict resolution.
//!
//! For each Excludes1 pair present in the candidate set a single survivor
//! is chosen by a fully deterministic total order; the loser is removed
//! with an explanatory message. Excludes2 pairs only attach advisory
//! notes. If resolution would empty the set, the single highest-ranked
//! original candidate is retained.

use std::cmp::Ordering;

use icd_catalog::Catalog;
use icd_model::{CandidateCode, ExclusionKind};
use tracing::debug;

use crate::state::CodingState;

/// Resolve all exclusion relations among current candidates.
pub fn resolve_exclusions(mut state: CodingState, catalog: &Catalog) -> CodingState {
    let originals: Vec<CandidateCode> = state.candidates().cloned().collect();
    let diabetes_context = state.diabetes().is_some();

    let codes = state.codes();
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            if !state.contains(a) || !state.contains(b) {
                continue;
            }
            match catalog.relation_between(a, b) {
                Some(ExclusionKind::Excludes1) => {
                    let (Some(ca), Some(cb)) = (state.get(a).cloned(), state.get(b).cloned())
                    else {
                        continue;
                    };
                    let (survivor, loser) = pick_survivor(&ca, &cb, diabetes_context);
                    state.remove_with_message(
                        &loser,
                        format!("removed {loser}: Excludes1 relation with {survivor}"),
                    );
                    debug!(%survivor, %loser, "Excludes1 resolved");
                }
                Some(ExclusionKind::Excludes2) => {
                    let note_a = format!("Excludes2: distinct from {b}");
                    let note_b = format!("Excludes2: distinct from {a}");
                    attach_advisory(&mut state, a, note_a);
                    attach_advisory(&mut state, b, note_b);
                }
                None => {}
            }
        }
    }

    // Resolution never empties the set: the best original is retained.
    if state.is_empty()
        && let Some(best) = originals.into_iter().max_by(|x, y| {
            x.base_score
                .partial_cmp(&y.base_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| y.code.cmp(&x.code))
        })
    {
        state.warn(format!(
            "all candidates conflicted; retaining the highest-ranked {}",
            best.code
        ));
        state.insert(best);
    }

    state
}

/// The deterministic total order for Excludes1 survival:
/// specificity, then domain priority, then base score, then code order.
fn pick_survivor(
    ca: &CandidateCode,
    cb: &CandidateCode,
    diabetes_context: bool,
) -> (String, String) {
    let ordering = ca
        .specificity()
        .cmp(&cb.specificity())
        .then_with(|| {
            let pa = domain_priority(&ca.code, diabetes_context);
            let pb = domain_priority(&cb.code, diabetes_context);
            pa.cmp(&pb)
        })
        .then_with(|| {
            ca.base_score
                .partial_cmp(&cb.base_score)
                .unwrap_or(Ordering::Equal)
        })
        // Lexicographically smaller code wins, so reverse the comparison.
        .then_with(|| cb.code.cmp(&ca.code));

    if ordering == Ordering::Less {
        (cb.code.clone(), ca.code.clone())
    } else {
        (ca.code.clone(), cb.code.clone())
    }
}

/// Domain priority: under a diabetes context, diabetes-chapter codes
/// outrank unrelated codes. Other domains contribute nothing, so the
/// order falls through to score.
fn domain_priority(code: &str, diabetes_context: bool) -> u8 {
    if diabetes_context && is_diabetes_chapter(code) {
        return 1;
    }
    0
}

fn is_diabetes_chapter(code: &str) -> bool {
    matches!(
        icd_catalog::normalize_code(code).get(..3),
        Some("E08" | "E09" | "E10" | "E11" | "E13")
    )
}

fn attach_advisory(state: &mut CodingState, code: &str, note: String) {
    if let Some(candidate) = state.get_mut(code)
        && !candidate.advisories.contains(&note)
    {
        candidate.advisories.push(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icd_catalog::Catalog;

    fn catalog() -> Catalog {
        Catalog::embedded().expect("embedded catalog")
    }

    #[test]
    fn excludes1_keeps_the_more_specific_code() {
        let mut state = CodingState::new(vec![]);
        state.insert(CandidateCode::new("I10", "hypertension", 0.7));
        state.insert(CandidateCode::new("I13.2", "triple combination", 0.95));
        let resolved = resolve_exclusions(state, &catalog());
        assert!(resolved.contains("I13.2"));
        assert!(!resolved.contains("I10"));
        assert!(
            resolved
                .warnings
                .iter()
                .any(|w| w.contains("Excludes1 relation with I13.2"))
        );
    }

    #[test]
    fn excludes2_attaches_advisories_without_removal() {
        let mut state = CodingState::new(vec![]);
        state.insert(CandidateCode::new("J44.9", "COPD", 0.5));
        state.insert(CandidateCode::new("J45.909", "asthma", 0.5));
        let resolved = resolve_exclusions(state, &catalog());
        assert!(resolved.contains("J44.9"));
        assert!(resolved.contains("J45.909"));
        let copd = resolved.get("J44.9").expect("COPD candidate");
        assert!(copd.advisories.iter().any(|n| n.contains("J45.909")));
    }

    #[test]
    fn equal_specificity_breaks_on_score_then_code() {
        let mut state = CodingState::new(vec![]);
        state.insert(CandidateCode::new("N18.5", "stage 5", 0.8));
        state.insert(CandidateCode::new("N18.6", "ESRD", 0.8));
        let resolved = resolve_exclusions(state, &catalog());
        // Same specificity, no domain priority, equal score: smaller code.
        assert!(resolved.contains("N18.5"));
        assert!(!resolved.contains("N18.6"));
    }

    #[test]
    fn resolution_is_deterministic() {
        for _ in 0..5 {
            let mut state = CodingState::new(vec![]);
            state.insert(CandidateCode::new("I10", "hypertension", 0.7));
            state.insert(CandidateCode::new("I12.9", "combination", 0.9));
            let resolved = resolve_exclusions(state, &catalog());
            assert_eq!(resolved.codes(), vec!["I12.9".to_string()]);
        }
    }
}
