//! Injury coding: default external cause and episode-of-care character.

use icd_model::{CandidateCode, ConceptAttributes, EpisodeOfCare};

use crate::generate::{SCORE_UNSPECIFIED, external_cause_code};
use crate::modules::{GuidelineModule, ModuleContext};
use crate::state::CodingState;

pub struct InjuryModule;

/// True for codes shaped like trauma/obstetric codes: the 7-character
/// S/T/O chapters that carry an episode-of-care character.
fn takes_episode_character(code: &str) -> bool {
    let normalized = icd_catalog::normalize_code(code);
    normalized.len() == 7 && matches!(normalized.chars().next(), Some('S' | 'T' | 'O'))
}

impl GuidelineModule for InjuryModule {
    fn rule_id(&self) -> &'static str {
        "injury-coding"
    }

    fn apply(&self, mut state: CodingState, _ctx: &ModuleContext<'_>) -> CodingState {
        let Some((index, ConceptAttributes::Injury {
            episode,
            external_cause,
            ..
        })) = state.injury()
        else {
            return state;
        };
        let episode = *episode;
        let documented_cause = *external_cause;

        // Every injury carries an external cause; default with a warning
        // when none is documented.
        let has_external = state
            .codes()
            .iter()
            .any(|c| matches!(c.chars().next(), Some('V' | 'W' | 'X' | 'Y')));
        if !has_external {
            let code = match documented_cause {
                Some(cause) => external_cause_code(cause),
                None => "X58.XXXA",
            };
            state.insert(
                CandidateCode::new(code, "default external cause for the injury", SCORE_UNSPECIFIED)
                    .with_origin(index)
                    .with_rule(self.rule_id()),
            );
            if documented_cause.is_none() {
                state.warn_once(
                    "injury without a documented external cause; defaulting to X58.XXXA"
                        .to_string(),
                );
            }
        }

        // Episode-of-care character, only on codes of the trauma shape.
        if let Some(episode) = episode
            && episode != EpisodeOfCare::Initial
        {
            let suffix = episode.suffix();
            for code in state.codes() {
                if !takes_episode_character(&code) || code.ends_with(suffix) {
                    continue;
                }
                if let Some(mut candidate) = state.remove(&code) {
                    let mut updated = candidate.code.clone();
                    updated.pop();
                    updated.push(suffix);
                    candidate.code = updated;
                    state.insert(candidate);
                }
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_shape_check() {
        assert!(takes_episode_character("S62.109A"));
        assert!(takes_episode_character("T14.90XA"));
        assert!(!takes_episode_character("N18.4"));
        assert!(!takes_episode_character("I13.2"));
        // External cause codes are not rewritten.
        assert!(!takes_episode_character("W19.XXXA"));
    }
}
