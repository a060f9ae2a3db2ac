//! Documentation-quality rules.

use regex::Regex;

use crate::checks::RuleHit;
use crate::context::ValidationContext;

/// Laterality must be specified when the description admits a side.
pub fn unspecified_laterality(ctx: &ValidationContext) -> Option<RuleHit> {
    let affected: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| {
            let description = c.description.to_lowercase();
            description.contains("unspecified side")
                || description.contains("unspecified wrist")
                || description.contains("unspecified femur")
        })
        .map(|c| c.code.clone())
        .collect();
    if affected.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "laterality not documented for sided conditions: {}",
            affected.join(", ")
        ),
        affected,
    ))
}

/// Trauma codes carry a 7th character for the episode of care.
pub fn injury_episode_character(ctx: &ValidationContext) -> Option<RuleHit> {
    let short: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| {
            (c.code.starts_with('S') || c.code.starts_with('T'))
                && icd_catalog::normalize_code(&c.code).len() < 7
        })
        .map(|c| c.code.clone())
        .collect();
    if short.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!("trauma codes missing the episode character: {}", short.join(", ")),
        short,
    ))
}

/// An injury should carry an external cause code.
pub fn injury_external_cause(ctx: &ValidationContext) -> Option<RuleHit> {
    if !ctx.has_injury_concept() {
        return None;
    }
    let has_trauma_code = ctx
        .codes
        .iter()
        .any(|c| c.code.starts_with('S') || c.code.starts_with('T'));
    if !has_trauma_code {
        return None;
    }
    let has_external = ctx
        .codes
        .iter()
        .any(|c| matches!(c.code.chars().next(), Some('V' | 'W' | 'X' | 'Y')));
    if has_external {
        return None;
    }
    Some(RuleHit::new(
        "injury coded without an external cause code",
        ctx.codes
            .iter()
            .filter(|c| c.code.starts_with('S') || c.code.starts_with('T'))
            .map(|c| c.code.clone())
            .collect(),
    ))
}

/// More than half of the final codes being "unspecified" suggests the
/// documentation supports better specificity.
pub fn unspecified_density(ctx: &ValidationContext) -> Option<RuleHit> {
    if ctx.codes.len() < 2 {
        return None;
    }
    let unspecified: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| c.description.to_lowercase().contains("unspecified"))
        .map(|c| c.code.clone())
        .collect();
    if unspecified.len() * 2 <= ctx.codes.len() {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "{} of {} codes are unspecified variants",
            unspecified.len(),
            ctx.codes.len()
        ),
        unspecified,
    ))
}

/// Code shape sanity: every code should look like an ICD-10-CM code.
pub fn code_shape(ctx: &ValidationContext) -> Option<RuleHit> {
    let shape = Regex::new(r"^[A-Z]\d{2}(\.[0-9A-Z]{1,4})?$").ok()?;
    let malformed: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| !shape.is_match(&c.code))
        .map(|c| c.code.clone())
        .collect();
    if malformed.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!("codes with unexpected shape: {}", malformed.join(", ")),
        malformed,
    ))
}
