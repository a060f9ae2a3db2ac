//! Principal-code eligibility rules.

use crate::checks::RuleHit;
use crate::context::ValidationContext;

/// Code families that only ever describe a manifestation of another
/// condition and may not be sequenced first.
const MANIFESTATION_PREFIXES: &[&str] = &["L97", "R65.2"];

/// External cause chapter prefixes.
const EXTERNAL_CAUSE_PREFIXES: &[&str] = &["V", "W", "X", "Y"];

/// Status/history Z codes that should not lead a claim.
const STATUS_Z_PREFIXES: &[&str] = &["Z33", "Z85", "Z99"];

/// A manifestation code can never be principal.
pub fn manifestation_principal(ctx: &ValidationContext) -> Option<RuleHit> {
    let principal = ctx.principal()?;
    let is_manifestation = MANIFESTATION_PREFIXES
        .iter()
        .any(|p| icd_catalog::reference_matches(p, &principal.code));
    if !is_manifestation {
        return None;
    }
    Some(RuleHit::new(
        format!("manifestation code {} is sequenced first", principal.code),
        vec![principal.code.clone()],
    ))
}

/// An external-cause code can never be principal.
pub fn external_cause_principal(ctx: &ValidationContext) -> Option<RuleHit> {
    let principal = ctx.principal()?;
    let is_external = EXTERNAL_CAUSE_PREFIXES
        .iter()
        .any(|p| principal.code.starts_with(p));
    if !is_external {
        return None;
    }
    Some(RuleHit::new(
        format!("external cause code {} is sequenced first", principal.code),
        vec![principal.code.clone()],
    ))
}

/// A status or history Z code leading the list deserves review.
pub fn status_code_principal(ctx: &ValidationContext) -> Option<RuleHit> {
    if ctx.codes.len() < 2 {
        return None;
    }
    let principal = ctx.principal()?;
    let is_status = STATUS_Z_PREFIXES
        .iter()
        .any(|p| icd_catalog::reference_matches(p, &principal.code));
    if !is_status {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "status code {} is sequenced ahead of active conditions",
            principal.code
        ),
        vec![principal.code.clone()],
    ))
}
