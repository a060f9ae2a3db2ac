//! Structural rules: shape of the final list itself.

use std::collections::BTreeSet;

use icd_model::ExclusionKind;

use crate::checks::RuleHit;
use crate::context::ValidationContext;

/// No duplicate code values.
pub fn duplicate_codes(ctx: &ValidationContext) -> Option<RuleHit> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for code in ctx.codes {
        let key = icd_catalog::normalize_code(&code.code);
        if !seen.insert(key) {
            duplicates.insert(code.code.clone());
        }
    }
    if duplicates.is_empty() {
        return None;
    }
    let affected: Vec<String> = duplicates.into_iter().collect();
    Some(RuleHit::new(
        format!("duplicate codes in final list: {}", affected.join(", ")),
        affected,
    ))
}

/// `order` values must be exactly 1..N.
pub fn order_density(ctx: &ValidationContext) -> Option<RuleHit> {
    let mut orders: Vec<u32> = ctx.codes.iter().map(|c| c.order).collect();
    orders.sort_unstable();
    let dense = orders
        .iter()
        .enumerate()
        .all(|(i, order)| *order == i as u32 + 1);
    if dense {
        return None;
    }
    Some(RuleHit::new(
        "sequence order values are not dense starting at 1",
        ctx.codes.iter().map(|c| c.code.clone()).collect(),
    ))
}

/// Confidence must lie in (0, 0.99].
pub fn confidence_range(ctx: &ValidationContext) -> Option<RuleHit> {
    let out_of_range: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| c.confidence <= 0.0 || c.confidence > 0.99)
        .map(|c| c.code.clone())
        .collect();
    if out_of_range.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!("confidence out of range for: {}", out_of_range.join(", ")),
        out_of_range,
    ))
}

/// Concepts were extracted but nothing survived to the final list.
pub fn empty_result(ctx: &ValidationContext) -> Option<RuleHit> {
    if ctx.codes.is_empty() && !ctx.concepts.is_empty() {
        return Some(RuleHit::new(
            "documented concepts produced no codes",
            Vec::new(),
        ));
    }
    None
}

/// No Excludes1 pair may coexist.
pub fn excludes1_conflict(ctx: &ValidationContext) -> Option<RuleHit> {
    let mut conflicting = BTreeSet::new();
    for (i, a) in ctx.codes.iter().enumerate() {
        for b in &ctx.codes[i + 1..] {
            if ctx.catalog.relation_between(&a.code, &b.code) == Some(ExclusionKind::Excludes1) {
                conflicting.insert(a.code.clone());
                conflicting.insert(b.code.clone());
            }
        }
    }
    if conflicting.is_empty() {
        return None;
    }
    let affected: Vec<String> = conflicting.into_iter().collect();
    Some(RuleHit::new(
        format!(
            "mutually exclusive (Excludes1) codes coexist: {}",
            affected.join(", ")
        ),
        affected,
    ))
}

/// Every final code should exist in the reference catalog.
pub fn unknown_codes(ctx: &ValidationContext) -> Option<RuleHit> {
    let unknown: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| !ctx.catalog.contains(&c.code))
        .map(|c| c.code.clone())
        .collect();
    if unknown.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!("codes absent from the catalog: {}", unknown.join(", ")),
        unknown,
    ))
}
