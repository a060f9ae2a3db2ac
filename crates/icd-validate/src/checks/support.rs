//! Cross-support rules: a code must be backed by its precondition concept
//! or companion code.

use icd_model::ConceptAttributes;
use icd_model::DialysisStatus;

use crate::checks::RuleHit;
use crate::context::ValidationContext;

/// Secondary malignancy requires a primary site code or a history code.
pub fn secondary_without_primary(ctx: &ValidationContext) -> Option<RuleHit> {
    let secondaries: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| c.code.starts_with("C78") || c.code.starts_with("C79"))
        .map(|c| c.code.clone())
        .collect();
    if secondaries.is_empty() {
        return None;
    }
    let has_primary = ctx.codes.iter().any(|c| {
        c.code.starts_with('C') && !c.code.starts_with("C78") && !c.code.starts_with("C79")
    });
    let has_history = ctx.has_prefix("Z85");
    if has_primary || has_history {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "secondary malignancy without a primary or history code: {}",
            secondaries.join(", ")
        ),
        secondaries,
    ))
}

/// Z99.2 requires chronic dialysis dependence.
pub fn dialysis_code_support(ctx: &ValidationContext) -> Option<RuleHit> {
    if !ctx.has_code("Z99.2") {
        return None;
    }
    let chronic = matches!(
        ctx.kidney_attributes(),
        Some(ConceptAttributes::KidneyDisease {
            dialysis: Some(DialysisStatus::Chronic),
            ..
        })
    );
    if chronic {
        return None;
    }
    Some(RuleHit::new(
        "dialysis dependence coded without documented chronic dialysis",
        vec!["Z99.2".to_string()],
    ))
}

/// An acute kidney failure code requires a documented acute kidney injury.
pub fn aki_code_support(ctx: &ValidationContext) -> Option<RuleHit> {
    let aki_codes = ctx.codes_with_prefix("N17");
    if aki_codes.is_empty() {
        return None;
    }
    let documented = matches!(
        ctx.kidney_attributes(),
        Some(ConceptAttributes::KidneyDisease {
            acute_injury: true,
            ..
        })
    );
    if documented {
        return None;
    }
    Some(RuleHit::new(
        "acute kidney failure coded without documented acute kidney injury",
        aki_codes.iter().map(|c| c.code.clone()).collect(),
    ))
}

/// R65.2- requires severe sepsis explicitly documented.
pub fn severe_sepsis_support(ctx: &ValidationContext) -> Option<RuleHit> {
    let severe_codes = ctx.codes_with_prefix("R65.2");
    if severe_codes.is_empty() {
        return None;
    }
    let documented = matches!(
        ctx.sepsis_attributes(),
        Some(ConceptAttributes::Sepsis { severe: true, .. })
    );
    if documented {
        return None;
    }
    Some(RuleHit::new(
        "severe sepsis coded without explicit documentation",
        severe_codes.iter().map(|c| c.code.clone()).collect(),
    ))
}

/// R65.21 specifically requires septic shock.
pub fn septic_shock_support(ctx: &ValidationContext) -> Option<RuleHit> {
    if !ctx.has_code("R65.21") {
        return None;
    }
    let documented = matches!(
        ctx.sepsis_attributes(),
        Some(ConceptAttributes::Sepsis {
            septic_shock: true,
            ..
        })
    );
    if documented {
        return None;
    }
    Some(RuleHit::new(
        "septic shock coded without documented shock",
        vec!["R65.21".to_string()],
    ))
}

/// An encephalopathy code requires an encephalopathy concept.
pub fn encephalopathy_support(ctx: &ValidationContext) -> Option<RuleHit> {
    let codes = ctx.codes_with_prefix("G93.4");
    if codes.is_empty() || ctx.has_encephalopathy_concept() {
        return None;
    }
    Some(RuleHit::new(
        "encephalopathy coded without a documented encephalopathy",
        codes.iter().map(|c| c.code.clone()).collect(),
    ))
}

/// A combination code makes its components redundant.
pub fn combination_redundancy(ctx: &ValidationContext) -> Option<RuleHit> {
    let mut redundant = Vec::new();
    if ctx.has_prefix("I13") {
        for prefix in ["I10", "I11", "I12"] {
            redundant.extend(
                ctx.codes_with_prefix(prefix)
                    .iter()
                    .map(|c| c.code.clone()),
            );
        }
    } else if ctx.has_prefix("I11") || ctx.has_prefix("I12") {
        redundant.extend(ctx.codes_with_prefix("I10").iter().map(|c| c.code.clone()));
    }
    if redundant.is_empty() {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "plain hypertension codes alongside a richer combination: {}",
            redundant.join(", ")
        ),
        redundant,
    ))
}

/// Diabetes-CKD combination should be accompanied by a CKD stage code.
pub fn diabetes_ckd_stage(ctx: &ValidationContext) -> Option<RuleHit> {
    let combos: Vec<String> = ctx
        .codes
        .iter()
        .filter(|c| {
            let key = icd_catalog::normalize_code(&c.code);
            key.starts_with('E') && key.ends_with("22") && key.len() == 5
        })
        .map(|c| c.code.clone())
        .collect();
    if combos.is_empty() || ctx.has_prefix("N18") {
        return None;
    }
    Some(RuleHit::new(
        format!(
            "diabetic chronic kidney disease without a CKD stage code: {}",
            combos.join(", ")
        ),
        combos,
    ))
}

/// COPD with lower respiratory infection requires the infection coded.
pub fn copd_infection_support(ctx: &ValidationContext) -> Option<RuleHit> {
    if !ctx.has_code("J44.0") {
        return None;
    }
    let has_pneumonia = ["J13", "J14", "J15", "J18"]
        .iter()
        .any(|p| ctx.has_prefix(p));
    if has_pneumonia {
        return None;
    }
    Some(RuleHit::new(
        "COPD with lower respiratory infection but no infection code",
        vec!["J44.0".to_string()],
    ))
}

/// COPD exacerbation and infection variants are mutually exclusive.
pub fn copd_variant_conflict(ctx: &ValidationContext) -> Option<RuleHit> {
    if ctx.has_code("J44.0") && ctx.has_code("J44.1") {
        return Some(RuleHit::new(
            "COPD with infection and with exacerbation coded together",
            vec!["J44.0".to_string(), "J44.1".to_string()],
        ));
    }
    None
}

/// Severe sepsis should carry its underlying infection code.
pub fn sepsis_code_first(ctx: &ValidationContext) -> Option<RuleHit> {
    let severe_codes = ctx.codes_with_prefix("R65.2");
    if severe_codes.is_empty() || ctx.has_prefix("A41") {
        return None;
    }
    Some(RuleHit::new(
        "severe sepsis without the underlying infection code",
        severe_codes.iter().map(|c| c.code.clone()).collect(),
    ))
}

/// A specific CKD stage makes the unspecified stage code redundant.
pub fn redundant_unspecified_ckd(ctx: &ValidationContext) -> Option<RuleHit> {
    if !ctx.has_code("N18.9") {
        return None;
    }
    let specific = ctx
        .codes_with_prefix("N18")
        .iter()
        .any(|c| icd_catalog::normalize_code(&c.code) != "N189");
    if !specific {
        return None;
    }
    Some(RuleHit::new(
        "unspecified CKD stage alongside a specific stage code",
        vec!["N18.9".to_string()],
    ))
}
