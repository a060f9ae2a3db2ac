use std::collections::BTreeSet;

use icd_catalog::Catalog;
use icd_model::{
    Concept, ConceptAttributes, DialysisStatus, EpisodeOfCare, InjuryKind, SequencedCode,
};
use icd_validate::validate;

fn code(code: &str, description: &str, order: u32) -> SequencedCode {
    SequencedCode {
        code: code.to_string(),
        description: description.to_string(),
        reason: "test".to_string(),
        order,
        confidence: 0.8,
        rule_id: None,
    }
}

fn catalog() -> Catalog {
    Catalog::embedded().expect("embedded catalog")
}

fn kidney_concept(dialysis: Option<DialysisStatus>, acute_injury: bool) -> Concept {
    Concept::new(
        "kidney",
        "kidney",
        ConceptAttributes::KidneyDisease {
            stage: None,
            dialysis,
            acute_injury,
        },
    )
}

#[test]
fn clean_list_is_valid() {
    let codes = vec![
        code("E11.22", "Type 2 diabetes mellitus with diabetic chronic kidney disease", 1),
        code("N18.4", "Chronic kidney disease, stage 4 (severe)", 2),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
}

#[test]
fn duplicate_codes_fire_v01() {
    let codes = vec![
        code("I10", "Essential (primary) hypertension", 1),
        code("I10", "Essential (primary) hypertension", 2),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V01"));
}

#[test]
fn sparse_order_fires_v02() {
    let codes = vec![
        code("I10", "Essential (primary) hypertension", 1),
        code("N18.4", "Chronic kidney disease, stage 4 (severe)", 3),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V02"));
}

#[test]
fn excludes1_pair_fires_v05() {
    let codes = vec![
        code("I10", "Essential (primary) hypertension", 1),
        code(
            "I13.2",
            "Hypertensive heart and chronic kidney disease with heart failure and with stage 5 chronic kidney disease, or end stage renal disease",
            2,
        ),
        code("I50.9", "Heart failure, unspecified", 3),
        code("N18.6", "End stage renal disease", 4),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V05"));
    // The redundancy rule fires on the same list.
    assert!(report.errors.iter().any(|f| f.rule_id == "V26"));
}

#[test]
fn manifestation_principal_fires_v10() {
    let codes = vec![
        code(
            "L97.509",
            "Non-pressure chronic ulcer of other part of unspecified foot with unspecified severity",
            1,
        ),
        code("E11.621", "Type 2 diabetes mellitus with foot ulcer", 2),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V10"));
}

#[test]
fn external_cause_principal_fires_v11() {
    let codes = vec![
        code("W19.XXXA", "Unspecified fall, initial encounter", 1),
        code(
            "S62.109A",
            "Fracture of unspecified carpal bone, unspecified wrist, initial encounter for closed fracture",
            2,
        ),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V11"));
}

#[test]
fn secondary_without_primary_fires_v20() {
    let codes = vec![code("C78.00", "Secondary malignant neoplasm of unspecified lung", 1)];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V20"));

    let with_history = vec![
        code("C78.00", "Secondary malignant neoplasm of unspecified lung", 1),
        code("Z85.9", "Personal history of malignant neoplasm, unspecified", 2),
    ];
    let report = validate(&with_history, &[], &catalog());
    assert!(!report.errors.iter().any(|f| f.rule_id == "V20"));
}

#[test]
fn dialysis_support_fires_v21_without_chronic_status() {
    let codes = vec![
        code("N18.6", "End stage renal disease", 1),
        code("Z99.2", "Dependence on renal dialysis", 2),
    ];
    let concepts = vec![kidney_concept(None, false)];
    let report = validate(&codes, &concepts, &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V21"));

    let chronic = vec![kidney_concept(Some(DialysisStatus::Chronic), false)];
    let report = validate(&codes, &chronic, &catalog());
    assert!(!report.errors.iter().any(|f| f.rule_id == "V21"));
}

#[test]
fn sepsis_rules_fire_without_documentation() {
    let codes = vec![
        code("A41.9", "Sepsis, unspecified organism", 1),
        code("R65.21", "Severe sepsis with septic shock", 2),
    ];
    let report = validate(&codes, &[], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V23"));
    assert!(report.errors.iter().any(|f| f.rule_id == "V24"));

    let concepts = vec![Concept::new(
        "septic shock",
        "septic shock",
        ConceptAttributes::Sepsis {
            present: true,
            severe: true,
            septic_shock: true,
        },
    )];
    let report = validate(&codes, &concepts, &catalog());
    assert!(!report.errors.iter().any(|f| f.rule_id == "V23"));
    assert!(!report.errors.iter().any(|f| f.rule_id == "V24"));
}

#[test]
fn injury_rules_check_episode_and_cause() {
    let injury = Concept::new(
        "wrist fracture",
        "wrist fracture",
        ConceptAttributes::Injury {
            kind: InjuryKind::WristFracture,
            laterality: None,
            episode: Some(EpisodeOfCare::Initial),
            external_cause: None,
        },
    );
    // Episode character stripped: V41 fires. No external cause: V42 fires.
    let codes = vec![code(
        "S62.109",
        "Fracture of unspecified carpal bone, unspecified wrist",
        1,
    )];
    let report = validate(&codes, &[injury], &catalog());
    assert!(report.errors.iter().any(|f| f.rule_id == "V41"));
    assert!(report.warnings.iter().any(|f| f.rule_id == "V42"));
}

#[test]
fn all_firing_rules_are_reported_together() {
    let codes = vec![
        code("I10", "Essential (primary) hypertension", 1),
        code("I10", "Essential (primary) hypertension", 3),
    ];
    let report = validate(&codes, &[], &catalog());
    let ids: BTreeSet<&str> = report
        .errors
        .iter()
        .chain(report.warnings.iter())
        .map(|f| f.rule_id.as_str())
        .collect();
    // Duplicates and density both fire; no early exit.
    assert!(ids.contains("V01"));
    assert!(ids.contains("V02"));
}

#[test]
fn report_serializes_with_rule_metadata() {
    let codes = vec![code("C78.00", "Secondary malignant neoplasm of unspecified lung", 1)];
    let report = validate(&codes, &[], &catalog());
    let json = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(json["valid"], false);
    let v20 = json["errors"]
        .as_array()
        .and_then(|errors| {
            errors
                .iter()
                .find(|f| f["ruleId"] == "V20")
        })
        .expect("V20 finding");
    assert!(v20["rationale"].as_str().is_some_and(|r| !r.is_empty()));
    assert!(v20["remediation"].as_str().is_some_and(|r| !r.is_empty()));
}

#[test]
fn rules_never_mutate_the_list() {
    let codes = vec![
        code("I10", "Essential (primary) hypertension", 1),
        code("I10", "Essential (primary) hypertension", 2),
    ];
    let before = codes.clone();
    let _ = validate(&codes, &[], &catalog());
    assert_eq!(codes, before);
}
