use icd_catalog::Catalog;
use icd_engine::generate::generate_candidates;
use icd_engine::modules::{ModuleContext, default_modules};
use icd_engine::{CodingState, code_text};
use icd_extract::ConceptExtractor;
use icd_model::PipelineOptions;

fn catalog() -> Catalog {
    Catalog::embedded().expect("embedded catalog")
}

fn state_for(text: &str) -> CodingState {
    let concepts = ConceptExtractor::new().extract(text);
    let mut state = CodingState::new(concepts);
    generate_candidates(&mut state);
    state
}

#[test]
fn diabetes_precedence_picks_ketoacidosis_over_lower_ranked() {
    let catalog = catalog();
    let output = code_text(
        "T2DM with DKA, foot ulcer and retinopathy",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");

    assert_eq!(output.codes[0].code, "E11.10", "DKA leads the precedence chain");
    assert!(output.has_code("E11.621"), "other complications keep their codes");
    assert!(output.has_code("E11.319"));
    assert!(output.has_code("L97.509"), "foot ulcer site code added");
    assert_eq!(
        output.codes[0].rule_id.as_deref(),
        Some("diabetes-primary-manifestation")
    );
}

#[test]
fn diabetes_hyperosmolar_outranks_ketoacidosis() {
    let catalog = catalog();
    let output = code_text(
        "type 1 diabetes with hyperosmolar state and ketoacidosis",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert_eq!(output.codes[0].code, "E10.00");
    assert!(output.has_code("E10.10"));
}

#[test]
fn retinopathy_maps_by_severity_edema_and_traction() {
    let catalog = catalog();
    let cases = [
        ("diabetes with mild nonproliferative retinopathy", "E11.329"),
        (
            "diabetes with moderate nonproliferative retinopathy and macular edema",
            "E11.331",
        ),
        (
            "diabetes with proliferative retinopathy and traction retinal detachment",
            "E11.352",
        ),
    ];
    for (text, expected) in cases {
        let output = code_text(text, &catalog, &PipelineOptions::default()).expect("codes");
        assert!(output.has_code(expected), "{text} should map to {expected}");
    }
}

#[test]
fn neuropathy_subtype_refines_the_diabetic_code() {
    let catalog = catalog();
    let output = code_text(
        "diabetes with autonomic neuropathy",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert!(output.has_code("E11.43"));
    assert!(!output.has_code("E11.40"));
    assert!(!output.has_code("G90.9"), "standalone code superseded");
}

#[test]
fn isolated_neuropathy_without_diabetes_uses_g_chapter() {
    let catalog = catalog();
    let output = code_text(
        "peripheral polyneuropathy",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert!(output.has_code("G62.9"));
}

#[test]
fn hypertension_with_ckd_alone_uses_the_two_way_combination() {
    let catalog = catalog();
    let output = code_text(
        "hypertension with CKD stage 3b",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert_eq!(output.codes[0].code, "I12.9");
    assert!(output.has_code("N18.32"));
    assert!(!output.has_code("I10"));
}

#[test]
fn hypertension_with_heart_failure_alone_uses_i11() {
    let catalog = catalog();
    let output = code_text(
        "hypertension and acute on chronic systolic heart failure",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert_eq!(output.codes[0].code, "I11.0");
    assert!(output.has_code("I50.23"), "2x4 heart failure lookup");
    assert!(!output.has_code("I10"));
}

#[test]
fn ckd_stage_three_splits_when_documented() {
    let catalog = catalog();
    let split = code_text("CKD stage 3a", &catalog, &PipelineOptions::default()).expect("codes");
    assert!(split.has_code("N18.31"));

    let unsplit = code_text("CKD stage 3", &catalog, &PipelineOptions::default()).expect("codes");
    assert!(unsplit.has_code("N18.30"));
}

#[test]
fn staged_ckd_never_keeps_the_unspecified_code() {
    let catalog = catalog();
    let output = code_text("CKD stage 2", &catalog, &PipelineOptions::default()).expect("codes");
    assert!(output.has_code("N18.2"));
    assert!(!output.has_code("N18.9"));
}

#[test]
fn unspecified_secondary_drops_when_site_specific_exists() {
    let catalog = catalog();
    let output = code_text(
        "widely metastatic disease with metastases to the liver",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert!(output.has_code("C78.7"));
    assert!(!output.has_code("C79.9"));
}

#[test]
fn primary_equal_to_metastatic_site_is_a_data_error() {
    let catalog = catalog();
    let output = code_text(
        "lung cancer with metastases to the lung",
        &catalog,
        &PipelineOptions::default(),
    )
    .expect("codes");
    assert!(
        output
            .errors
            .iter()
            .any(|e| e.contains("primary site lung equals a stated metastatic site"))
    );
}

#[test]
fn modules_are_idempotent_on_an_unchanged_candidate_set() {
    let catalog = catalog();
    let options = PipelineOptions::default();
    let ctx = ModuleContext {
        catalog: &catalog,
        options: &options,
    };
    let texts = [
        "Type 2 diabetes with CKD stage 4",
        "hypertension with heart failure and CKD stage 5",
        "COPD with pneumonia and acute exacerbation",
        "metastatic lung cancer from breast primary",
        "pregnant patient with type 2 diabetes",
        "wrist fracture, sequela",
    ];
    for text in texts {
        let mut state = state_for(text);
        for module in default_modules() {
            state = module.apply(state, &ctx);
        }
        let codes_once = state.codes();
        let warnings_once = state.warnings.clone();
        for module in default_modules() {
            state = module.apply(state, &ctx);
        }
        assert_eq!(state.codes(), codes_once, "candidate set changed for: {text}");
        assert_eq!(state.warnings, warnings_once, "warnings changed for: {text}");
    }
}
