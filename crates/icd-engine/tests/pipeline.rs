use anyhow::Result;
use icd_catalog::Catalog;
use icd_engine::{CodingPipeline, code_text};
use icd_model::{AttributeStrictness, CodingError, PipelineOptions};

fn catalog() -> Catalog {
    Catalog::embedded().expect("embedded catalog")
}

#[test]
fn diabetes_with_ckd_stage_four() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "Type 2 diabetes with CKD stage 4",
        &catalog,
        &PipelineOptions::default(),
    )?;

    let first = output.codes.first().expect("at least one code");
    assert_eq!(first.code, "E11.22");
    assert_eq!(first.order, 1);
    assert!(output.has_code("N18.4"));
    assert!(!output.has_code("E11.9"), "no without-complication code");
    Ok(())
}

#[test]
fn hypertension_heart_failure_ckd_stage_five() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "hypertension with heart failure and CKD stage 5",
        &catalog,
        &PipelineOptions::default(),
    )?;

    assert_eq!(output.codes[0].code, "I13.2");
    assert!(output.has_code("I50.9"), "heart failure type code present");
    assert!(output.has_code("N18.5"), "stage code present");
    assert!(!output.has_code("I10"), "plain hypertension removed");
    assert!(!output.has_code("I11.0"));
    assert!(!output.has_code("I12.0"));
    Ok(())
}

#[test]
fn copd_with_exacerbation_only() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "COPD with acute exacerbation",
        &catalog,
        &PipelineOptions::default(),
    )?;

    let respiratory: Vec<_> = output
        .codes
        .iter()
        .filter(|c| c.code.starts_with('J'))
        .collect();
    assert_eq!(respiratory.len(), 1);
    assert_eq!(respiratory[0].code, "J44.1");
    Ok(())
}

#[test]
fn metastatic_lung_from_breast_primary() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "metastatic lung cancer from breast primary",
        &catalog,
        &PipelineOptions::default(),
    )?;

    assert_eq!(output.codes[0].code, "C78.00", "secondary sequences first");
    assert_eq!(output.codes[1].code, "C50.919", "primary follows");
    Ok(())
}

#[test]
fn structured_septic_shock_with_sepsis() -> Result<()> {
    let catalog = catalog();
    let pipeline = CodingPipeline::new(&catalog);
    let output = pipeline.code_structured("Sepsis: Yes\nSeptic Shock: Yes\n")?;

    assert!(output.output.has_code("R65.21"));
    assert!(output.output.has_code("A41.9"));
    // Code-first guidance sequences the infection ahead of the shock code.
    assert_eq!(output.output.codes[0].code, "A41.9");
    assert!(output.validation_errors.is_empty());
    Ok(())
}

#[test]
fn structured_shock_without_sepsis_hard_stops() {
    let catalog = catalog();
    let pipeline = CodingPipeline::new(&catalog);
    let err = pipeline
        .code_structured("Septic Shock: Yes\n")
        .expect_err("hard stop");
    assert!(matches!(err, CodingError::MissingAttribute { .. }));
    assert!(err.to_string().contains("septic shock"));
}

#[test]
fn structured_ckd_without_stage_hard_stops() {
    let catalog = catalog();
    let pipeline = CodingPipeline::new(&catalog);
    let err = pipeline
        .code_structured("CKD: Yes\n")
        .expect_err("hard stop");
    assert!(matches!(
        err,
        CodingError::MissingAttribute { ref attribute, .. } if attribute == "stage"
    ));
}

#[test]
fn free_text_ckd_without_stage_degrades_with_warning() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "chronic kidney disease",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("N18.9"));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.contains("without a stage"))
    );

    // The same narrative under strict options hard-stops instead.
    let err = code_text(
        "chronic kidney disease",
        &catalog,
        &PipelineOptions::default().with_strictness(AttributeStrictness::Strict),
    )
    .expect_err("strict hard stop");
    assert!(matches!(err, CodingError::MissingAttribute { .. }));
    Ok(())
}

#[test]
fn malformed_structured_input_never_codes() {
    let catalog = catalog();
    let pipeline = CodingPipeline::new(&catalog);
    let err = pipeline
        .code_structured("this line has no separator\n")
        .expect_err("parse error");
    assert!(matches!(err, CodingError::Parse { line: 1, .. }));
}

#[test]
fn copd_infection_without_organism_defaults_with_warning() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "COPD with pneumonia",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("J44.0"));
    assert!(output.has_code("J18.9"));
    assert!(!output.has_code("J44.1"));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.contains("defaulting to unspecified-organism"))
    );
    Ok(())
}

#[test]
fn copd_infection_with_named_organism() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "COPD with pseudomonas pneumonia",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("J44.0"));
    assert!(output.has_code("J15.1"));
    assert!(!output.has_code("J18.9"));
    Ok(())
}

#[test]
fn copd_exacerbation_and_infection_resolves_to_infection() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "COPD with acute exacerbation and pneumonia",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("J44.0"));
    assert!(!output.has_code("J44.1"), "infection wins");
    Ok(())
}

#[test]
fn asthma_status_asthmaticus_overrides_severity_code() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "severe persistent asthma with status asthmaticus",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("J45.52"));
    assert!(!output.has_code("J45.50"));
    Ok(())
}

#[test]
fn pregnancy_overrides_diabetes_and_hypertension() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "pregnant patient with type 2 diabetes and hypertension",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("O24.919"));
    assert!(output.has_code("O10.919"));
    assert!(!output.has_code("E11.9"));
    assert!(!output.has_code("I10"));
    assert!(!output.has_code("Z33.1"), "pregnancy is not incidental here");
    Ok(())
}

#[test]
fn incidental_pregnancy_keeps_z_code() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "pregnant, left wrist fracture after a fall",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("Z33.1"));
    assert!(output.has_code("S62.109A"));
    assert!(output.has_code("W19.XXXA"));
    Ok(())
}

#[test]
fn injury_without_cause_gets_default_external_cause() -> Result<()> {
    let catalog = catalog();
    let output = code_text("femur fracture", &catalog, &PipelineOptions::default())?;
    assert!(output.has_code("S72.90XA"));
    assert!(output.has_code("X58.XXXA"));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.contains("defaulting to X58.XXXA"))
    );
    Ok(())
}

#[test]
fn episode_suffix_attaches_only_to_trauma_codes() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "wrist fracture after a fall, sequela, with hypertension",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(output.has_code("S62.109S"));
    assert!(output.has_code("I10"), "non-trauma code untouched");
    assert!(output.has_code("W19.XXXA"), "external cause untouched");
    Ok(())
}

#[test]
fn dialysis_dependence_tracks_chronic_status() -> Result<()> {
    let catalog = catalog();
    let chronic = code_text(
        "ESRD on chronic dialysis",
        &catalog,
        &PipelineOptions::default(),
    )?;
    assert!(chronic.has_code("Z99.2"));
    assert!(chronic.has_code("N18.6"));

    let without = code_text("ESRD", &catalog, &PipelineOptions::default())?;
    assert!(!without.has_code("Z99.2"));
    Ok(())
}

#[test]
fn structured_output_splits_primary_and_secondary() -> Result<()> {
    let catalog = catalog();
    let pipeline = CodingPipeline::new(&catalog);
    let output = pipeline.code_structured(
        "Diabetes: Type 2\nCKD Stage: 4\nProcedures: hemoglobin a1c\n",
    )?;
    let primary = output.primary.expect("primary code");
    assert_eq!(primary.code, "E11.22");
    assert!(output.secondary.iter().any(|c| c.code == "N18.4"));
    assert_eq!(output.procedures, vec!["hemoglobin a1c"]);
    Ok(())
}

#[test]
fn output_serializes_to_the_external_contract() -> Result<()> {
    let catalog = catalog();
    let output = code_text(
        "Type 2 diabetes with CKD stage 4",
        &catalog,
        &PipelineOptions::default(),
    )?;
    let json = serde_json::to_value(&output)?;
    assert!(json["codes"].is_array());
    assert_eq!(json["codes"][0]["code"], "E11.22");
    assert_eq!(json["codes"][0]["order"], 1);
    assert!(json["codes"][0]["confidence"].as_f64().is_some());
    Ok(())
}
