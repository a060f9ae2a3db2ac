use icd_extract::{ConceptExtractor, normalize, parse_structured};
use icd_model::{
    CkdStage, ConceptAttributes, ConceptType, DiabetesComplication, DiabetesType, HfAcuity,
    HeartFailureType, Organism,
};

fn concept_types(text: &str) -> Vec<ConceptType> {
    ConceptExtractor::new()
        .extract(text)
        .iter()
        .map(|c| c.concept_type())
        .collect()
}

#[test]
fn extraction_is_deterministic() {
    let extractor = ConceptExtractor::new();
    let text = "T2DM with CKD stage 4, HTN, CHF, and severe sepsis";
    let a = extractor.extract(text);
    let b = extractor.extract(text);
    assert_eq!(a, b);
}

#[test]
fn multiple_concept_types_coexist() {
    let types = concept_types("hypertension with heart failure and CKD stage 5");
    assert!(types.contains(&ConceptType::Hypertension));
    assert!(types.contains(&ConceptType::HeartFailure));
    assert!(types.contains(&ConceptType::KidneyDisease));
}

#[test]
fn at_most_one_concept_per_type() {
    let types = concept_types("diabetes, diabetic nephropathy, diabetes mellitus again");
    let diabetes_count = types
        .iter()
        .filter(|t| **t == ConceptType::Diabetes)
        .count();
    assert_eq!(diabetes_count, 1);
}

#[test]
fn abbreviations_reach_the_detectors() {
    let concepts = ConceptExtractor::new().extract("DKA in T1DM");
    let diabetes = concepts
        .iter()
        .find(|c| c.concept_type() == ConceptType::Diabetes)
        .expect("diabetes concept");
    let ConceptAttributes::Diabetes {
        diabetes_type,
        complications,
        ..
    } = &diabetes.attributes
    else {
        panic!("wrong attributes");
    };
    assert_eq!(*diabetes_type, DiabetesType::Type1);
    assert!(complications.contains(&DiabetesComplication::Ketoacidosis));
}

#[test]
fn normalized_text_is_recorded_on_the_concept() {
    let concepts = ConceptExtractor::new().extract("HTN");
    assert_eq!(concepts.len(), 1);
    assert_eq!(concepts[0].raw_text, "HTN");
    assert_eq!(concepts[0].normalized_text, normalize("HTN"));
}

#[test]
fn structured_and_free_text_share_the_concept_contract() {
    let structured = parse_structured(
        "Diabetes: Type 2\nCKD Stage: 4\n",
    )
    .expect("parses");
    let free = ConceptExtractor::new().extract("Type 2 diabetes with CKD stage 4");

    let s_kidney = structured
        .concepts
        .iter()
        .find(|c| c.concept_type() == ConceptType::KidneyDisease)
        .expect("structured kidney");
    let f_kidney = free
        .iter()
        .find(|c| c.concept_type() == ConceptType::KidneyDisease)
        .expect("free-text kidney");
    let (
        ConceptAttributes::KidneyDisease { stage: s_stage, .. },
        ConceptAttributes::KidneyDisease { stage: f_stage, .. },
    ) = (&s_kidney.attributes, &f_kidney.attributes)
    else {
        panic!("wrong attributes");
    };
    assert_eq!(s_stage, f_stage);
    assert_eq!(*s_stage, Some(CkdStage::Four));
}

#[test]
fn structured_heart_failure_parses_type_and_acuity() {
    let parsed = parse_structured("Heart Failure: acute on chronic diastolic\n").expect("parses");
    let hf = parsed
        .concepts
        .iter()
        .find(|c| c.concept_type() == ConceptType::HeartFailure)
        .expect("heart failure concept");
    let ConceptAttributes::HeartFailure {
        failure_type,
        acuity,
    } = &hf.attributes
    else {
        panic!("wrong attributes");
    };
    assert_eq!(*failure_type, HeartFailureType::Diastolic);
    assert_eq!(*acuity, HfAcuity::AcuteOnChronic);
}

#[test]
fn structured_organism_field_overrides_narrative() {
    let parsed = parse_structured(
        "COPD: with infection\nOrganism: Pseudomonas aeruginosa\n",
    )
    .expect("parses");
    let copd = parsed
        .concepts
        .iter()
        .find(|c| c.concept_type() == ConceptType::Copd)
        .expect("copd concept");
    let ConceptAttributes::Copd { organism, .. } = &copd.attributes else {
        panic!("wrong attributes");
    };
    assert_eq!(*organism, Some(Organism::Pseudomonas));
}

#[test]
fn undetectable_attributes_stay_unset() {
    let concepts = ConceptExtractor::new().extract("chronic kidney disease");
    let kidney = concepts
        .iter()
        .find(|c| c.concept_type() == ConceptType::KidneyDisease)
        .expect("kidney concept");
    let ConceptAttributes::KidneyDisease {
        stage, dialysis, ..
    } = &kidney.attributes
    else {
        panic!("wrong attributes");
    };
    assert!(stage.is_none());
    assert!(dialysis.is_none());
}
