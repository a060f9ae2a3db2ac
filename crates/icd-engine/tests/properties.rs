//! Pipeline-level properties: determinism, uniqueness, non-contradiction,
//! order density, and invariant closure over arbitrary narrative mixes.

use std::collections::BTreeSet;

use proptest::prelude::*;

use icd_catalog::default_catalog;
use icd_engine::code_text;
use icd_model::{ConceptAttributes, DialysisStatus, ExclusionKind, PipelineOptions};

/// Narrative fragments the generator mixes freely. None of them hard-stop
/// under the default lenient options.
const FRAGMENTS: &[&str] = &[
    "type 2 diabetes",
    "type 1 diabetes with ketoacidosis",
    "diabetic foot ulcer",
    "CKD stage 4",
    "CKD stage 5",
    "ESRD on chronic dialysis",
    "acute kidney injury",
    "hypertension",
    "chronic systolic heart failure",
    "COPD with acute exacerbation",
    "COPD with pseudomonas pneumonia",
    "severe persistent asthma with status asthmaticus",
    "metastatic lung cancer from breast primary",
    "severe sepsis",
    "septic shock",
    "metabolic encephalopathy",
    "wrist fracture after a fall",
    "peripheral polyneuropathy",
];

fn narrative() -> impl Strategy<Value = String> {
    proptest::collection::btree_set(0usize..FRAGMENTS.len(), 0..4)
        .prop_map(|picks| {
            picks
                .iter()
                .map(|i| FRAGMENTS[*i])
                .collect::<Vec<_>>()
                .join(", ")
        })
}

proptest! {
    #[test]
    fn identical_input_yields_identical_output(text in narrative()) {
        let catalog = default_catalog();
        let options = PipelineOptions::default();
        let first = code_text(&text, catalog, &options).expect("pipeline runs");
        let second = code_text(&text, catalog, &options).expect("pipeline runs");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn no_duplicate_codes_in_final_list(text in narrative()) {
        let catalog = default_catalog();
        let output = code_text(&text, catalog, &PipelineOptions::default())
            .expect("pipeline runs");
        let unique: BTreeSet<&str> = output.codes.iter().map(|c| c.code.as_str()).collect();
        prop_assert_eq!(unique.len(), output.codes.len());
    }

    #[test]
    fn no_excludes1_pair_coexists(text in narrative()) {
        let catalog = default_catalog();
        let output = code_text(&text, catalog, &PipelineOptions::default())
            .expect("pipeline runs");
        for (i, a) in output.codes.iter().enumerate() {
            for b in &output.codes[i + 1..] {
                prop_assert_ne!(
                    catalog.relation_between(&a.code, &b.code),
                    Some(ExclusionKind::Excludes1),
                    "{} and {} are Excludes1-related",
                    a.code,
                    b.code
                );
            }
        }
    }

    #[test]
    fn order_is_dense_and_confidence_bounded(text in narrative()) {
        let catalog = default_catalog();
        let output = code_text(&text, catalog, &PipelineOptions::default())
            .expect("pipeline runs");
        for (i, code) in output.codes.iter().enumerate() {
            prop_assert_eq!(code.order, i as u32 + 1);
            prop_assert!(code.confidence > 0.0 && code.confidence <= 0.99);
        }
    }

    #[test]
    fn dialysis_code_iff_chronic_dialysis(text in narrative()) {
        let catalog = default_catalog();
        let output = code_text(&text, catalog, &PipelineOptions::default())
            .expect("pipeline runs");
        let chronic = icd_extract::ConceptExtractor::new()
            .extract(&text)
            .iter()
            .any(|c| {
                matches!(
                    c.attributes,
                    ConceptAttributes::KidneyDisease {
                        dialysis: Some(DialysisStatus::Chronic),
                        ..
                    }
                )
            });
        prop_assert_eq!(output.has_code("Z99.2"), chronic);
    }
}
