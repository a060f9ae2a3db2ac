//! Free-text concept extraction.
//!
//! Each supported domain has an independent deterministic detector that
//! emits at most one [`Concept`] per type. Attributes aggregate every match
//! for that type (all documented diabetes complications, all metastatic
//! sites), not just the first. Detectors never guess: an attribute that
//! cannot be read from the text stays unset.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use icd_model::{
    AsthmaSeverity, AsthmaStatus, CkdStage, Concept, ConceptAttributes, DiabetesComplication,
    DiabetesType, DialysisStatus, EpisodeOfCare, ExternalCause, HeartFailureType, HfAcuity,
    InjuryKind, Laterality, NeoplasmSite, NeuropathySubtype, Organism, RetinopathySeverity,
};

use crate::normalize::normalize;

/// Extracts typed concepts from clinical narrative.
#[derive(Debug, Default)]
pub struct ConceptExtractor;

impl ConceptExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all concepts from free text. Detector order is fixed so the
    /// output is deterministic for a given input.
    pub fn extract(&self, text: &str) -> Vec<Concept> {
        let raw = text.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        let norm = normalize(raw);

        let mut attributes = Vec::new();
        attributes.extend(detect_diabetes(&norm));
        attributes.extend(detect_kidney_disease(&norm));
        attributes.extend(detect_hypertension(&norm));
        attributes.extend(detect_heart_failure(&norm));
        attributes.extend(detect_copd(&norm));
        attributes.extend(detect_asthma(&norm));
        attributes.extend(detect_neoplasm(&norm));
        attributes.extend(detect_pregnancy(&norm));
        attributes.extend(detect_injury(&norm));
        let has_diabetes = attributes
            .iter()
            .any(|a| matches!(a, ConceptAttributes::Diabetes { .. }));
        if !has_diabetes {
            attributes.extend(detect_isolated_neuropathy(&norm));
        }
        attributes.extend(detect_sepsis(&norm));
        attributes.extend(detect_encephalopathy(&norm));

        debug!(concepts = attributes.len(), "extraction complete");
        attributes
            .into_iter()
            .map(|attrs| Concept::new(raw, norm.clone(), attrs))
            .collect()
    }
}

fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern)
        .map(|r| r.is_match(text))
        .unwrap_or(false)
}

fn capture_group(pattern: &str, text: &str, group: usize) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?
        .get(group)
        .map(|m| m.as_str().to_string())
}

fn detect_diabetes(norm: &str) -> Option<ConceptAttributes> {
    if !norm.contains("diabet") {
        return None;
    }
    let diabetes_type = if matches(r"\btype (?:2|ii)\b", norm) {
        DiabetesType::Type2
    } else if matches(r"\btype (?:1|i)\b", norm) {
        DiabetesType::Type1
    } else {
        DiabetesType::Unspecified
    };
    let uncontrolled = norm.contains("uncontrolled") || norm.contains("poorly controlled");

    let mut complications = BTreeSet::new();
    if norm.contains("hyperosmolar") {
        complications.insert(DiabetesComplication::HyperosmolarState);
    }
    if norm.contains("ketoacidosis") {
        complications.insert(DiabetesComplication::Ketoacidosis);
    }
    if norm.contains("hypoglycemia") {
        complications.insert(DiabetesComplication::Hypoglycemia);
    }
    if norm.contains("hyperglycemia") {
        complications.insert(DiabetesComplication::Hyperglycemia);
    }
    if norm.contains("foot ulcer") || (norm.contains("ulcer") && norm.contains("foot")) {
        complications.insert(DiabetesComplication::FootUlcer);
    }
    if norm.contains("peripheral angiopathy") || norm.contains("peripheral vascular disease") {
        complications.insert(DiabetesComplication::PeripheralAngiopathy {
            gangrene: norm.contains("gangrene"),
        });
    }
    if norm.contains("charcot") {
        complications.insert(DiabetesComplication::CharcotJoint);
    }
    if norm.contains("retinopathy") {
        complications.insert(DiabetesComplication::Retinopathy {
            severity: retinopathy_severity(norm),
            macular_edema: norm.contains("macular edema"),
            traction_detachment: norm.contains("traction"),
        });
    }
    if norm.contains("nephropathy") {
        complications.insert(DiabetesComplication::Nephropathy);
    }
    if norm.contains("neuropath") || norm.contains("amyotrophy") {
        complications.insert(DiabetesComplication::Neuropathy(neuropathy_subtype(norm)));
    }
    if norm.contains("cataract") {
        complications.insert(DiabetesComplication::Cataract);
    }

    Some(ConceptAttributes::Diabetes {
        diabetes_type,
        complications,
        uncontrolled,
    })
}

fn retinopathy_severity(norm: &str) -> RetinopathySeverity {
    if let Some(grade) = capture_group(r"(mild|moderate|severe)\s+nonproliferative", norm, 1) {
        return match grade.as_str() {
            "mild" => RetinopathySeverity::Mild,
            "moderate" => RetinopathySeverity::Moderate,
            _ => RetinopathySeverity::Severe,
        };
    }
    if norm.contains("proliferative") && !norm.contains("nonproliferative") {
        return RetinopathySeverity::Proliferative;
    }
    if let Some(grade) = capture_group(
        r"(mild|moderate|severe)\s+(?:diabetic\s+)?retinopathy",
        norm,
        1,
    ) {
        return match grade.as_str() {
            "mild" => RetinopathySeverity::Mild,
            "moderate" => RetinopathySeverity::Moderate,
            _ => RetinopathySeverity::Severe,
        };
    }
    RetinopathySeverity::Unspecified
}

fn neuropathy_subtype(norm: &str) -> NeuropathySubtype {
    if norm.contains("mononeuropathy") {
        NeuropathySubtype::Mononeuropathy
    } else if norm.contains("polyneuropathy") {
        NeuropathySubtype::Polyneuropathy
    } else if norm.contains("autonomic") {
        NeuropathySubtype::Autonomic
    } else if norm.contains("amyotrophy") {
        NeuropathySubtype::Amyotrophy
    } else {
        NeuropathySubtype::Unspecified
    }
}

fn detect_kidney_disease(norm: &str) -> Option<ConceptAttributes> {
    let chronic = norm.contains("chronic kidney disease") || norm.contains("kidney failure");
    let end_stage = norm.contains("end stage");
    let acute_injury =
        norm.contains("acute kidney injury") || norm.contains("acute kidney failure");
    let dialysis = dialysis_status(norm);
    if !chronic && !end_stage && !acute_injury && dialysis.is_none() {
        return None;
    }

    let stage = if end_stage {
        Some(CkdStage::EndStage)
    } else {
        ckd_stage(norm)
    };

    Some(ConceptAttributes::KidneyDisease {
        stage,
        dialysis,
        acute_injury,
    })
}

fn ckd_stage(norm: &str) -> Option<CkdStage> {
    // Stage qualifiers are only read next to the kidney-disease mention so a
    // neoplasm stage ("stage 4 lung cancer") is never mistaken for CKD.
    let patterns = [
        r"chronic kidney disease\W{0,3}stage\s*([1-5])\s*(a|b)?\b",
        r"stage\s*([1-5])\s*(a|b)?\s+chronic kidney disease",
    ];
    for pattern in patterns {
        let Some(re) = Regex::new(pattern).ok() else {
            continue;
        };
        if let Some(caps) = re.captures(norm) {
            let digit = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let split = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            return match (digit, split) {
                ("1", _) => Some(CkdStage::One),
                ("2", _) => Some(CkdStage::Two),
                ("3", "a") => Some(CkdStage::ThreeA),
                ("3", "b") => Some(CkdStage::ThreeB),
                ("3", _) => Some(CkdStage::Three),
                ("4", _) => Some(CkdStage::Four),
                ("5", _) => Some(CkdStage::Five),
                _ => None,
            };
        }
    }
    None
}

fn dialysis_status(norm: &str) -> Option<DialysisStatus> {
    if norm.contains("acute dialysis") || norm.contains("temporary dialysis") {
        return Some(DialysisStatus::Acute);
    }
    let chronic_markers = [
        "chronic dialysis",
        "dialysis dependent",
        "dialysis dependence",
        "dependence on dialysis",
        "hemodialysis",
    ];
    if chronic_markers.iter().any(|m| norm.contains(m)) {
        return Some(DialysisStatus::Chronic);
    }
    // A bare "dialysis" mention is left unset rather than guessed.
    None
}

fn detect_hypertension(norm: &str) -> Option<ConceptAttributes> {
    (norm.contains("hypertension") || norm.contains("hypertensive"))
        .then_some(ConceptAttributes::Hypertension)
}

fn detect_heart_failure(norm: &str) -> Option<ConceptAttributes> {
    if !norm.contains("heart failure") {
        return None;
    }
    let failure_type = if norm.contains("systolic") && norm.contains("diastolic") {
        HeartFailureType::Combined
    } else if norm.contains("systolic") {
        HeartFailureType::Systolic
    } else if norm.contains("diastolic") {
        HeartFailureType::Diastolic
    } else {
        HeartFailureType::Unspecified
    };
    // Acuity is only read from qualifiers directly modifying the heart
    // failure mention; "acute" elsewhere in the note does not count.
    let acuity = match capture_group(
        r"(acute on chronic|acute|chronic|decompensated)\s+(?:systolic\s+|diastolic\s+|combined\s+|congestive\s+)*heart failure",
        norm,
        1,
    )
    .as_deref()
    {
        Some("acute on chronic") => HfAcuity::AcuteOnChronic,
        Some("acute") | Some("decompensated") => HfAcuity::Acute,
        Some("chronic") => HfAcuity::Chronic,
        _ => HfAcuity::Unspecified,
    };
    Some(ConceptAttributes::HeartFailure {
        failure_type,
        acuity,
    })
}

fn detect_copd(norm: &str) -> Option<ConceptAttributes> {
    if !norm.contains("chronic obstructive") {
        return None;
    }
    let lower_respiratory_infection = norm.contains("pneumonia")
        || norm.contains("lower respiratory infection")
        || norm.contains("respiratory infection")
        || norm.contains("acute bronchitis");
    Some(ConceptAttributes::Copd {
        exacerbation: norm.contains("exacerbation"),
        lower_respiratory_infection,
        organism: detect_organism(norm),
    })
}

fn detect_organism(norm: &str) -> Option<Organism> {
    let table: [(&str, Organism); 7] = [
        ("pseudomonas", Organism::Pseudomonas),
        ("klebsiella", Organism::Klebsiella),
        ("staphylococ", Organism::Staphylococcus),
        ("streptococ", Organism::Streptococcus),
        ("haemophilus", Organism::Haemophilus),
        ("hemophilus", Organism::Haemophilus),
        ("coli", Organism::EscherichiaColi),
    ];
    table
        .iter()
        .find(|(marker, _)| norm.contains(marker))
        .map(|(_, organism)| *organism)
}

fn detect_asthma(norm: &str) -> Option<ConceptAttributes> {
    if !norm.contains("asthma") {
        return None;
    }
    let severity = match capture_group(
        r"(mild intermittent|mild persistent|moderate persistent|severe persistent)",
        norm,
        1,
    )
    .as_deref()
    {
        Some("mild intermittent") => AsthmaSeverity::MildIntermittent,
        Some("mild persistent") => AsthmaSeverity::MildPersistent,
        Some("moderate persistent") => AsthmaSeverity::ModeratePersistent,
        Some("severe persistent") => AsthmaSeverity::SeverePersistent,
        _ => AsthmaSeverity::Unspecified,
    };
    let status = if norm.contains("status asthmaticus") {
        AsthmaStatus::StatusAsthmaticus
    } else if norm.contains("exacerbation") {
        AsthmaStatus::Exacerbation
    } else {
        AsthmaStatus::Uncomplicated
    };
    Some(ConceptAttributes::Asthma { severity, status })
}

const NEOPLASM_SITES: [(&str, NeoplasmSite); 9] = [
    ("lung", NeoplasmSite::Lung),
    ("breast", NeoplasmSite::Breast),
    ("colon", NeoplasmSite::Colon),
    ("colorectal", NeoplasmSite::Colon),
    ("prostate", NeoplasmSite::Prostate),
    ("pancrea", NeoplasmSite::Pancreas),
    ("liver", NeoplasmSite::Liver),
    ("bone", NeoplasmSite::Bone),
    ("brain", NeoplasmSite::Brain),
];

fn detect_neoplasm(norm: &str) -> Option<ConceptAttributes> {
    let triggered = ["cancer", "carcinoma", "malignan", "neoplasm", "metasta", "tumor"]
        .iter()
        .any(|t| norm.contains(t));
    if !triggered {
        return None;
    }

    let mut primary_site = None;
    let mut secondary_sites = BTreeSet::new();
    let mut history_of_malignancy =
        norm.contains("history of cancer") || norm.contains("history of malignancy");

    for (keyword, site) in NEOPLASM_SITES {
        if !norm.contains(keyword) {
            continue;
        }
        if matches(
            &format!(r"history of (?:\w+\s+)?{keyword}\w*\s+(?:cancer|carcinoma)"),
            norm,
        ) {
            history_of_malignancy = true;
            continue;
        }
        let secondary = matches(&format!(r"metastatic\s+{keyword}"), norm)
            || matches(
                &format!(r"(?:metastas\w*|spread|mets)\s+to\s+(?:the\s+)?{keyword}"),
                norm,
            )
            || matches(&format!(r"{keyword}\s+metastas"), norm);
        if secondary {
            secondary_sites.insert(site);
        }
        // A site can be primary and metastatic at once ("lung cancer with
        // metastases to the lung"); the sequencing module flags that as a
        // data error, so both roles are recorded here.
        let primary = matches(&format!(r"{keyword}\w*\s+primary"), norm)
            || matches(&format!(r"primary\s+{keyword}"), norm)
            || plain_cancer_mention(norm, keyword)
            || matches(&format!(r"(?:cancer|carcinoma) of the {keyword}"), norm);
        if primary && primary_site.is_none() {
            primary_site = Some(site);
        }
    }

    let unspecified_secondary = secondary_sites.is_empty()
        && (norm.contains("metasta") || norm.contains("carcinomatosis"));

    Some(ConceptAttributes::Neoplasm {
        primary_site,
        secondary_sites,
        unspecified_secondary,
        history_of_malignancy,
    })
}

/// A "<site> cancer" mention not qualified by "metastatic". The regex crate
/// has no lookbehind, so the qualifier is an optional capture checked per
/// match.
fn plain_cancer_mention(norm: &str, keyword: &str) -> bool {
    let Ok(re) = Regex::new(&format!(
        r"(?:(metastatic)\s+)?{keyword}\w*\s+(?:cancer|carcinoma|tumor|malignancy)"
    )) else {
        return false;
    };
    re.captures_iter(norm).any(|caps| caps.get(1).is_none())
}

fn detect_pregnancy(norm: &str) -> Option<ConceptAttributes> {
    if !norm.contains("pregnan") && !norm.contains("gestation") {
        return None;
    }
    let weeks = capture_group(r"(\d{1,2})\s*weeks", norm, 1).and_then(|w| w.parse().ok());
    Some(ConceptAttributes::Pregnancy {
        weeks,
        gestational_diabetes: norm.contains("gestational diabetes"),
    })
}

fn detect_injury(norm: &str) -> Option<ConceptAttributes> {
    // Mask the nephrology phrase so "acute kidney injury" alone never
    // produces an injury concept.
    let masked = norm.replace("kidney injury", "kidney");
    let kind = if masked.contains("fracture") {
        if masked.contains("wrist") || masked.contains("carpal") {
            InjuryKind::WristFracture
        } else if masked.contains("ankle") || masked.contains("lower leg") {
            InjuryKind::AnkleFracture
        } else if masked.contains("femur") || masked.contains("femoral") {
            InjuryKind::FemurFracture
        } else {
            InjuryKind::Unspecified
        }
    } else if masked.contains("head injury") || masked.contains("head trauma") {
        InjuryKind::HeadInjury
    } else if masked.contains("laceration") {
        InjuryKind::Laceration
    } else if masked.contains("injury") || masked.contains("trauma") {
        InjuryKind::Unspecified
    } else {
        return None;
    };

    let laterality = if masked.contains("bilateral") {
        Some(Laterality::Bilateral)
    } else if matches(r"\bleft\b", &masked) {
        Some(Laterality::Left)
    } else if matches(r"\bright\b", &masked) {
        Some(Laterality::Right)
    } else {
        None
    };

    let episode = if masked.contains("sequela") {
        Some(EpisodeOfCare::Sequela)
    } else if masked.contains("subsequent encounter")
        || masked.contains("follow-up")
        || masked.contains("followup")
    {
        Some(EpisodeOfCare::Subsequent)
    } else if masked.contains("initial encounter") {
        Some(EpisodeOfCare::Initial)
    } else {
        None
    };

    let external_cause = if masked.contains("fall") || masked.contains("fell") {
        Some(ExternalCause::Fall)
    } else if masked.contains("struck") {
        Some(ExternalCause::StruckByObject)
    } else if masked.contains("motor vehicle") || masked.contains("car accident") {
        Some(ExternalCause::MotorVehicle)
    } else {
        None
    };

    Some(ConceptAttributes::Injury {
        kind,
        laterality,
        episode,
        external_cause,
    })
}

fn detect_isolated_neuropathy(norm: &str) -> Option<ConceptAttributes> {
    (norm.contains("neuropath") || norm.contains("amyotrophy")).then(|| {
        ConceptAttributes::Neuropathy {
            subtype: neuropathy_subtype(norm),
        }
    })
}

fn detect_sepsis(norm: &str) -> Option<ConceptAttributes> {
    let septic_shock = norm.contains("septic shock");
    let present = norm.contains("sepsis") || norm.contains("septicemia") || septic_shock;
    if !present {
        return None;
    }
    Some(ConceptAttributes::Sepsis {
        present: true,
        severe: norm.contains("severe sepsis") || septic_shock,
        septic_shock,
    })
}

fn detect_encephalopathy(norm: &str) -> Option<ConceptAttributes> {
    norm.contains("encephalopathy")
        .then_some(ConceptAttributes::Encephalopathy {
            metabolic: norm.contains("metabolic"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use icd_model::ConceptType;

    fn extract(text: &str) -> Vec<Concept> {
        ConceptExtractor::new().extract(text)
    }

    fn attributes_of(concepts: &[Concept], ty: ConceptType) -> Option<&ConceptAttributes> {
        concepts
            .iter()
            .find(|c| c.concept_type() == ty)
            .map(|c| &c.attributes)
    }

    #[test]
    fn empty_text_yields_no_concepts() {
        assert!(extract("").is_empty());
        assert!(extract("   ").is_empty());
    }

    #[test]
    fn diabetes_aggregates_every_complication() {
        let concepts = extract("T2DM with nephropathy, foot ulcer and mild nonproliferative diabetic retinopathy");
        let Some(ConceptAttributes::Diabetes {
            diabetes_type,
            complications,
            ..
        }) = attributes_of(&concepts, ConceptType::Diabetes)
        else {
            panic!("expected diabetes concept");
        };
        assert_eq!(*diabetes_type, DiabetesType::Type2);
        assert_eq!(complications.len(), 3);
        assert!(complications.contains(&DiabetesComplication::FootUlcer));
        assert!(complications.contains(&DiabetesComplication::Nephropathy));
        assert!(complications.contains(&DiabetesComplication::Retinopathy {
            severity: RetinopathySeverity::Mild,
            macular_edema: false,
            traction_detachment: false,
        }));
    }

    #[test]
    fn ckd_stage_is_scoped_to_kidney_mention() {
        let concepts = extract("stage 4 lung cancer, chronic kidney disease");
        let Some(ConceptAttributes::KidneyDisease { stage, .. }) =
            attributes_of(&concepts, ConceptType::KidneyDisease)
        else {
            panic!("expected kidney concept");
        };
        assert_eq!(*stage, None);

        let staged = extract("CKD stage 3b");
        let Some(ConceptAttributes::KidneyDisease { stage, .. }) =
            attributes_of(&staged, ConceptType::KidneyDisease)
        else {
            panic!("expected kidney concept");
        };
        assert_eq!(*stage, Some(CkdStage::ThreeB));
    }

    #[test]
    fn esrd_maps_to_end_stage() {
        let concepts = extract("ESRD on hemodialysis");
        let Some(ConceptAttributes::KidneyDisease {
            stage, dialysis, ..
        }) = attributes_of(&concepts, ConceptType::KidneyDisease)
        else {
            panic!("expected kidney concept");
        };
        assert_eq!(*stage, Some(CkdStage::EndStage));
        assert_eq!(*dialysis, Some(DialysisStatus::Chronic));
    }

    #[test]
    fn heart_failure_acuity_requires_adjacent_qualifier() {
        let concepts = extract("acute kidney injury and chronic systolic heart failure");
        let Some(ConceptAttributes::HeartFailure {
            failure_type,
            acuity,
        }) = attributes_of(&concepts, ConceptType::HeartFailure)
        else {
            panic!("expected heart failure concept");
        };
        assert_eq!(*failure_type, HeartFailureType::Systolic);
        assert_eq!(*acuity, HfAcuity::Chronic);
    }

    #[test]
    fn aki_does_not_create_injury_concept() {
        let concepts = extract("acute kidney injury");
        assert!(attributes_of(&concepts, ConceptType::Injury).is_none());
        assert!(attributes_of(&concepts, ConceptType::KidneyDisease).is_some());
    }

    #[test]
    fn metastatic_sites_and_primary_are_separated() {
        let concepts = extract("metastatic lung cancer from breast primary");
        let Some(ConceptAttributes::Neoplasm {
            primary_site,
            secondary_sites,
            unspecified_secondary,
            ..
        }) = attributes_of(&concepts, ConceptType::Neoplasm)
        else {
            panic!("expected neoplasm concept");
        };
        assert_eq!(*primary_site, Some(NeoplasmSite::Breast));
        assert!(secondary_sites.contains(&NeoplasmSite::Lung));
        assert!(!unspecified_secondary);
    }

    #[test]
    fn neuropathy_is_diabetic_when_diabetes_present() {
        let with_dm = extract("diabetes with peripheral neuropathy");
        assert!(attributes_of(&with_dm, ConceptType::Neuropathy).is_none());
        let Some(ConceptAttributes::Diabetes { complications, .. }) =
            attributes_of(&with_dm, ConceptType::Diabetes)
        else {
            panic!("expected diabetes concept");
        };
        assert!(
            complications
                .iter()
                .any(|c| matches!(c, DiabetesComplication::Neuropathy(_)))
        );

        let isolated = extract("peripheral polyneuropathy");
        let Some(ConceptAttributes::Neuropathy { subtype }) =
            attributes_of(&isolated, ConceptType::Neuropathy)
        else {
            panic!("expected isolated neuropathy concept");
        };
        assert_eq!(*subtype, NeuropathySubtype::Polyneuropathy);
    }

    #[test]
    fn septic_shock_implies_sepsis_in_free_text() {
        let concepts = extract("patient in septic shock");
        let Some(ConceptAttributes::Sepsis {
            present,
            severe,
            septic_shock,
        }) = attributes_of(&concepts, ConceptType::Sepsis)
        else {
            panic!("expected sepsis concept");
        };
        assert!(*present && *severe && *septic_shock);
    }

    #[test]
    fn injury_reads_episode_and_cause() {
        let concepts = extract("left wrist fracture after a fall, initial encounter");
        let Some(ConceptAttributes::Injury {
            kind,
            laterality,
            episode,
            external_cause,
        }) = attributes_of(&concepts, ConceptType::Injury)
        else {
            panic!("expected injury concept");
        };
        assert_eq!(*kind, InjuryKind::WristFracture);
        assert_eq!(*laterality, Some(Laterality::Left));
        assert_eq!(*episode, Some(EpisodeOfCare::Initial));
        assert_eq!(*external_cause, Some(ExternalCause::Fall));
    }
}
