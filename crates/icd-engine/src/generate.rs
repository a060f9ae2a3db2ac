//! Candidate code generation.
//!
//! Single-concept candidates first, then the known concept-pair patterns.
//! Pairwise candidates are emitted even when a single-concept candidate for
//! the same concept exists: suppressing superseded codes is the guideline
//! modules' job, not the generator's. Scores reflect specificity only.

use tracing::debug;

use icd_model::{
    AsthmaSeverity, AsthmaStatus, CandidateCode, CkdStage, ConceptAttributes,
    DiabetesComplication, DiabetesType, DialysisStatus, ExternalCause, HeartFailureType,
    HfAcuity, InjuryKind, NeoplasmSite, NeuropathySubtype, RetinopathySeverity,
};

use crate::state::CodingState;

pub const SCORE_TRIPLE_COMBINATION: f64 = 0.95;
pub const SCORE_COMBINATION: f64 = 0.9;
pub const SCORE_SPECIFIC: f64 = 0.8;
pub const SCORE_DEFAULT: f64 = 0.7;
pub const SCORE_BROAD: f64 = 0.6;
pub const SCORE_UNSPECIFIED: f64 = 0.5;

/// Seed the state with candidates for every concept and pair pattern.
pub fn generate_candidates(state: &mut CodingState) {
    let mut out: Vec<CandidateCode> = Vec::new();

    for (index, concept) in state.concepts.iter().enumerate() {
        match &concept.attributes {
            ConceptAttributes::Diabetes {
                diabetes_type,
                complications,
                uncontrolled,
            } => diabetes_candidates(&mut out, index, *diabetes_type, complications, *uncontrolled),
            ConceptAttributes::KidneyDisease {
                stage,
                dialysis,
                acute_injury,
            } => kidney_candidates(&mut out, index, *stage, *dialysis, *acute_injury),
            ConceptAttributes::Hypertension => {
                out.push(
                    CandidateCode::new("I10", "essential hypertension", SCORE_DEFAULT)
                        .with_origin(index),
                );
            }
            ConceptAttributes::HeartFailure {
                failure_type,
                acuity,
            } => {
                let code = heart_failure_code(*failure_type, *acuity);
                let score = if code == "I50.9" {
                    SCORE_UNSPECIFIED
                } else {
                    SCORE_SPECIFIC
                };
                out.push(
                    CandidateCode::new(code, "heart failure by type and acuity", score)
                        .with_origin(index),
                );
            }
            ConceptAttributes::Copd {
                exacerbation,
                lower_respiratory_infection,
                ..
            } => {
                if *lower_respiratory_infection {
                    out.push(
                        CandidateCode::new(
                            "J44.0",
                            "COPD with acute lower respiratory infection",
                            SCORE_SPECIFIC,
                        )
                        .with_origin(index),
                    );
                }
                if *exacerbation {
                    out.push(
                        CandidateCode::new("J44.1", "COPD with acute exacerbation", SCORE_SPECIFIC)
                            .with_origin(index),
                    );
                }
                if !*lower_respiratory_infection && !*exacerbation {
                    out.push(
                        CandidateCode::new("J44.9", "COPD, unspecified", SCORE_UNSPECIFIED)
                            .with_origin(index),
                    );
                }
            }
            ConceptAttributes::Asthma { severity, .. } => {
                // The plain severity code; the respiratory module swaps in
                // the status variant when one is documented.
                let code = asthma_code(*severity, AsthmaStatus::Uncomplicated);
                let score = if *severity == AsthmaSeverity::Unspecified {
                    SCORE_UNSPECIFIED
                } else {
                    SCORE_SPECIFIC
                };
                out.push(
                    CandidateCode::new(code, "asthma by severity", score).with_origin(index),
                );
            }
            ConceptAttributes::Neoplasm {
                primary_site,
                secondary_sites,
                unspecified_secondary,
                history_of_malignancy,
            } => {
                for site in secondary_sites {
                    out.push(
                        CandidateCode::new(
                            secondary_site_code(*site),
                            format!("secondary malignant neoplasm of {site}"),
                            SCORE_SPECIFIC,
                        )
                        .with_origin(index),
                    );
                }
                if *unspecified_secondary {
                    out.push(
                        CandidateCode::new(
                            "C79.9",
                            "secondary malignant neoplasm, site unspecified",
                            SCORE_UNSPECIFIED,
                        )
                        .with_origin(index),
                    );
                }
                if let Some(site) = primary_site {
                    out.push(
                        CandidateCode::new(
                            primary_site_code(*site),
                            format!("primary malignant neoplasm of {site}"),
                            SCORE_DEFAULT,
                        )
                        .with_origin(index),
                    );
                }
                if *history_of_malignancy {
                    out.push(
                        CandidateCode::new(
                            "Z85.9",
                            "personal history of malignant neoplasm",
                            SCORE_BROAD,
                        )
                        .with_origin(index),
                    );
                }
            }
            ConceptAttributes::Pregnancy { .. } => {
                out.push(
                    CandidateCode::new("Z33.1", "pregnant state, incidental", SCORE_BROAD)
                        .with_origin(index),
                );
            }
            ConceptAttributes::Injury {
                kind,
                external_cause,
                ..
            } => {
                let (code, score) = injury_code(*kind);
                out.push(CandidateCode::new(code, "documented injury", score).with_origin(index));
                if let Some(cause) = external_cause {
                    out.push(
                        CandidateCode::new(
                            external_cause_code(*cause),
                            "documented external cause",
                            SCORE_BROAD,
                        )
                        .with_origin(index),
                    );
                }
            }
            ConceptAttributes::Neuropathy { subtype } => {
                let (code, score) = isolated_neuropathy_code(*subtype);
                out.push(
                    CandidateCode::new(code, "neuropathy without diabetes", score)
                        .with_origin(index),
                );
            }
            ConceptAttributes::Sepsis {
                present,
                severe,
                septic_shock,
            } => {
                if *present {
                    out.push(
                        CandidateCode::new("A41.9", "sepsis, organism unspecified", SCORE_DEFAULT)
                            .with_origin(index),
                    );
                }
                if *septic_shock {
                    out.push(
                        CandidateCode::new("R65.21", "severe sepsis with septic shock", SCORE_COMBINATION)
                            .with_origin(index),
                    );
                } else if *severe {
                    out.push(
                        CandidateCode::new(
                            "R65.20",
                            "severe sepsis without septic shock",
                            SCORE_SPECIFIC,
                        )
                        .with_origin(index),
                    );
                }
            }
            ConceptAttributes::Encephalopathy { metabolic } => {
                let (code, score) = if *metabolic {
                    ("G93.41", SCORE_SPECIFIC)
                } else {
                    ("G93.40", SCORE_UNSPECIFIED)
                };
                out.push(CandidateCode::new(code, "encephalopathy", score).with_origin(index));
            }
            ConceptAttributes::Other { .. } => {}
        }
    }

    pair_candidates(state, &mut out);

    debug!(candidates = out.len(), "candidate generation complete");
    for candidate in out {
        state.insert(candidate);
    }
}

/// Known concept-pair patterns: diabetes+CKD and the cardio-renal family.
fn pair_candidates(state: &CodingState, out: &mut Vec<CandidateCode>) {
    let kidney = state.kidney();
    let chronic_kidney = kidney.filter(|(_, a)| kidney_is_chronic(a));

    if let (Some((d_idx, ConceptAttributes::Diabetes { diabetes_type, .. })), Some((k_idx, _))) =
        (state.diabetes(), chronic_kidney)
    {
        out.push(
            CandidateCode::new(
                format!("{}.22", diabetes_prefix(*diabetes_type)),
                "diabetes with chronic kidney disease",
                SCORE_COMBINATION,
            )
            .with_origin(d_idx)
            .with_origin(k_idx)
            .with_rule("diabetes-ckd-combination"),
        );
    }

    let htn = state.hypertension();
    let hf = state.heart_failure();
    let stage_five = chronic_kidney.is_some_and(|(_, a)| {
        matches!(
            a,
            ConceptAttributes::KidneyDisease { stage: Some(s), .. } if s.is_stage_five_or_esrd()
        )
    });

    match (htn, hf, chronic_kidney) {
        (Some((h_idx, _)), Some((f_idx, _)), Some((k_idx, _))) => {
            let code = if stage_five { "I13.2" } else { "I13.0" };
            out.push(
                CandidateCode::new(
                    code,
                    "hypertensive heart and chronic kidney disease with heart failure",
                    SCORE_TRIPLE_COMBINATION,
                )
                .with_origin(h_idx)
                .with_origin(f_idx)
                .with_origin(k_idx)
                .with_rule("hypertension-heart-ckd-combination"),
            );
            // The two-way combinations are still emitted; the cardio-renal
            // module removes whichever the richer code supersedes.
            out.push(two_way_hf(h_idx, f_idx));
            out.push(two_way_ckd(h_idx, k_idx, stage_five));
        }
        (Some((h_idx, _)), Some((f_idx, _)), None) => out.push(two_way_hf(h_idx, f_idx)),
        (Some((h_idx, _)), None, Some((k_idx, _))) => {
            out.push(two_way_ckd(h_idx, k_idx, stage_five));
        }
        _ => {}
    }
}

fn two_way_hf(h_idx: usize, f_idx: usize) -> CandidateCode {
    CandidateCode::new(
        "I11.0",
        "hypertensive heart disease with heart failure",
        SCORE_COMBINATION,
    )
    .with_origin(h_idx)
    .with_origin(f_idx)
    .with_rule("hypertension-heart-failure-combination")
}

fn two_way_ckd(h_idx: usize, k_idx: usize, stage_five: bool) -> CandidateCode {
    let code = if stage_five { "I12.0" } else { "I12.9" };
    CandidateCode::new(
        code,
        "hypertensive chronic kidney disease",
        SCORE_COMBINATION,
    )
    .with_origin(h_idx)
    .with_origin(k_idx)
    .with_rule("hypertension-ckd-combination")
}

/// Chronic kidney involvement, as opposed to an isolated acute injury.
pub fn kidney_is_chronic(attrs: &ConceptAttributes) -> bool {
    match attrs {
        ConceptAttributes::KidneyDisease {
            stage,
            dialysis,
            acute_injury,
        } => stage.is_some() || dialysis.is_some() || !*acute_injury,
        _ => false,
    }
}

pub fn diabetes_prefix(diabetes_type: DiabetesType) -> &'static str {
    match diabetes_type {
        DiabetesType::Type1 => "E10",
        DiabetesType::Type2 | DiabetesType::Unspecified => "E11",
    }
}

fn diabetes_candidates(
    out: &mut Vec<CandidateCode>,
    index: usize,
    diabetes_type: DiabetesType,
    complications: &std::collections::BTreeSet<DiabetesComplication>,
    uncontrolled: bool,
) {
    let prefix = diabetes_prefix(diabetes_type);

    if complications.is_empty() && !uncontrolled {
        out.push(
            CandidateCode::new(
                format!("{prefix}.9"),
                "diabetes without documented complications",
                SCORE_BROAD,
            )
            .with_origin(index),
        );
        return;
    }

    if uncontrolled
        && !complications
            .iter()
            .any(|c| matches!(c, DiabetesComplication::Hyperglycemia))
    {
        out.push(
            CandidateCode::new(
                format!("{prefix}.65"),
                "uncontrolled diabetes coded as hyperglycemia",
                SCORE_DEFAULT,
            )
            .with_origin(index),
        );
    }

    for complication in complications {
        let (suffix, score, reason) = complication_suffix(complication);
        out.push(
            CandidateCode::new(format!("{prefix}{suffix}"), reason, score).with_origin(index),
        );
        if matches!(complication, DiabetesComplication::FootUlcer) {
            out.push(
                CandidateCode::new(
                    "L97.509",
                    "site code for the diabetic foot ulcer",
                    SCORE_DEFAULT,
                )
                .with_origin(index),
            );
        }
    }
}

pub(crate) fn complication_suffix(
    complication: &DiabetesComplication,
) -> (String, f64, &'static str) {
    match complication {
        DiabetesComplication::HyperosmolarState => {
            (".00".to_string(), SCORE_SPECIFIC, "diabetes with hyperosmolarity")
        }
        DiabetesComplication::Ketoacidosis => {
            (".10".to_string(), SCORE_SPECIFIC, "diabetes with ketoacidosis")
        }
        DiabetesComplication::Hypoglycemia => {
            (".649".to_string(), SCORE_SPECIFIC, "diabetes with hypoglycemia")
        }
        DiabetesComplication::Hyperglycemia => {
            (".65".to_string(), SCORE_SPECIFIC, "diabetes with hyperglycemia")
        }
        DiabetesComplication::FootUlcer => {
            (".621".to_string(), SCORE_SPECIFIC, "diabetes with foot ulcer")
        }
        DiabetesComplication::PeripheralAngiopathy { gangrene: false } => (
            ".51".to_string(),
            SCORE_SPECIFIC,
            "diabetes with peripheral angiopathy",
        ),
        DiabetesComplication::PeripheralAngiopathy { gangrene: true } => (
            ".52".to_string(),
            SCORE_SPECIFIC,
            "diabetes with peripheral angiopathy and gangrene",
        ),
        DiabetesComplication::CharcotJoint => (
            ".610".to_string(),
            SCORE_SPECIFIC,
            "diabetes with neuropathic arthropathy",
        ),
        DiabetesComplication::Retinopathy {
            severity,
            macular_edema,
            traction_detachment,
        } => (
            retinopathy_suffix(*severity, *macular_edema, *traction_detachment).to_string(),
            SCORE_SPECIFIC,
            "diabetes with retinopathy",
        ),
        DiabetesComplication::Nephropathy => {
            (".21".to_string(), SCORE_SPECIFIC, "diabetes with nephropathy")
        }
        DiabetesComplication::Neuropathy(subtype) => {
            let (suffix, score) = match subtype {
                NeuropathySubtype::Mononeuropathy => (".41", SCORE_SPECIFIC),
                NeuropathySubtype::Polyneuropathy => (".42", SCORE_SPECIFIC),
                NeuropathySubtype::Autonomic => (".43", SCORE_SPECIFIC),
                NeuropathySubtype::Amyotrophy => (".44", SCORE_SPECIFIC),
                NeuropathySubtype::Unspecified => (".40", SCORE_BROAD),
            };
            (suffix.to_string(), score, "diabetes with neuropathy")
        }
        DiabetesComplication::Cataract => {
            (".36".to_string(), SCORE_SPECIFIC, "diabetes with cataract")
        }
    }
}

fn retinopathy_suffix(
    severity: RetinopathySeverity,
    macular_edema: bool,
    traction_detachment: bool,
) -> &'static str {
    match (severity, macular_edema) {
        (RetinopathySeverity::Proliferative, _) if traction_detachment => ".352",
        (RetinopathySeverity::Proliferative, true) => ".351",
        (RetinopathySeverity::Proliferative, false) => ".359",
        (RetinopathySeverity::Severe, true) => ".341",
        (RetinopathySeverity::Severe, false) => ".349",
        (RetinopathySeverity::Moderate, true) => ".331",
        (RetinopathySeverity::Moderate, false) => ".339",
        (RetinopathySeverity::Mild, true) => ".321",
        (RetinopathySeverity::Mild, false) => ".329",
        (RetinopathySeverity::Unspecified, true) => ".311",
        (RetinopathySeverity::Unspecified, false) => ".319",
    }
}

fn kidney_candidates(
    out: &mut Vec<CandidateCode>,
    index: usize,
    stage: Option<CkdStage>,
    dialysis: Option<DialysisStatus>,
    acute_injury: bool,
) {
    if acute_injury {
        out.push(
            CandidateCode::new("N17.9", "acute kidney injury", SCORE_SPECIFIC).with_origin(index),
        );
    }
    let chronic = stage.is_some() || dialysis.is_some() || !acute_injury;
    if chronic {
        match stage {
            Some(stage) => out.push(
                CandidateCode::new(ckd_stage_code(stage), "CKD by documented stage", SCORE_SPECIFIC)
                    .with_origin(index),
            ),
            None => out.push(
                CandidateCode::new("N18.9", "CKD, stage not documented", SCORE_UNSPECIFIED)
                    .with_origin(index),
            ),
        }
    }
    if dialysis == Some(DialysisStatus::Chronic) {
        out.push(
            CandidateCode::new("Z99.2", "dependence on renal dialysis", SCORE_BROAD)
                .with_origin(index),
        );
    }
}

pub fn ckd_stage_code(stage: CkdStage) -> &'static str {
    match stage {
        CkdStage::One => "N18.1",
        CkdStage::Two => "N18.2",
        CkdStage::Three => "N18.30",
        CkdStage::ThreeA => "N18.31",
        CkdStage::ThreeB => "N18.32",
        CkdStage::Four => "N18.4",
        CkdStage::Five => "N18.5",
        CkdStage::EndStage => "N18.6",
    }
}

/// The 2×4 heart failure lookup: type × acuity.
pub fn heart_failure_code(failure_type: HeartFailureType, acuity: HfAcuity) -> &'static str {
    match (failure_type, acuity) {
        (HeartFailureType::Systolic, HfAcuity::Unspecified) => "I50.20",
        (HeartFailureType::Systolic, HfAcuity::Acute) => "I50.21",
        (HeartFailureType::Systolic, HfAcuity::Chronic) => "I50.22",
        (HeartFailureType::Systolic, HfAcuity::AcuteOnChronic) => "I50.23",
        (HeartFailureType::Diastolic, HfAcuity::Unspecified) => "I50.30",
        (HeartFailureType::Diastolic, HfAcuity::Acute) => "I50.31",
        (HeartFailureType::Diastolic, HfAcuity::Chronic) => "I50.32",
        (HeartFailureType::Diastolic, HfAcuity::AcuteOnChronic) => "I50.33",
        (HeartFailureType::Combined, HfAcuity::Unspecified) => "I50.40",
        (HeartFailureType::Combined, HfAcuity::Acute) => "I50.41",
        (HeartFailureType::Combined, HfAcuity::Chronic) => "I50.42",
        (HeartFailureType::Combined, HfAcuity::AcuteOnChronic) => "I50.43",
        (HeartFailureType::Unspecified, _) => "I50.9",
    }
}

/// The severity × status asthma lookup.
pub fn asthma_code(severity: AsthmaSeverity, status: AsthmaStatus) -> &'static str {
    match (severity, status) {
        (AsthmaSeverity::MildIntermittent, AsthmaStatus::Uncomplicated) => "J45.20",
        (AsthmaSeverity::MildIntermittent, AsthmaStatus::Exacerbation) => "J45.21",
        (AsthmaSeverity::MildIntermittent, AsthmaStatus::StatusAsthmaticus) => "J45.22",
        (AsthmaSeverity::MildPersistent, AsthmaStatus::Uncomplicated) => "J45.30",
        (AsthmaSeverity::MildPersistent, AsthmaStatus::Exacerbation) => "J45.31",
        (AsthmaSeverity::MildPersistent, AsthmaStatus::StatusAsthmaticus) => "J45.32",
        (AsthmaSeverity::ModeratePersistent, AsthmaStatus::Uncomplicated) => "J45.40",
        (AsthmaSeverity::ModeratePersistent, AsthmaStatus::Exacerbation) => "J45.41",
        (AsthmaSeverity::ModeratePersistent, AsthmaStatus::StatusAsthmaticus) => "J45.42",
        (AsthmaSeverity::SeverePersistent, AsthmaStatus::Uncomplicated) => "J45.50",
        (AsthmaSeverity::SeverePersistent, AsthmaStatus::Exacerbation) => "J45.51",
        (AsthmaSeverity::SeverePersistent, AsthmaStatus::StatusAsthmaticus) => "J45.52",
        (AsthmaSeverity::Unspecified, AsthmaStatus::Uncomplicated) => "J45.909",
        (AsthmaSeverity::Unspecified, AsthmaStatus::Exacerbation) => "J45.901",
        (AsthmaSeverity::Unspecified, AsthmaStatus::StatusAsthmaticus) => "J45.902",
    }
}

pub fn secondary_site_code(site: NeoplasmSite) -> &'static str {
    match site {
        NeoplasmSite::Lung => "C78.00",
        NeoplasmSite::Colon => "C78.5",
        NeoplasmSite::Liver => "C78.7",
        NeoplasmSite::Pancreas => "C78.89",
        NeoplasmSite::Brain => "C79.31",
        NeoplasmSite::Bone => "C79.51",
        NeoplasmSite::Breast => "C79.81",
        NeoplasmSite::Prostate => "C79.82",
    }
}

pub fn primary_site_code(site: NeoplasmSite) -> &'static str {
    match site {
        NeoplasmSite::Lung => "C34.90",
        NeoplasmSite::Breast => "C50.919",
        NeoplasmSite::Colon => "C18.9",
        NeoplasmSite::Prostate => "C61",
        NeoplasmSite::Pancreas => "C25.9",
        NeoplasmSite::Liver => "C22.9",
        NeoplasmSite::Bone => "C41.9",
        NeoplasmSite::Brain => "C71.9",
    }
}

fn injury_code(kind: InjuryKind) -> (&'static str, f64) {
    match kind {
        InjuryKind::WristFracture => ("S62.109A", SCORE_SPECIFIC),
        InjuryKind::AnkleFracture => ("S82.899A", SCORE_SPECIFIC),
        InjuryKind::FemurFracture => ("S72.90XA", SCORE_SPECIFIC),
        InjuryKind::HeadInjury => ("S09.90XA", SCORE_DEFAULT),
        InjuryKind::Laceration => ("T14.8XXA", SCORE_BROAD),
        InjuryKind::Unspecified => ("T14.90XA", SCORE_UNSPECIFIED),
    }
}

pub fn external_cause_code(cause: ExternalCause) -> &'static str {
    match cause {
        ExternalCause::Fall => "W19.XXXA",
        ExternalCause::StruckByObject => "W22.8XXA",
        ExternalCause::MotorVehicle => "V89.2XXA",
    }
}

fn isolated_neuropathy_code(subtype: NeuropathySubtype) -> (&'static str, f64) {
    match subtype {
        NeuropathySubtype::Mononeuropathy => ("G58.9", SCORE_DEFAULT),
        NeuropathySubtype::Polyneuropathy => ("G62.9", SCORE_DEFAULT),
        NeuropathySubtype::Autonomic => ("G90.9", SCORE_DEFAULT),
        NeuropathySubtype::Amyotrophy => ("G54.5", SCORE_DEFAULT),
        NeuropathySubtype::Unspecified => ("G62.9", SCORE_UNSPECIFIED),
    }
}
