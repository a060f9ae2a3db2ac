//! Structured "Field: Value" front-end.
//!
//! Parses a line-oriented block into the same [`Concept`] contract the
//! free-text extractor produces, plus a pass-through procedure list. Parsing
//! is all-or-nothing: any malformed line, unknown field, or un-parsable
//! value aborts with a structural error and the pipeline never runs.

use std::collections::BTreeSet;

use serde::Serialize;

use icd_model::{
    AsthmaStatus, CkdStage, Concept, ConceptAttributes, DiabetesComplication, DiabetesType,
    DialysisStatus, EpisodeOfCare, ExternalCause, HeartFailureType, HfAcuity, NeuropathySubtype,
    Organism, RetinopathySeverity,
};

use crate::concepts::ConceptExtractor;
use crate::error::ExtractError;
use crate::normalize::normalize;

/// Result of parsing one structured block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedNote {
    pub concepts: Vec<Concept>,
    pub procedures: Vec<String>,
}

/// Field accumulator; concepts are assembled once the whole block parsed.
#[derive(Debug, Default)]
struct NoteBuilder {
    narrative: Vec<String>,
    diabetes_type: Option<DiabetesType>,
    complications: BTreeSet<DiabetesComplication>,
    ckd: bool,
    ckd_stage: Option<CkdStage>,
    dialysis: Option<DialysisStatus>,
    aki: bool,
    hypertension: bool,
    heart_failure: Option<(HeartFailureType, HfAcuity)>,
    copd: Option<(bool, bool)>,
    organism: Option<Organism>,
    asthma: Option<AsthmaStatus>,
    sepsis: bool,
    severe_sepsis: bool,
    septic_shock: bool,
    encephalopathy: Option<bool>,
    pregnant: bool,
    pregnancy_weeks: Option<u8>,
    episode: Option<EpisodeOfCare>,
    external_cause: Option<ExternalCause>,
    procedures: Vec<String>,
}

/// Parse a structured block into concepts and procedures.
pub fn parse_structured(block: &str) -> Result<ParsedNote, ExtractError> {
    let mut builder = NoteBuilder::default();

    for (index, raw_line) in block.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            return Err(ExtractError::MalformedLine {
                line: line_no,
                content: line.to_string(),
            });
        };
        let field_key = field.trim().to_lowercase();
        let value = value.trim();
        apply_field(&mut builder, &field_key, value, line_no)?;
    }

    Ok(builder.build())
}

fn apply_field(
    builder: &mut NoteBuilder,
    field: &str,
    value: &str,
    line: usize,
) -> Result<(), ExtractError> {
    match field {
        "diagnosis" | "primary diagnosis" | "secondary diagnosis" | "history" => {
            builder.narrative.push(value.to_string());
        }
        "diabetes" => {
            let lowered = value.to_lowercase();
            builder.diabetes_type = if lowered == "no" || lowered == "n" {
                None
            } else {
                Some(parse_diabetes_type(value, line)?)
            };
        }
        "complications" => {
            for part in split_values(value) {
                builder
                    .complications
                    .insert(parse_complication(&part, line)?);
            }
        }
        "ckd" => {
            builder.ckd = parse_yes_no(value, field, line)?;
        }
        "ckd stage" => {
            builder.ckd = true;
            builder.ckd_stage = Some(parse_ckd_stage(value, line)?);
        }
        "dialysis" => {
            builder.dialysis = parse_dialysis(value, line)?;
        }
        "acute kidney injury" | "aki" => {
            builder.aki = parse_yes_no(value, field, line)?;
        }
        "hypertension" => {
            builder.hypertension = parse_yes_no(value, field, line)?;
        }
        "heart failure" => {
            let lowered = value.to_lowercase();
            builder.heart_failure = if lowered == "no" || lowered == "n" || lowered == "none" {
                None
            } else {
                Some(parse_heart_failure(value))
            };
        }
        "copd" => {
            let lowered = value.to_lowercase();
            if lowered == "no" || lowered == "n" {
                builder.copd = None;
            } else {
                let exacerbation = lowered.contains("exacerbation");
                let infection =
                    lowered.contains("infection") || lowered.contains("pneumonia");
                builder.copd = Some((exacerbation, infection));
            }
        }
        "organism" => {
            builder.organism = Some(parse_organism(value, line)?);
        }
        "asthma" => {
            let lowered = value.to_lowercase();
            builder.asthma = Some(if lowered.contains("status asthmaticus") {
                AsthmaStatus::StatusAsthmaticus
            } else if lowered.contains("exacerbation") {
                AsthmaStatus::Exacerbation
            } else {
                AsthmaStatus::Uncomplicated
            });
            // Severity phrasing rides along as narrative for the extractor.
            builder.narrative.push(format!("{value} asthma"));
        }
        "sepsis" => {
            builder.sepsis = parse_yes_no(value, field, line)?;
        }
        "severe sepsis" => {
            builder.severe_sepsis = parse_yes_no(value, field, line)?;
        }
        "septic shock" => {
            builder.septic_shock = parse_yes_no(value, field, line)?;
        }
        "encephalopathy" => {
            let lowered = value.to_lowercase();
            builder.encephalopathy = match lowered.as_str() {
                "no" | "n" => None,
                "metabolic" => Some(true),
                "yes" | "y" => Some(false),
                _ => {
                    return Err(ExtractError::InvalidValue {
                        line,
                        field: field.to_string(),
                        value: value.to_string(),
                    });
                }
            };
        }
        "pregnancy" | "pregnant" => {
            let lowered = value.to_lowercase();
            if let Ok(weeks) = lowered.trim_end_matches(" weeks").trim().parse::<u8>() {
                builder.pregnant = true;
                builder.pregnancy_weeks = Some(weeks);
            } else {
                builder.pregnant = parse_yes_no(value, field, line)?;
            }
        }
        "injury" => {
            builder.narrative.push(format!("{value} injury"));
        }
        "external cause" => {
            builder.external_cause = Some(parse_external_cause(value, line)?);
        }
        "episode" => {
            builder.episode = Some(parse_episode(value, line)?);
        }
        "procedures" | "procedure" => {
            builder.procedures.extend(split_values(value));
        }
        _ => {
            return Err(ExtractError::UnknownField {
                line,
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

impl NoteBuilder {
    /// Assemble concepts, running the free-text extractor over narrative
    /// fields first and layering the explicit fields on top.
    fn build(self) -> ParsedNote {
        let narrative = self.narrative.join(". ");
        let mut concepts = ConceptExtractor::new().extract(&narrative);

        if let Some(diabetes_type) = self.diabetes_type {
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Diabetes { .. }),
                "diabetes",
                ConceptAttributes::Diabetes {
                    diabetes_type,
                    complications: self.complications.clone(),
                    uncontrolled: false,
                },
                |attrs| {
                    if let ConceptAttributes::Diabetes {
                        diabetes_type: ty,
                        complications,
                        ..
                    } = attrs
                    {
                        *ty = diabetes_type;
                        complications.extend(self.complications.iter().copied());
                    }
                },
            );
        }

        if self.ckd || self.aki || self.dialysis.is_some() {
            let stage = self.ckd_stage;
            let dialysis = self.dialysis;
            let aki = self.aki;
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::KidneyDisease { .. }),
                "kidney disease",
                ConceptAttributes::KidneyDisease {
                    stage,
                    dialysis,
                    acute_injury: aki,
                },
                |attrs| {
                    if let ConceptAttributes::KidneyDisease {
                        stage: s,
                        dialysis: d,
                        acute_injury,
                    } = attrs
                    {
                        if stage.is_some() {
                            *s = stage;
                        }
                        if dialysis.is_some() {
                            *d = dialysis;
                        }
                        *acute_injury |= aki;
                    }
                },
            );
        }

        if self.hypertension {
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Hypertension),
                "hypertension",
                ConceptAttributes::Hypertension,
                |_| {},
            );
        }

        if let Some((failure_type, acuity)) = self.heart_failure {
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::HeartFailure { .. }),
                "heart failure",
                ConceptAttributes::HeartFailure {
                    failure_type,
                    acuity,
                },
                |attrs| {
                    if let ConceptAttributes::HeartFailure {
                        failure_type: t,
                        acuity: a,
                    } = attrs
                    {
                        *t = failure_type;
                        *a = acuity;
                    }
                },
            );
        }

        if let Some((exacerbation, infection)) = self.copd {
            let organism = self.organism;
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Copd { .. }),
                "copd",
                ConceptAttributes::Copd {
                    exacerbation,
                    lower_respiratory_infection: infection,
                    organism,
                },
                |attrs| {
                    if let ConceptAttributes::Copd {
                        exacerbation: e,
                        lower_respiratory_infection: i,
                        organism: o,
                    } = attrs
                    {
                        *e |= exacerbation;
                        *i |= infection;
                        if organism.is_some() {
                            *o = organism;
                        }
                    }
                },
            );
        }

        if let Some(status) = self.asthma {
            for concept in &mut concepts {
                if let ConceptAttributes::Asthma { status: s, .. } = &mut concept.attributes {
                    *s = status;
                }
            }
        }

        if self.sepsis || self.septic_shock || self.severe_sepsis {
            let present = self.sepsis;
            let severe = self.severe_sepsis || self.septic_shock;
            let septic_shock = self.septic_shock;
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Sepsis { .. }),
                "sepsis",
                ConceptAttributes::Sepsis {
                    present,
                    severe,
                    septic_shock,
                },
                |attrs| {
                    if let ConceptAttributes::Sepsis {
                        present: p,
                        severe: sv,
                        septic_shock: sh,
                    } = attrs
                    {
                        // Explicit fields are authoritative over narrative.
                        *p = present;
                        *sv = severe;
                        *sh = septic_shock;
                    }
                },
            );
        }

        if let Some(metabolic) = self.encephalopathy {
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Encephalopathy { .. }),
                "encephalopathy",
                ConceptAttributes::Encephalopathy { metabolic },
                |_| {},
            );
        }

        if self.pregnant {
            let weeks = self.pregnancy_weeks;
            upsert(
                &mut concepts,
                |a| matches!(a, ConceptAttributes::Pregnancy { .. }),
                "pregnancy",
                ConceptAttributes::Pregnancy {
                    weeks,
                    gestational_diabetes: false,
                },
                |attrs| {
                    if let ConceptAttributes::Pregnancy { weeks: w, .. } = attrs {
                        if weeks.is_some() {
                            *w = weeks;
                        }
                    }
                },
            );
        }

        if self.episode.is_some() || self.external_cause.is_some() {
            let episode = self.episode;
            let external_cause = self.external_cause;
            for concept in &mut concepts {
                if let ConceptAttributes::Injury {
                    episode: e,
                    external_cause: c,
                    ..
                } = &mut concept.attributes
                {
                    if episode.is_some() {
                        *e = episode;
                    }
                    if external_cause.is_some() {
                        *c = external_cause;
                    }
                }
            }
        }

        ParsedNote {
            concepts,
            procedures: self.procedures,
        }
    }
}

/// Update the matching concept in place, or append a new one built from the
/// explicit field.
fn upsert(
    concepts: &mut Vec<Concept>,
    select: impl Fn(&ConceptAttributes) -> bool,
    label: &str,
    fresh: ConceptAttributes,
    update: impl FnOnce(&mut ConceptAttributes),
) {
    if let Some(existing) = concepts.iter_mut().find(|c| select(&c.attributes)) {
        update(&mut existing.attributes);
    } else {
        concepts.push(Concept::new(label, normalize(label), fresh));
    }
}

fn split_values(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_yes_no(value: &str, field: &str, line: usize) -> Result<bool, ExtractError> {
    match value.to_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        _ => Err(ExtractError::InvalidValue {
            line,
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_diabetes_type(value: &str, line: usize) -> Result<DiabetesType, ExtractError> {
    match value.to_lowercase().as_str() {
        "type 1" | "type i" | "1" => Ok(DiabetesType::Type1),
        "type 2" | "type ii" | "2" => Ok(DiabetesType::Type2),
        "yes" | "y" | "unspecified" => Ok(DiabetesType::Unspecified),
        _ => Err(ExtractError::InvalidValue {
            line,
            field: "diabetes".to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_complication(value: &str, line: usize) -> Result<DiabetesComplication, ExtractError> {
    let lowered = value.to_lowercase();
    let complication = match lowered.as_str() {
        "hyperosmolar state" | "hyperosmolarity" => DiabetesComplication::HyperosmolarState,
        "ketoacidosis" | "dka" => DiabetesComplication::Ketoacidosis,
        "hypoglycemia" => DiabetesComplication::Hypoglycemia,
        "hyperglycemia" => DiabetesComplication::Hyperglycemia,
        "foot ulcer" => DiabetesComplication::FootUlcer,
        "peripheral angiopathy" => DiabetesComplication::PeripheralAngiopathy { gangrene: false },
        "peripheral angiopathy with gangrene" | "gangrene" => {
            DiabetesComplication::PeripheralAngiopathy { gangrene: true }
        }
        "charcot joint" | "neuropathic arthropathy" => DiabetesComplication::CharcotJoint,
        "retinopathy" => DiabetesComplication::Retinopathy {
            severity: RetinopathySeverity::Unspecified,
            macular_edema: false,
            traction_detachment: false,
        },
        "nephropathy" => DiabetesComplication::Nephropathy,
        "neuropathy" => DiabetesComplication::Neuropathy(NeuropathySubtype::Unspecified),
        "polyneuropathy" => DiabetesComplication::Neuropathy(NeuropathySubtype::Polyneuropathy),
        "mononeuropathy" => DiabetesComplication::Neuropathy(NeuropathySubtype::Mononeuropathy),
        "cataract" => DiabetesComplication::Cataract,
        _ => {
            return Err(ExtractError::InvalidValue {
                line,
                field: "complications".to_string(),
                value: value.to_string(),
            });
        }
    };
    Ok(complication)
}

fn parse_ckd_stage(value: &str, line: usize) -> Result<CkdStage, ExtractError> {
    match value.to_lowercase().as_str() {
        "1" => Ok(CkdStage::One),
        "2" => Ok(CkdStage::Two),
        "3" => Ok(CkdStage::Three),
        "3a" => Ok(CkdStage::ThreeA),
        "3b" => Ok(CkdStage::ThreeB),
        "4" => Ok(CkdStage::Four),
        "5" => Ok(CkdStage::Five),
        "esrd" | "end stage" => Ok(CkdStage::EndStage),
        _ => Err(ExtractError::InvalidValue {
            line,
            field: "ckd stage".to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_dialysis(value: &str, line: usize) -> Result<Option<DialysisStatus>, ExtractError> {
    match value.to_lowercase().as_str() {
        "chronic" => Ok(Some(DialysisStatus::Chronic)),
        "acute" | "temporary" => Ok(Some(DialysisStatus::Acute)),
        "no" | "n" | "none" => Ok(None),
        _ => Err(ExtractError::InvalidValue {
            line,
            field: "dialysis".to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_heart_failure(value: &str) -> (HeartFailureType, HfAcuity) {
    let lowered = value.to_lowercase();
    let failure_type = if lowered.contains("combined")
        || (lowered.contains("systolic") && lowered.contains("diastolic"))
    {
        HeartFailureType::Combined
    } else if lowered.contains("systolic") {
        HeartFailureType::Systolic
    } else if lowered.contains("diastolic") {
        HeartFailureType::Diastolic
    } else {
        HeartFailureType::Unspecified
    };
    let acuity = if lowered.contains("acute on chronic") {
        HfAcuity::AcuteOnChronic
    } else if lowered.contains("acute") {
        HfAcuity::Acute
    } else if lowered.contains("chronic") {
        HfAcuity::Chronic
    } else {
        HfAcuity::Unspecified
    };
    (failure_type, acuity)
}

fn parse_organism(value: &str, line: usize) -> Result<Organism, ExtractError> {
    let lowered = value.to_lowercase();
    let table: [(&str, Organism); 7] = [
        ("pseudomonas", Organism::Pseudomonas),
        ("klebsiella", Organism::Klebsiella),
        ("staph", Organism::Staphylococcus),
        ("strep", Organism::Streptococcus),
        ("haemophilus", Organism::Haemophilus),
        ("hemophilus", Organism::Haemophilus),
        ("coli", Organism::EscherichiaColi),
    ];
    table
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|(_, organism)| *organism)
        .ok_or_else(|| ExtractError::InvalidValue {
            line,
            field: "organism".to_string(),
            value: value.to_string(),
        })
}

fn parse_external_cause(value: &str, line: usize) -> Result<ExternalCause, ExtractError> {
    let lowered = value.to_lowercase();
    if lowered.contains("fall") {
        Ok(ExternalCause::Fall)
    } else if lowered.contains("struck") {
        Ok(ExternalCause::StruckByObject)
    } else if lowered.contains("motor vehicle") || lowered.contains("car accident") {
        Ok(ExternalCause::MotorVehicle)
    } else {
        Err(ExtractError::InvalidValue {
            line,
            field: "external cause".to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_episode(value: &str, line: usize) -> Result<EpisodeOfCare, ExtractError> {
    match value.to_lowercase().as_str() {
        "initial" => Ok(EpisodeOfCare::Initial),
        "subsequent" => Ok(EpisodeOfCare::Subsequent),
        "sequela" => Ok(EpisodeOfCare::Sequela),
        _ => Err(ExtractError::InvalidValue {
            line,
            field: "episode".to_string(),
            value: value.to_string(),
        }),
    }
}
