//! Typed clinical concepts extracted from documentation.
//!
//! A [`Concept`] is one clinical fact found in the input, carrying the text
//! it was derived from and a typed attribute record. Attributes are a sum
//! type: each variant holds only the fields meaningful to that concept type,
//! so a rule can never read an attribute that does not apply. Undetectable
//! attributes stay `None`; downstream rules treat "unspecified" explicitly
//! rather than receiving a guessed default.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of concept types the extractor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConceptType {
    Diabetes,
    KidneyDisease,
    Hypertension,
    HeartFailure,
    Copd,
    Asthma,
    Neoplasm,
    Pregnancy,
    Injury,
    Neuropathy,
    Sepsis,
    Encephalopathy,
    Other,
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Diabetes => "diabetes",
            Self::KidneyDisease => "kidney disease",
            Self::Hypertension => "hypertension",
            Self::HeartFailure => "heart failure",
            Self::Copd => "COPD",
            Self::Asthma => "asthma",
            Self::Neoplasm => "neoplasm",
            Self::Pregnancy => "pregnancy",
            Self::Injury => "injury",
            Self::Neuropathy => "neuropathy",
            Self::Sepsis => "sepsis",
            Self::Encephalopathy => "encephalopathy",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Diabetes mellitus type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiabetesType {
    Type1,
    Type2,
    #[default]
    Unspecified,
}

/// Diabetic retinopathy severity grades.
///
/// Declaration order is ascending severity; the unspecified grade sorts
/// first so aggregation naturally keeps the most severe documented grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RetinopathySeverity {
    Unspecified,
    Mild,
    Moderate,
    Severe,
    Proliferative,
}

/// Diabetic neuropathy subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeuropathySubtype {
    Mononeuropathy,
    Polyneuropathy,
    Autonomic,
    Amyotrophy,
    Unspecified,
}

/// A documented diabetes complication.
///
/// Variants are declared in primary-manifestation precedence order: the
/// derived `Ord` therefore matches the selection chain used by the diabetes
/// guideline module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiabetesComplication {
    HyperosmolarState,
    Ketoacidosis,
    Hypoglycemia,
    Hyperglycemia,
    FootUlcer,
    PeripheralAngiopathy { gangrene: bool },
    CharcotJoint,
    Retinopathy {
        severity: RetinopathySeverity,
        macular_edema: bool,
        traction_detachment: bool,
    },
    Nephropathy,
    Neuropathy(NeuropathySubtype),
    Cataract,
}

/// Chronic kidney disease stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CkdStage {
    One,
    Two,
    /// Stage 3 with no a/b split documented.
    Three,
    ThreeA,
    ThreeB,
    Four,
    Five,
    EndStage,
}

impl CkdStage {
    /// True for stage 5 and ESRD, the split point for the cardio-renal
    /// combination codes.
    pub fn is_stage_five_or_esrd(self) -> bool {
        matches!(self, Self::Five | Self::EndStage)
    }
}

/// Dialysis dependence documented for a kidney-disease concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialysisStatus {
    Chronic,
    Acute,
}

/// Heart failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeartFailureType {
    Systolic,
    Diastolic,
    Combined,
    #[default]
    Unspecified,
}

/// Heart failure acuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HfAcuity {
    Acute,
    Chronic,
    AcuteOnChronic,
    #[default]
    Unspecified,
}

/// Causative organism for a lower respiratory infection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Organism {
    Pseudomonas,
    Klebsiella,
    Staphylococcus,
    Streptococcus,
    Haemophilus,
    EscherichiaColi,
}

/// Asthma severity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AsthmaSeverity {
    MildIntermittent,
    MildPersistent,
    ModeratePersistent,
    SeverePersistent,
    #[default]
    Unspecified,
}

/// Asthma status qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AsthmaStatus {
    #[default]
    Uncomplicated,
    Exacerbation,
    StatusAsthmaticus,
}

/// Body sites recognized for neoplasm coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeoplasmSite {
    Lung,
    Breast,
    Colon,
    Prostate,
    Pancreas,
    Liver,
    Bone,
    Brain,
}

impl fmt::Display for NeoplasmSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lung => "lung",
            Self::Breast => "breast",
            Self::Colon => "colon",
            Self::Prostate => "prostate",
            Self::Pancreas => "pancreas",
            Self::Liver => "liver",
            Self::Bone => "bone",
            Self::Brain => "brain",
        };
        f.write_str(name)
    }
}

/// Injury kinds the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjuryKind {
    WristFracture,
    AnkleFracture,
    FemurFracture,
    HeadInjury,
    Laceration,
    Unspecified,
}

/// Laterality qualifier for sided conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Laterality {
    Left,
    Right,
    Bilateral,
    Unspecified,
}

/// Episode of care for injury coding (the 7th character).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOfCare {
    Initial,
    Subsequent,
    Sequela,
}

impl EpisodeOfCare {
    /// The 7th-character value for this episode.
    pub fn suffix(self) -> char {
        match self {
            Self::Initial => 'A',
            Self::Subsequent => 'D',
            Self::Sequela => 'S',
        }
    }
}

/// Documented external cause of an injury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalCause {
    Fall,
    StruckByObject,
    MotorVehicle,
}

/// Type-specific attribute record, one variant per concept type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConceptAttributes {
    Diabetes {
        diabetes_type: DiabetesType,
        complications: BTreeSet<DiabetesComplication>,
        uncontrolled: bool,
    },
    KidneyDisease {
        stage: Option<CkdStage>,
        dialysis: Option<DialysisStatus>,
        acute_injury: bool,
    },
    Hypertension,
    HeartFailure {
        failure_type: HeartFailureType,
        acuity: HfAcuity,
    },
    Copd {
        exacerbation: bool,
        lower_respiratory_infection: bool,
        organism: Option<Organism>,
    },
    Asthma {
        severity: AsthmaSeverity,
        status: AsthmaStatus,
    },
    Neoplasm {
        primary_site: Option<NeoplasmSite>,
        secondary_sites: BTreeSet<NeoplasmSite>,
        unspecified_secondary: bool,
        history_of_malignancy: bool,
    },
    Pregnancy {
        weeks: Option<u8>,
        gestational_diabetes: bool,
    },
    Injury {
        kind: InjuryKind,
        laterality: Option<Laterality>,
        episode: Option<EpisodeOfCare>,
        external_cause: Option<ExternalCause>,
    },
    /// Neuropathy documented outside a diabetes context.
    Neuropathy {
        subtype: NeuropathySubtype,
    },
    Sepsis {
        /// Sepsis itself documented. Septic shock asserted without this is
        /// contradictory and hard-stops the run.
        present: bool,
        severe: bool,
        septic_shock: bool,
    },
    Encephalopathy {
        metabolic: bool,
    },
    Other {
        label: String,
    },
}

impl ConceptAttributes {
    /// The concept type this attribute record belongs to.
    pub fn concept_type(&self) -> ConceptType {
        match self {
            Self::Diabetes { .. } => ConceptType::Diabetes,
            Self::KidneyDisease { .. } => ConceptType::KidneyDisease,
            Self::Hypertension => ConceptType::Hypertension,
            Self::HeartFailure { .. } => ConceptType::HeartFailure,
            Self::Copd { .. } => ConceptType::Copd,
            Self::Asthma { .. } => ConceptType::Asthma,
            Self::Neoplasm { .. } => ConceptType::Neoplasm,
            Self::Pregnancy { .. } => ConceptType::Pregnancy,
            Self::Injury { .. } => ConceptType::Injury,
            Self::Neuropathy { .. } => ConceptType::Neuropathy,
            Self::Sepsis { .. } => ConceptType::Sepsis,
            Self::Encephalopathy { .. } => ConceptType::Encephalopathy,
            Self::Other { .. } => ConceptType::Other,
        }
    }
}

/// One clinical fact found in the input. Immutable once produced: the
/// extractor is the only writer, every later stage reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Text fragment the concept was derived from.
    pub raw_text: String,
    /// Normalized form of the fragment.
    pub normalized_text: String,
    /// Typed attribute record.
    pub attributes: ConceptAttributes,
}

impl Concept {
    pub fn new(
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
        attributes: ConceptAttributes,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            attributes,
        }
    }

    pub fn concept_type(&self) -> ConceptType {
        self.attributes.concept_type()
    }
}
