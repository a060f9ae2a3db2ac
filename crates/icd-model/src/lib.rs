pub mod candidate;
pub mod concept;
pub mod error;
pub mod options;
pub mod output;
pub mod validation;

pub use candidate::{CandidateCode, ExclusionKind, ExclusionRelation};
pub use concept::{
    AsthmaSeverity, AsthmaStatus, CkdStage, Concept, ConceptAttributes, ConceptType,
    DiabetesComplication, DiabetesType, DialysisStatus, EpisodeOfCare, ExternalCause,
    HeartFailureType, HfAcuity, InjuryKind, Laterality, NeoplasmSite, NeuropathySubtype,
    Organism, RetinopathySeverity,
};
pub use error::{CodingError, Result};
pub use options::{AttributeStrictness, PipelineOptions};
pub use output::{CodingOutput, SequencedCode, StructuredOutput};
pub use validation::{Severity, ValidationFinding, ValidationReport};
