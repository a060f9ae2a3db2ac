//! Guideline rule modules.
//!
//! The engine is a reducer pipeline: each module consumes the current
//! [`CodingState`] and returns the next one. Modules run in a fixed order
//! and are idempotent on an unchanged candidate set, so re-running the
//! pipeline over its own output changes nothing.

mod cardiorenal;
mod ckd;
mod diabetes;
mod injury;
mod neoplasm;
mod neuropathy;
mod notes;
mod pregnancy;
mod respiratory;

pub use cardiorenal::CardioRenalModule;
pub use ckd::CkdStagingModule;
pub use diabetes::DiabetesModule;
pub use injury::InjuryModule;
pub use neoplasm::NeoplasmModule;
pub use neuropathy::NeuropathyModule;
pub use notes::CatalogNotesModule;
pub use pregnancy::PregnancyModule;
pub use respiratory::RespiratoryModule;

use icd_catalog::Catalog;
use icd_model::PipelineOptions;

use crate::state::CodingState;

/// Read-only context shared by every module.
pub struct ModuleContext<'a> {
    pub catalog: &'a Catalog,
    pub options: &'a PipelineOptions,
}

/// One guideline module in the reducer pipeline.
pub trait GuidelineModule {
    /// Stable identifier recorded on candidates this module reshapes.
    fn rule_id(&self) -> &'static str;

    /// Consume the state and return the next one.
    fn apply(&self, state: CodingState, ctx: &ModuleContext<'_>) -> CodingState;
}

/// The fixed module order: diabetes → neuropathy refinement → cardio-renal
/// combination → CKD staging → neoplasm sequencing → pregnancy override →
/// respiratory → catalog-notes guidance → injury.
pub fn default_modules() -> Vec<Box<dyn GuidelineModule>> {
    vec![
        Box::new(DiabetesModule),
        Box::new(NeuropathyModule),
        Box::new(CardioRenalModule),
        Box::new(CkdStagingModule),
        Box::new(NeoplasmModule),
        Box::new(PregnancyModule),
        Box::new(RespiratoryModule),
        Box::new(CatalogNotesModule),
        Box::new(InjuryModule),
    ]
}
