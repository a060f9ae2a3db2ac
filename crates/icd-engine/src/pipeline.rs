//! Pipeline entry points.
//!
//! One synchronous, single-threaded run per invocation: extract concepts,
//! hard-stop checks, candidate generation, the guideline module chain,
//! exclusion resolution, invariant enforcement, sequencing. The catalog is
//! an explicit handle, so independent pipeline instances can run against
//! different catalog loads.

use icd_catalog::Catalog;
use icd_extract::{ConceptExtractor, parse_structured};
use icd_model::{
    AttributeStrictness, CodingError, CodingOutput, Concept, ConceptAttributes, PipelineOptions,
    Result, StructuredOutput,
};
use tracing::debug;

use crate::exclusion::resolve_exclusions;
use crate::generate::generate_candidates;
use crate::invariants::enforce_invariants;
use crate::modules::{GuidelineModule, ModuleContext, default_modules};
use crate::sequence::sequence;
use crate::state::CodingState;

/// A configured coding pipeline bound to one catalog handle.
pub struct CodingPipeline<'a> {
    catalog: &'a Catalog,
    options: PipelineOptions,
    modules: Vec<Box<dyn GuidelineModule>>,
}

impl<'a> CodingPipeline<'a> {
    /// Pipeline with default options and the standard module order.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            options: PipelineOptions::default(),
            modules: default_modules(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Code a free-text clinical narrative.
    pub fn code_text(&self, text: &str) -> Result<CodingOutput> {
        let concepts = ConceptExtractor::new().extract(text);
        let (output, _) = self.run(concepts, self.options.strictness)?;
        Ok(output)
    }

    /// Code a structured "Field: Value" block. Structured input is always
    /// held to strict attribute requirements, and the result carries the
    /// primary/secondary split, pass-through procedures, and an independent
    /// compliance check.
    pub fn code_structured(&self, block: &str) -> Result<StructuredOutput> {
        let parsed = parse_structured(block)?;
        let (output, state) = self.run(parsed.concepts, AttributeStrictness::Strict)?;

        let report = icd_validate::validate(&output.codes, &state.concepts, self.catalog);
        let validation_errors = report
            .errors
            .iter()
            .map(|f| format!("{}: {}", f.rule_id, f.issue))
            .collect();

        let mut codes = output.codes.iter();
        let primary = codes.next().cloned();
        let secondary = codes.cloned().collect();
        Ok(StructuredOutput {
            output,
            primary,
            secondary,
            procedures: parsed.procedures,
            validation_errors,
        })
    }

    fn run(
        &self,
        concepts: Vec<Concept>,
        strictness: AttributeStrictness,
    ) -> Result<(CodingOutput, CodingState)> {
        hard_stop_checks(&concepts, strictness)?;

        let mut state = CodingState::new(concepts);
        generate_candidates(&mut state);

        let ctx = ModuleContext {
            catalog: self.catalog,
            options: &self.options,
        };
        for module in &self.modules {
            state = module.apply(state, &ctx);
            debug!(
                rule = module.rule_id(),
                candidates = state.candidate_count(),
                "module applied"
            );
        }

        state = resolve_exclusions(state, self.catalog);
        state = enforce_invariants(state);

        let codes = sequence(&state, self.catalog, &self.options);
        let output = CodingOutput {
            codes,
            warnings: state.warnings.clone(),
            errors: state.errors.clone(),
        };
        Ok((output, state))
    }
}

/// Hard-stop validation: a documented condition missing a required
/// attribute blocks code generation. Never defaulted.
fn hard_stop_checks(concepts: &[Concept], strictness: AttributeStrictness) -> Result<()> {
    for concept in concepts {
        match &concept.attributes {
            // Shock asserted while sepsis itself is absent is contradictory
            // in any mode.
            ConceptAttributes::Sepsis {
                present: false,
                septic_shock: true,
                ..
            } => {
                return Err(CodingError::MissingAttribute {
                    condition: "septic shock".to_string(),
                    attribute: "sepsis".to_string(),
                });
            }
            ConceptAttributes::KidneyDisease {
                stage: None,
                acute_injury: false,
                ..
            } if strictness == AttributeStrictness::Strict => {
                return Err(CodingError::MissingAttribute {
                    condition: "chronic kidney disease".to_string(),
                    attribute: "stage".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Code free text against a catalog with the given options.
pub fn code_text(
    text: &str,
    catalog: &Catalog,
    options: &PipelineOptions,
) -> Result<CodingOutput> {
    CodingPipeline::new(catalog)
        .with_options(options.clone())
        .code_text(text)
}

/// Code a structured block against a catalog with the given options.
pub fn code_structured(
    block: &str,
    catalog: &Catalog,
    options: &PipelineOptions,
) -> Result<StructuredOutput> {
    CodingPipeline::new(catalog)
        .with_options(options.clone())
        .code_structured(block)
}
