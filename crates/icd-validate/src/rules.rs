//! The compliance rule registry.
//!
//! Every rule is an independent read-only predicate with a stable id. All
//! firing rules are reported; there is no early exit and no mutation of the
//! code list.

use icd_model::{Severity, ValidationFinding};

use crate::checks::{RuleHit, documentation, principal, structural, support};
use crate::context::ValidationContext;

type Check = fn(&ValidationContext) -> Option<RuleHit>;

/// One registered compliance rule.
pub struct Rule {
    pub id: &'static str,
    pub severity: Severity,
    pub rationale: &'static str,
    pub remediation: &'static str,
    check: Check,
}

impl Rule {
    pub fn evaluate(&self, ctx: &ValidationContext) -> Option<ValidationFinding> {
        let hit = (self.check)(ctx)?;
        Some(ValidationFinding {
            rule_id: self.id.to_string(),
            severity: self.severity,
            issue: hit.issue,
            rationale: self.rationale.to_string(),
            remediation: self.remediation.to_string(),
            affected_codes: hit.affected,
        })
    }
}

/// The full rule set, in evaluation (and report) order.
pub fn all_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "V01",
            severity: Severity::Error,
            rationale: "each diagnosis is reported once",
            remediation: "remove the duplicate entries",
            check: structural::duplicate_codes,
        },
        Rule {
            id: "V02",
            severity: Severity::Error,
            rationale: "sequence order must be dense starting at 1",
            remediation: "resequence the list without gaps",
            check: structural::order_density,
        },
        Rule {
            id: "V03",
            severity: Severity::Error,
            rationale: "confidence is bounded to (0, 0.99]",
            remediation: "recompute the confidence values",
            check: structural::confidence_range,
        },
        Rule {
            id: "V04",
            severity: Severity::Warning,
            rationale: "documented conditions should produce codes",
            remediation: "review extraction and rule removals",
            check: structural::empty_result,
        },
        Rule {
            id: "V05",
            severity: Severity::Error,
            rationale: "Excludes1 relationships forbid coexistence",
            remediation: "keep only the more specific code of each pair",
            check: structural::excludes1_conflict,
        },
        Rule {
            id: "V06",
            severity: Severity::Warning,
            rationale: "every reported code must exist in the catalog",
            remediation: "verify the code against the current catalog release",
            check: structural::unknown_codes,
        },
        Rule {
            id: "V10",
            severity: Severity::Error,
            rationale: "manifestation codes never lead a claim",
            remediation: "sequence the underlying condition first",
            check: principal::manifestation_principal,
        },
        Rule {
            id: "V11",
            severity: Severity::Error,
            rationale: "external cause codes never lead a claim",
            remediation: "sequence the injury first",
            check: principal::external_cause_principal,
        },
        Rule {
            id: "V12",
            severity: Severity::Warning,
            rationale: "status codes rarely justify the encounter",
            remediation: "confirm the status code is the reason for the visit",
            check: principal::status_code_principal,
        },
        Rule {
            id: "V20",
            severity: Severity::Error,
            rationale: "a metastasis implies a primary site, active or historical",
            remediation: "add the primary site or a personal-history code",
            check: support::secondary_without_primary,
        },
        Rule {
            id: "V21",
            severity: Severity::Error,
            rationale: "dialysis dependence requires chronic dialysis status",
            remediation: "document chronic dialysis or drop Z99.2",
            check: support::dialysis_code_support,
        },
        Rule {
            id: "V22",
            severity: Severity::Error,
            rationale: "acute kidney failure requires a documented injury",
            remediation: "document the acute kidney injury or drop the code",
            check: support::aki_code_support,
        },
        Rule {
            id: "V23",
            severity: Severity::Error,
            rationale: "severe sepsis is coded only when explicitly documented",
            remediation: "document severe sepsis or drop the R65.2- code",
            check: support::severe_sepsis_support,
        },
        Rule {
            id: "V24",
            severity: Severity::Error,
            rationale: "R65.21 requires septic shock",
            remediation: "use R65.20 when shock is not documented",
            check: support::septic_shock_support,
        },
        Rule {
            id: "V25",
            severity: Severity::Error,
            rationale: "encephalopathy codes require the condition documented",
            remediation: "document the encephalopathy or drop the code",
            check: support::encephalopathy_support,
        },
        Rule {
            id: "V26",
            severity: Severity::Error,
            rationale: "combination codes replace their components",
            remediation: "remove the superseded hypertension codes",
            check: support::combination_redundancy,
        },
        Rule {
            id: "V27",
            severity: Severity::Warning,
            rationale: "diabetic CKD is staged with an additional N18 code",
            remediation: "add the documented CKD stage code",
            check: support::diabetes_ckd_stage,
        },
        Rule {
            id: "V28",
            severity: Severity::Warning,
            rationale: "J44.0 expects the infection to be coded",
            remediation: "add the organism-specific or unspecified pneumonia code",
            check: support::copd_infection_support,
        },
        Rule {
            id: "V29",
            severity: Severity::Error,
            rationale: "infection and exacerbation variants are mutually exclusive",
            remediation: "keep the infection variant",
            check: support::copd_variant_conflict,
        },
        Rule {
            id: "V30",
            severity: Severity::Warning,
            rationale: "severe sepsis codes follow the underlying infection",
            remediation: "add the underlying infection code first",
            check: support::sepsis_code_first,
        },
        Rule {
            id: "V31",
            severity: Severity::Error,
            rationale: "a known stage makes the unspecified stage redundant",
            remediation: "drop N18.9",
            check: support::redundant_unspecified_ckd,
        },
        Rule {
            id: "V40",
            severity: Severity::Warning,
            rationale: "laterality should be coded when documented",
            remediation: "query the provider for the affected side",
            check: documentation::unspecified_laterality,
        },
        Rule {
            id: "V41",
            severity: Severity::Error,
            rationale: "trauma codes carry an episode-of-care character",
            remediation: "append the initial/subsequent/sequela character",
            check: documentation::injury_episode_character,
        },
        Rule {
            id: "V42",
            severity: Severity::Warning,
            rationale: "injuries are reported with their external cause",
            remediation: "add the external cause code",
            check: documentation::injury_external_cause,
        },
        Rule {
            id: "V43",
            severity: Severity::Warning,
            rationale: "unspecified codes suggest lost specificity",
            remediation: "query the provider for detail",
            check: documentation::unspecified_density,
        },
        Rule {
            id: "V44",
            severity: Severity::Error,
            rationale: "all output must be well-formed ICD-10-CM codes",
            remediation: "fix the malformed code value",
            check: documentation::code_shape,
        },
    ]
}
