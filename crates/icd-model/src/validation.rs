//! Compliance validation findings and report.

use serde::{Deserialize, Serialize};

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single firing of one compliance rule against the final code list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    pub rule_id: String,
    pub severity: Severity,
    /// What is wrong.
    pub issue: String,
    /// Which guideline the rule enforces.
    pub rationale: String,
    /// What a coder should do about it.
    pub remediation: String,
    pub affected_codes: Vec<String>,
}

/// Read-only compliance report over a sequenced code list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// Build a report from raw findings, partitioning by severity.
    pub fn from_findings(findings: Vec<ValidationFinding>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}
