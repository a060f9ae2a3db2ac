//! Pipeline output types.
//!
//! Everything here is JSON-serializable with camelCase field names, matching
//! the external contract of the coding service.

use serde::{Deserialize, Serialize};

/// One code in the final sequenced list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencedCode {
    pub code: String,
    pub description: String,
    pub reason: String,
    /// Dense position starting at 1; order 1 is the principal code.
    pub order: u32,
    /// Confidence in (0, 0.99].
    pub confidence: f64,
    #[serde(rename = "guidelineRuleId", skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

/// Result of a free-text coding run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingOutput {
    pub codes: Vec<SequencedCode>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CodingOutput {
    /// The principal (order 1) code, if any survived.
    pub fn principal(&self) -> Option<&SequencedCode> {
        self.codes.iter().find(|c| c.order == 1)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c.code == code)
    }
}

/// Result of a structured-input coding run: the free-text output plus the
/// primary/secondary split and the pass-through procedure list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOutput {
    #[serde(flatten)]
    pub output: CodingOutput,
    pub primary: Option<SequencedCode>,
    pub secondary: Vec<SequencedCode>,
    pub procedures: Vec<String>,
    pub validation_errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequenced_code_serializes_camel_case() {
        let code = SequencedCode {
            code: "E11.22".to_string(),
            description: "Type 2 diabetes mellitus with diabetic chronic kidney disease"
                .to_string(),
            reason: "diabetes with CKD".to_string(),
            order: 1,
            confidence: 0.9,
            rule_id: Some("diabetes-ckd".to_string()),
        };
        let json = serde_json::to_value(&code).expect("serialize");
        assert_eq!(json["guidelineRuleId"], "diabetes-ckd");
        assert_eq!(json["order"], 1);
    }

    #[test]
    fn rule_id_omitted_when_absent() {
        let code = SequencedCode {
            code: "I10".to_string(),
            description: "Essential (primary) hypertension".to_string(),
            reason: "hypertension".to_string(),
            order: 2,
            confidence: 0.8,
            rule_id: None,
        };
        let json = serde_json::to_value(&code).expect("serialize");
        assert!(json.get("guidelineRuleId").is_none());
    }

    #[test]
    fn structured_output_flattens_base() {
        let out = StructuredOutput::default();
        let json = serde_json::to_value(&out).expect("serialize");
        assert!(json.get("codes").is_some());
        assert!(json.get("validationErrors").is_some());
    }
}
