//! Text normalization.
//!
//! Pure function: lowercase the input, expand multi-word synonyms, then
//! expand whole-word abbreviations. Token boundaries are preserved, so
//! "DM" expands but "admission" does not. Empty input yields empty output.

/// Multi-word phrase synonyms, applied before token expansion.
/// Longer phrases first so "acute renal failure" is not split by the
/// shorter "renal failure" rewrite.
const PHRASE_SYNONYMS: &[(&str, &str)] = &[
    ("high blood pressure", "hypertension"),
    ("low blood sugar", "hypoglycemia"),
    ("high blood sugar", "hyperglycemia"),
    ("sugar diabetes", "diabetes mellitus"),
    ("renal failure", "kidney failure"),
    ("renal disease", "kidney disease"),
    ("heart failure with reduced ejection fraction", "systolic heart failure"),
    ("heart failure with preserved ejection fraction", "diastolic heart failure"),
];

/// Whole-word abbreviation expansions.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("dm", "diabetes mellitus"),
    ("dm2", "type 2 diabetes mellitus"),
    ("t1dm", "type 1 diabetes mellitus"),
    ("t2dm", "type 2 diabetes mellitus"),
    ("dka", "diabetic ketoacidosis"),
    ("hhs", "hyperosmolar hyperglycemic state"),
    ("htn", "hypertension"),
    ("ckd", "chronic kidney disease"),
    ("esrd", "end stage kidney disease"),
    ("aki", "acute kidney injury"),
    ("arf", "acute kidney failure"),
    ("hf", "heart failure"),
    ("chf", "congestive heart failure"),
    ("hfref", "systolic heart failure"),
    ("hfpef", "diastolic heart failure"),
    ("copd", "chronic obstructive pulmonary disease"),
    ("pna", "pneumonia"),
    ("pvd", "peripheral vascular disease"),
    ("gdm", "gestational diabetes mellitus"),
    ("fx", "fracture"),
    ("mva", "motor vehicle accident"),
    ("hd", "hemodialysis"),
    ("ca", "cancer"),
    ("mets", "metastases"),
];

/// Normalize clinical text for concept extraction.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut lowered = text.to_lowercase();
    for (phrase, replacement) in PHRASE_SYNONYMS {
        lowered = replace_phrase(&lowered, phrase, replacement);
    }
    expand_tokens(&lowered)
}

/// Whole-word phrase replacement: the phrase must not be flanked by
/// alphanumeric characters.
fn replace_phrase(text: &str, phrase: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(phrase) {
        out.push_str(&rest[..pos]);
        let before_ok = out
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        let after = &rest[pos + phrase.len()..];
        let after_ok = after
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        if before_ok && after_ok {
            out.push_str(replacement);
        } else {
            out.push_str(phrase);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Expand whole-token abbreviations, preserving separators.
fn expand_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            token.push(c);
        } else {
            flush_token(&mut out, &mut token);
            out.push(c);
        }
    }
    flush_token(&mut out, &mut token);
    out
}

fn flush_token(out: &mut String, token: &mut String) {
    if token.is_empty() {
        return;
    }
    let expansion = ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token.as_str())
        .map(|(_, expansion)| *expansion);
    match expansion {
        Some(expansion) => out.push_str(expansion),
        None => out.push_str(token),
    }
    token.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_in_empty_out() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn lowercases_and_expands_abbreviations() {
        assert_eq!(
            normalize("T2DM with CKD stage 4"),
            "type 2 diabetes mellitus with chronic kidney disease stage 4"
        );
    }

    #[test]
    fn whole_word_only() {
        // "ca" must not expand inside "cardiac".
        assert_eq!(normalize("cardiac arrest"), "cardiac arrest");
        assert_eq!(normalize("breast ca"), "breast cancer");
    }

    #[test]
    fn phrase_synonyms_apply_before_tokens() {
        assert_eq!(normalize("High blood pressure"), "hypertension");
        assert_eq!(
            normalize("acute renal failure"),
            "acute kidney failure"
        );
    }

    #[test]
    fn punctuation_is_preserved() {
        assert_eq!(
            normalize("HTN, CHF."),
            "hypertension, congestive heart failure."
        );
    }
}
