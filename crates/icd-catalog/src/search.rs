//! Ranked free-text search over the catalog.
//!
//! Scoring is tiered: an exact code match outranks a code-prefix match,
//! which outranks a description prefix, a description substring, and
//! finally token overlap. Ties break by code order so results are stable
//! across runs.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::entry::{CodeEntry, normalize_code};

const EXACT_CODE_SCORE: f64 = 1.0;
const CODE_PREFIX_SCORE: f64 = 0.92;
const DESCRIPTION_PREFIX_SCORE: f64 = 0.85;
const SUBSTRING_SCORE: f64 = 0.7;
const TOKEN_OVERLAP_WEIGHT: f64 = 0.6;
/// Includes-note terms are weaker evidence than the description itself.
const INCLUDES_DAMPING: f64 = 0.9;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub code: String,
    pub description: String,
    pub score: f64,
}

impl Catalog {
    /// Ranked free-text search. Returns at most `limit` hits, best first;
    /// an empty or stopword-only query returns nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let trimmed = query.trim();
        if trimmed.is_empty() || limit == 0 {
            return Vec::new();
        }
        let code_query = normalize_code(trimmed);
        let text_query = trimmed.to_lowercase();
        let query_tokens = token_set(&text_query);

        let mut hits: Vec<SearchHit> = self
            .entries()
            .filter_map(|entry| {
                let score = score_entry(entry, &code_query, &text_query, &query_tokens);
                (score > 0.0).then(|| SearchHit {
                    code: entry.code.clone(),
                    description: entry.description.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.code.cmp(&b.code))
        });
        hits.truncate(limit);
        hits
    }
}

fn score_entry(
    entry: &CodeEntry,
    code_query: &str,
    text_query: &str,
    query_tokens: &BTreeSet<String>,
) -> f64 {
    let normalized = normalize_code(&entry.code);
    if !code_query.is_empty() && normalized == code_query {
        return EXACT_CODE_SCORE;
    }
    if code_query.len() >= 3 && normalized.starts_with(code_query) {
        return CODE_PREFIX_SCORE;
    }

    let description = entry.description.to_lowercase();
    let direct = score_text(&description, text_query, query_tokens);
    let from_includes = entry
        .notes
        .includes
        .iter()
        .map(|term| score_text(&term.to_lowercase(), text_query, query_tokens) * INCLUDES_DAMPING)
        .fold(0.0, f64::max);
    direct.max(from_includes)
}

fn score_text(text: &str, query: &str, query_tokens: &BTreeSet<String>) -> f64 {
    if text.starts_with(query) {
        return DESCRIPTION_PREFIX_SCORE;
    }
    if text.contains(query) {
        return SUBSTRING_SCORE;
    }
    if query_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens = token_set(text);
    let overlap = query_tokens.intersection(&text_tokens).count();
    TOKEN_OVERLAP_WEIGHT * overlap as f64 / query_tokens.len() as f64
}

fn token_set(raw: &str) -> BTreeSet<String> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 1 && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

fn is_stopword(token: &str) -> bool {
    matches!(
        token,
        "of" | "and" | "the" | "to" | "with" | "without" | "in" | "or" | "due" | "unspecified"
    )
}
