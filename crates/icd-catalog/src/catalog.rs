//! Catalog loading and read operations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use icd_model::{ExclusionKind, ExclusionRelation};
use tracing::debug;

use crate::entry::{CodeEntry, CodeNotes, normalize_code, reference_matches};
use crate::error::CatalogError;

/// Seed catalog shipped with the crate. Covers every code the engine emits.
const EMBEDDED_CSV: &str = include_str!("../data/codes.csv");

/// Immutable code → metadata registry, loaded once and shared by reference.
///
/// All operations are pure reads; the catalog never changes after
/// construction, so a shared `&Catalog` is safe across threads without
/// locking.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, CodeEntry>,
}

impl Catalog {
    /// Build the catalog from the embedded seed data.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_csv_str(EMBEDDED_CSV, "embedded")
    }

    /// Load a catalog from a CSV file with the seed schema
    /// (`code,description,includes,excludes1,excludes2,use_additional,code_first`,
    /// multi-valued columns semicolon-separated).
    pub fn from_csv_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_str(&contents, &path.display().to_string())
    }

    fn from_csv_str(contents: &str, source_name: &str) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut entries = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| CatalogError::csv(source_name, e))?;
            let code = field(&record, 0);
            if code.is_empty() {
                return Err(CatalogError::csv(source_name, "row with empty code"));
            }
            let description = field(&record, 1);
            if description.is_empty() {
                return Err(CatalogError::InvalidRow {
                    code,
                    message: "missing description".to_string(),
                });
            }
            let entry = CodeEntry {
                code: code.clone(),
                description,
                notes: CodeNotes {
                    includes: split_list(&field(&record, 2)),
                    excludes1: split_list(&field(&record, 3)),
                    excludes2: split_list(&field(&record, 4)),
                    use_additional: split_list(&field(&record, 5)),
                    code_first: split_list(&field(&record, 6)),
                },
            };
            if entries.insert(normalize_code(&code), entry).is_some() {
                return Err(CatalogError::DuplicateCode { code });
            }
        }
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        debug!(source = source_name, codes = entries.len(), "catalog loaded");
        Ok(Self { entries })
    }

    /// Exact lookup, tolerant of case and the dot.
    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        self.entries.get(&normalize_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Description for a code, if listed.
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.get(code).map(|e| e.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in code order.
    pub fn entries(&self) -> impl Iterator<Item = &CodeEntry> {
        self.entries.values()
    }

    /// Concrete catalog codes covered by a note reference (exact code or
    /// family prefix), in code order.
    pub fn resolve_reference(&self, reference: &str) -> Vec<&CodeEntry> {
        self.entries
            .values()
            .filter(|entry| reference_matches(reference, &entry.code))
            .collect()
    }

    /// Exclusion relations declared on `code`, with references kept as
    /// written (a relation may name a family prefix).
    pub fn exclusions_for(&self, code: &str) -> Vec<ExclusionRelation> {
        let Some(entry) = self.get(code) else {
            return Vec::new();
        };
        let mut relations = Vec::new();
        for excluded in &entry.notes.excludes1 {
            relations.push(ExclusionRelation {
                code: entry.code.clone(),
                excluded_code: excluded.clone(),
                kind: ExclusionKind::Excludes1,
            });
        }
        for excluded in &entry.notes.excludes2 {
            relations.push(ExclusionRelation {
                code: entry.code.clone(),
                excluded_code: excluded.clone(),
                kind: ExclusionKind::Excludes2,
            });
        }
        relations
    }

    /// The exclusion kind relating two codes, if any, checking both
    /// directions. Excludes1 wins when both kinds are declared.
    pub fn relation_between(&self, a: &str, b: &str) -> Option<ExclusionKind> {
        let mut found = None;
        for (from, to) in [(a, b), (b, a)] {
            let Some(entry) = self.get(from) else { continue };
            if entry
                .notes
                .excludes1
                .iter()
                .any(|r| reference_matches(r, to))
            {
                return Some(ExclusionKind::Excludes1);
            }
            if entry
                .notes
                .excludes2
                .iter()
                .any(|r| reference_matches(r, to))
            {
                found = Some(ExclusionKind::Excludes2);
            }
        }
        found
    }

    /// "Use additional code" references declared on `code`.
    pub fn use_additional_for(&self, code: &str) -> &[String] {
        self.get(code)
            .map(|e| e.notes.use_additional.as_slice())
            .unwrap_or(&[])
    }

    /// "Code first" references declared on `code`.
    pub fn code_first_for(&self, code: &str) -> &[String] {
        self.get(code)
            .map(|e| e.notes.code_first.as_slice())
            .unwrap_or(&[])
    }
}

fn field(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").trim().to_string()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

static DEFAULT_CATALOG: OnceLock<Catalog> = OnceLock::new();

/// The shared default catalog, built from the embedded seed data on first
/// use. Concurrent first calls all observe the single completed load; the
/// embedded data is compile-time included, so a parse failure here is a
/// packaging defect and panics.
pub fn default_catalog() -> &'static Catalog {
    DEFAULT_CATALOG.get_or_init(|| Catalog::embedded().expect("embedded catalog is well-formed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = Catalog::embedded().expect("embedded catalog");
        assert!(catalog.len() > 100);
        assert!(catalog.contains("E11.22"));
        assert!(catalog.contains("e1122"));
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = Catalog::from_csv_str(
            "code,description,includes,excludes1,excludes2,use_additional,code_first\n",
            "test",
        );
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let csv = "code,description,includes,excludes1,excludes2,use_additional,code_first\n\
                   I10,Hypertension,,,,,\n\
                   I10,Hypertension again,,,,,\n";
        let result = Catalog::from_csv_str(csv, "test");
        assert!(matches!(result, Err(CatalogError::DuplicateCode { .. })));
    }

    #[test]
    fn relation_between_reads_both_directions() {
        let catalog = Catalog::embedded().expect("embedded catalog");
        // Declared on I10 only, via family references.
        assert_eq!(
            catalog.relation_between("I13.0", "I10"),
            Some(ExclusionKind::Excludes1)
        );
        assert_eq!(
            catalog.relation_between("J44.9", "J45.909"),
            Some(ExclusionKind::Excludes2)
        );
        assert_eq!(catalog.relation_between("I10", "N18.4"), None);
    }
}
