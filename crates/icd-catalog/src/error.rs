use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog CSV {source_name}: {message}")]
    Csv { source_name: String, message: String },

    #[error("invalid catalog row for {code}: {message}")]
    InvalidRow { code: String, message: String },

    #[error("duplicate code in catalog: {code}")]
    DuplicateCode { code: String },

    #[error("catalog is empty")]
    Empty,
}

impl CatalogError {
    pub(crate) fn csv(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Csv {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

/// Catalog failure is the fatal tier of the coding error model.
impl From<CatalogError> for icd_model::CodingError {
    fn from(err: CatalogError) -> Self {
        icd_model::CodingError::Catalog(err.to_string())
    }
}
