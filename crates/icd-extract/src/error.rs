use icd_model::CodingError;
use thiserror::Error;

/// Structural errors from the structured front-end parser.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("line {line} is not a 'Field: Value' pair: {content}")]
    MalformedLine { line: usize, content: String },

    #[error("line {line} has unknown field: {field}")]
    UnknownField { line: usize, field: String },

    #[error("line {line} has invalid value for {field}: {value}")]
    InvalidValue {
        line: usize,
        field: String,
        value: String,
    },
}

impl ExtractError {
    fn line(&self) -> usize {
        match self {
            Self::MalformedLine { line, .. }
            | Self::UnknownField { line, .. }
            | Self::InvalidValue { line, .. } => *line,
        }
    }
}

impl From<ExtractError> for CodingError {
    fn from(err: ExtractError) -> Self {
        CodingError::Parse {
            line: err.line(),
            message: err.to_string(),
        }
    }
}
