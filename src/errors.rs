use thiserror::Error;

/// Why an import batch was refused. Nothing is written when any of these occur.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Expected a job object or an array of job objects")]
    UnsupportedShape,

    #[error("Item {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("Item {index} is missing required field(s): {}", .fields.join(", "))]
    MissingFields {
        index: usize,
        fields: Vec<&'static str>,
    },

    #[error("Item {index} has unknown status '{value}' (expected New, Applied, Interview, Rejected or Offer)")]
    InvalidStatus { index: usize, value: String },

    #[error("Item {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} items are invalid: {}", .0.len(), join_errors(.0))]
    Rejected(Vec<ImportError>),
}

fn join_errors(errors: &[ImportError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse failure for command-line values (status, priority, sort field, ...).
#[derive(Debug, Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
