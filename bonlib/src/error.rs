//! Единый тип ошибок публичного API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("entry without id at position {0}")]
    MissingId(usize),

    #[error("receipt not found: {0}")]
    NotFound(String),

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("store failure during {op}: {reason}")]
    Store { op: &'static str, reason: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl BonError {
    /// Ошибки, после которых ledger надо перечитать из хранилища.
    pub fn is_persistence(&self) -> bool {
        matches!(self, BonError::Store { .. } | BonError::Io(_) | BonError::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, BonError>;
