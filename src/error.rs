//! Failure kinds for the store, report and spreadsheet layers.
//!
//! Front-ends wrap these in `anyhow` and render them as messages; nothing in
//! here is meant to reach the user as a panic.

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Input that can never be stored (bad amount, empty name, bad date).
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {name}")]
    Duplicate { entity: &'static str, name: String },

    /// A category or payment method still referenced by expenses.
    #[error("{entity} {id} is used by {count} expense(s) and cannot be deleted")]
    InUse {
        entity: &'static str,
        id: i64,
        count: i64,
    },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            name: name.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::Import(err.to_string())
    }
}

impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        Self::Import(err.to_string())
    }
}

impl From<calamine::XlsxError> for AppError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::Import(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(err.to_string())
    }
}

pub(crate) type AppResult<T> = Result<T, AppError>;
