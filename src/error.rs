use thiserror::Error;

use crate::check::ExecMode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to decode {type_name} value: {reason}")]
    Decode { type_name: String, reason: String },
    #[error("query `{sql}` returned {count} rows, expected exactly one")]
    RowCount { sql: String, count: usize },
    #[error("check `{case}` ({mode}): expected {expected} columns, got {actual}")]
    ColumnCount {
        case: String,
        mode: ExecMode,
        expected: usize,
        actual: usize,
    },
    #[error("check `{case}` ({mode}) column {column}: expected {expected}, got {actual}")]
    Mismatch {
        case: String,
        mode: ExecMode,
        column: usize,
        expected: String,
        actual: String,
    },
    #[error("check `{case}` column {column}: binary decoded {binary}, text decoded {text}")]
    Disagreement {
        case: String,
        column: usize,
        binary: String,
        text: String,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn decode(type_name: impl Into<String>, reason: impl ToString) -> Self {
        Error::Decode {
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }
}
