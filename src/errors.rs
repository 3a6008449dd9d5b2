use axum::http::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the event log into memory.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("event log '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read event log '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse event log '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: expected 5 columns, found {found}")]
    ColumnCount { line: u64, found: usize },

    #[error("line {line}: {column} is not an integer: '{value}'")]
    InvalidInteger {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: timestamp {value} is out of range")]
    TimestampOutOfRange { line: u64, value: i64 },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<DataLoadError> for AppError {
    fn from(err: DataLoadError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
