//! Error types for ingestion, external services and configuration.
//!
//! None of these reach the user as dialogs: ingestion errors become in-card
//! error state, service errors degrade to fallback content.

use thiserror::Error;

/// Errors raised while turning a pasted/dropped payload into card content
#[derive(Error, Debug)]
pub enum IngestError {
    /// IO error from std::io
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet or delimited-text parse failure
    #[error("Parse error: {0}")]
    Parse(String),

    /// File bytes could not be decoded (corrupt PDF or image)
    #[error("Could not decode {file_name}: {reason}")]
    Decode { file_name: String, reason: String },

    /// File type not handled by any pipeline
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    /// Pasted text looked like a URL but did not parse
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Workbook contained no sheets with data
    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    /// Too many rows for eager loading
    #[error("Too many rows: {rows} (max {max_rows})")]
    TooManyRows { rows: usize, max_rows: usize },
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors from the external collaborators (enhancement service, relays)
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Unexpected status {status}")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Missing API key in ${var}")]
    MissingApiKey { var: String },

    #[error("All {attempts} attempts failed")]
    AllRelaysFailed { attempts: usize },
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Http(e.to_string())
    }
}

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors loading, saving or watching the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No config directory on this platform")]
    NoConfigDir,

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}
