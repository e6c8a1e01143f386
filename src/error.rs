// src/error.rs

//! Unified error handling for waitlog.
//!
//! `AppError` covers the plumbing failures (I/O, HTTP, parsing). The run
//! taxonomy sits beside it:
//!
//! - [`ConfigError`]: missing or invalid settings, mapping or credentials.
//!   Raised before any network call.
//! - [`ResolutionError`]: no usable ledger for the current year.
//! - [`SourceError`]: upstream unreachable or malformed. Absorbed by the
//!   status adapter and never returned from a run.
//! - [`WriteFailure`]: the ledger rejected or failed the write.

use std::fmt;

use thiserror::Error;

/// Result type alias for waitlog operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Pre-flight configuration failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings failed validation
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Year mapping absent or unparseable
    #[error(transparent)]
    Mapping(#[from] ResolutionError),

    /// Ledger credentials absent or structurally invalid
    #[error("credentials unusable: {0}")]
    Credentials(String),

    /// A client could not be constructed from the settings
    #[error("client setup failed: {0}")]
    Client(#[from] AppError),
}

/// Failure to determine which ledger this run writes to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The year mapping was not supplied or is not a valid JSON object.
    #[error("year-to-ledger mapping missing or unparseable: {reason}")]
    MissingMapping { reason: String },

    /// The mapping exists but has no ledger for this year.
    #[error(
        "no ledger provisioned for {year}; create one and add \"{year}\" to the year mapping"
    )]
    NoEntryForYear { year: String },
}

/// Failure to obtain live data from upstream.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Connection, TLS or timeout failure
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Body was not a recognized live-data payload
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Diagnosable category of a ledger write failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCategory {
    Auth,
    NotFound,
    Transient,
    Unknown,
}

impl WriteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteCategory::Auth => "AUTH",
            WriteCategory::NotFound => "NOT_FOUND",
            WriteCategory::Transient => "TRANSIENT",
            WriteCategory::Unknown => "UNKNOWN",
        }
    }

    /// Categorize an HTTP status returned by a ledger backend.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => WriteCategory::Auth,
            404 => WriteCategory::NotFound,
            408 | 429 | 500..=599 => WriteCategory::Transient,
            _ => WriteCategory::Unknown,
        }
    }
}

impl fmt::Display for WriteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger write that did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{category}] {message}")]
pub struct WriteFailure {
    pub category: WriteCategory,
    pub message: String,
}

impl WriteFailure {
    pub fn new(category: WriteCategory, message: impl fmt::Display) -> Self {
        Self {
            category,
            message: message.to_string(),
        }
    }

    pub fn auth(message: impl fmt::Display) -> Self {
        Self::new(WriteCategory::Auth, message)
    }

    pub fn not_found(message: impl fmt::Display) -> Self {
        Self::new(WriteCategory::NotFound, message)
    }

    pub fn transient(message: impl fmt::Display) -> Self {
        Self::new(WriteCategory::Transient, message)
    }

    pub fn unknown(message: impl fmt::Display) -> Self {
        Self::new(WriteCategory::Unknown, message)
    }

    /// Categorize a transport-level failure from reqwest.
    pub fn from_reqwest(context: &str, error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::new(
                WriteCategory::from_http_status(status.as_u16()),
                format!("{context}: {error}"),
            );
        }
        if error.is_timeout() || error.is_connect() || error.is_request() {
            return Self::transient(format!("{context}: {error}"));
        }
        Self::unknown(format!("{context}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_categories() {
        assert_eq!(WriteCategory::from_http_status(401), WriteCategory::Auth);
        assert_eq!(WriteCategory::from_http_status(403), WriteCategory::Auth);
        assert_eq!(WriteCategory::from_http_status(404), WriteCategory::NotFound);
        assert_eq!(WriteCategory::from_http_status(429), WriteCategory::Transient);
        assert_eq!(WriteCategory::from_http_status(503), WriteCategory::Transient);
        assert_eq!(WriteCategory::from_http_status(400), WriteCategory::Unknown);
    }

    #[test]
    fn test_no_entry_message_names_year() {
        let err = ResolutionError::NoEntryForYear {
            year: "2026".to_string(),
        };
        assert!(err.to_string().contains("2026"));
    }

    #[test]
    fn test_write_failure_display() {
        let failure = WriteFailure::auth("token rejected");
        assert_eq!(failure.to_string(), "[AUTH] token rejected");
    }
}
