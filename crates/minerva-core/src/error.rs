use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents every failure that can abort a harvest, an export or an
/// upload. Conditions that only skip a record (missing title) or that are
/// tallied for curation (unknown vocabulary values) are not errors and never
/// appear here.
///
/// # Error Conversion
///
/// Most errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `std::io::Error` → `AppError::IoError`
/// - `csv::Error` → `AppError::CsvError`
///
/// # Examples
///
/// ```no_run
/// use minerva_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// SQLite operation on the full-text index failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// HTTP client request failed.
    ///
    /// This error occurs when HTTP requests fail due to network issues,
    /// timeouts, or server errors.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// Gemini API call failed.
    ///
    /// Covers authentication failures and API-level errors reported in the
    /// response body.
    #[error("Gemini error: {0}")]
    GeminiError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A curation sheet could not be read as CSV/TSV.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A file size did not use the only supported `"<number> MB"` form.
    #[error("Invalid file size: {0:?}")]
    InvalidFileSize(String),

    /// A source row contained unparsable input.
    ///
    /// The location has the form `file:line` so curators can fix the sheet.
    #[error("Invalid row at {location}: {reason}")]
    InvalidRow { location: String, reason: String },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The instance registry or another configuration file is malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upload credentials were not supplied.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// API response contained no data.
    #[error("Empty response from API")]
    EmptyResponse,

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("unable to open") {
                    "Cannot open the full-text index.\n   Check that the output directory is writable.".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The catalog may be slow or unreachable.\n   Try again later."
                        .to_string()
                } else if msg.contains("connect") {
                    format!(
                        "Cannot connect to catalog: {}\n   Check your internet connection and the instance URL.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::GeminiError(msg) => {
                if msg.contains("401") || msg.contains("Unauthorized") || msg.contains("API key") {
                    "Invalid Gemini API key.\n   Check your GEMINI_API_KEY environment variable."
                        .to_string()
                } else {
                    format!("Gemini error: {}", msg)
                }
            }
            AppError::InvalidFileSize(value) => {
                format!(
                    "Unsupported file size {:?}.\n   Only values like \"12.5 MB\" are accepted.",
                    value
                )
            }
            AppError::InvalidRow { location, reason } => {
                format!("{}: {}\n   Fix the curation sheet and run again.", location, reason)
            }
            AppError::MissingCredentials(what) => {
                format!(
                    "Missing credentials: {}\n   Set TESS_EMAIL and TESS_API_KEY (or pass --email / --api-key).",
                    what
                )
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The server may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            AppError::EmptyResponse => {
                "The API returned no data. The catalog may be temporarily unavailable.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use minerva_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::InvalidFileSize("12 GB".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_error() {
        let err = AppError::Generic("Something went wrong".to_string());
        assert_eq!(err.to_string(), "Error: Something went wrong");
    }

    #[test]
    fn test_empty_response_error() {
        let err = AppError::EmptyResponse;
        assert_eq!(err.to_string(), "Empty response from API");
    }

    #[test]
    fn test_invalid_file_size_display() {
        let err = AppError::InvalidFileSize("3 GB".to_string());
        assert_eq!(err.to_string(), "Invalid file size: \"3 GB\"");
    }

    #[test]
    fn test_invalid_row_display() {
        let err = AppError::InvalidRow {
            location: "sheet.csv:7".to_string(),
            reason: "bad size".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid row at sheet.csv:7: bad size");
        assert!(err.user_message().starts_with("sheet.csv:7: bad size"));
    }

    #[test]
    fn test_user_message_gemini_auth() {
        let err = AppError::GeminiError("401 Unauthorized".to_string());
        let msg = err.user_message();
        assert!(msg.contains("Invalid Gemini API key"));
    }

    #[test]
    fn test_user_message_missing_credentials() {
        let err = AppError::MissingCredentials("TeSS email".to_string());
        assert!(err.user_message().contains("TESS_EMAIL"));
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::IoError(_)));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppError::NetworkError("timeout".to_string()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::RateLimitExceeded.is_retryable());
        assert!(!AppError::InvalidUrl("bad".to_string()).is_retryable());
        assert!(!AppError::MissingCredentials("x".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_error() {
        let err = AppError::Timeout(30);
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
