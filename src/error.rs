//! Error types for BookFlow
//!
//! One thiserror enum for the whole crate, with variants grouped by domain
//! (search API, sync, storage, validation). Callers that need to branch on
//! failure mode use the classification helpers rather than matching variants
//! directly.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, BookFlowError>;

/// Main error type for BookFlow
#[derive(Error, Debug)]
pub enum BookFlowError {
    // ===== Search API Errors =====

    /// Generic search request failure
    #[error("Search request failed: {message}")]
    SearchFailed {
        message: String,
        /// HTTP status code if available
        status_code: Option<u16>,
        /// Provider that failed (google-books, open-library, itunes)
        provider: Option<String>,
    },

    /// Provider returned invalid or unexpected response format
    #[error("Invalid search response: {message}")]
    InvalidSearchResponse {
        message: String,
        provider: String,
    },

    /// Provider rate limiting (HTTP 429)
    #[error("Rate limit exceeded for {provider}. Retry after {retry_after_seconds} seconds")]
    RateLimitExceeded {
        retry_after_seconds: u64,
        provider: String,
    },

    /// Network connectivity error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        /// Whether this error might be transient
        is_transient: bool,
    },

    // ===== Sync Errors =====

    /// Cloud sync request failed
    #[error("Sync request failed: {message}")]
    SyncFailed {
        message: String,
        status_code: Option<u16>,
        /// Collection being synced (books, shelves, challenge, ...)
        collection: Option<String>,
    },

    /// Remote snapshot was malformed
    #[error("Invalid sync snapshot: {0}")]
    InvalidSnapshot(String),

    /// Account deletion request was rejected by the backend
    #[error("Account deletion failed: {0}")]
    AccountDeletionFailed(String),

    // ===== Storage Errors =====

    /// Generic database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database record not found
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Local profile not found for username
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Generic file I/O error
    #[error("File I/O error: {0}")]
    FileIoError(String),

    // ===== Validation Errors =====

    /// Invalid data format or content
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Required field is missing
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Operation not allowed on a system shelf (rename/delete)
    #[error("Shelf '{0}' is a system shelf and cannot be modified")]
    SystemShelfImmutable(String),

    /// Sharing target is not an accepted buddy
    #[error("'{0}' is not an accepted buddy")]
    NotABuddy(String),

    /// Friend request already exists or is already resolved
    #[error("Friend request between '{from}' and '{to}' is already {state}")]
    DuplicateFriendRequest {
        from: String,
        to: String,
        state: String,
    },

    // ===== Configuration/State Errors =====

    /// Application state is invalid for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ===== General Errors =====

    /// Operation was cancelled by user or system
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation timed out
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Internal error that should not normally occur
    #[error("Internal error: {0}")]
    InternalError(String),

    // ===== External Library Errors =====

    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<std::num::ParseIntError> for BookFlowError {
    fn from(err: std::num::ParseIntError) -> Self {
        BookFlowError::InvalidInput(format!("Failed to parse integer: {}", err))
    }
}

impl From<chrono::ParseError> for BookFlowError {
    fn from(err: chrono::ParseError) -> Self {
        BookFlowError::InvalidInput(format!("Failed to parse date: {}", err))
    }
}

// Constructors and classification helpers
impl BookFlowError {
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        BookFlowError::RecordNotFound(resource.into())
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        BookFlowError::InvalidInput(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        BookFlowError::InternalError(message.into())
    }

    pub fn search_failed<S: Into<String>>(
        message: S,
        status_code: Option<u16>,
        provider: Option<String>,
    ) -> Self {
        BookFlowError::SearchFailed {
            message: message.into(),
            status_code,
            provider,
        }
    }

    pub fn sync_failed<S: Into<String>>(
        message: S,
        status_code: Option<u16>,
        collection: Option<String>,
    ) -> Self {
        BookFlowError::SyncFailed {
            message: message.into(),
            status_code,
            collection,
        }
    }

    pub fn network_error<S: Into<String>>(message: S, is_transient: bool) -> Self {
        BookFlowError::NetworkError {
            message: message.into(),
            is_transient,
        }
    }

    /// Whether retrying the same operation could plausibly succeed
    ///
    /// True for transient network failures, timeouts, 5xx responses and rate
    /// limiting; false for everything the caller did wrong.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookFlowError::NetworkError { is_transient: true, .. }
                | BookFlowError::Timeout(_)
                | BookFlowError::SearchFailed { status_code: Some(500..=599), .. }
                | BookFlowError::SyncFailed { status_code: Some(500..=599), .. }
                | BookFlowError::RateLimitExceeded { .. }
        )
    }

    /// Check if error is a local validation problem (bad input won't improve on retry)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            BookFlowError::InvalidData(_)
                | BookFlowError::InvalidInput(_)
                | BookFlowError::MissingRequiredField(_)
                | BookFlowError::SystemShelfImmutable(_)
                | BookFlowError::NotABuddy(_)
                | BookFlowError::DuplicateFriendRequest { .. }
        )
    }

    /// Server-provided retry delay, when the response carried one
    ///
    /// Errors without explicit timing return `None`; callers fall back to
    /// their own backoff.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            BookFlowError::RateLimitExceeded { retry_after_seconds, .. } => {
                Some(*retry_after_seconds)
            }
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    ///
    /// Actionable wording for the failures a user can do something about;
    /// everything else falls through to the Display form.
    pub fn user_message(&self) -> String {
        match self {
            BookFlowError::RateLimitExceeded { retry_after_seconds, provider } => {
                format!(
                    "{} is rate limiting searches. Please wait {} seconds before trying again.",
                    provider, retry_after_seconds
                )
            }
            BookFlowError::NetworkError { .. } => {
                "Network problem. Check your connection and try again.".to_string()
            }
            BookFlowError::SystemShelfImmutable(name) => {
                format!("The '{}' shelf is built in and cannot be changed.", name)
            }
            BookFlowError::NotABuddy(name) => {
                format!("You can only share with accepted buddies. '{}' has not accepted a request.", name)
            }
            BookFlowError::ProfileNotFound(username) => {
                format!("No local profile for '{}'. Create one first.", username)
            }
            _ => self.to_string(),
        }
    }
}
