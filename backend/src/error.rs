//! Unified error types for the TicketPro backend
//!
//! This module defines error types for each layer:
//! - `StoreError`: Entity store engine errors (in-memory or DynamoDB)
//! - `DecodeError`: Failures turning an untyped item into a domain entity
//! - `DirectoryError`: Identity directory errors
//! - `DomainError`: Core business logic errors
//! - `AppError`: Application layer errors (wraps domain and directory errors)
//! - `ConfigError`: Invalid environment configuration

use thiserror::Error;

/// Entity store errors
///
/// A missing key is not an error: reads return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Store temporarily unreachable or throttled. Retry with backoff.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Non-retryable infrastructure fault (missing table, bad credentials, ...)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A stored item lacks its primary key attributes
    #[error("Malformed item: {0}")]
    MalformedItem(String),
}

impl StoreError {
    /// Whether a subsequent attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors decoding an item into a typed entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Invalid attribute {name}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("Unknown record kind: {0}")]
    UnknownRecordKind(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Identity directory errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("An account with this email already exists")]
    UsernameExists,

    #[error("Password does not conform to policy: {}", .0.join(", "))]
    InvalidPassword(Vec<String>),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("User not found")]
    UserNotFound,

    #[error("User is not confirmed")]
    UserNotConfirmed,

    #[error("Invalid verification code")]
    CodeMismatch,

    #[error("Incorrect username or password")]
    NotAuthorized,

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Auth flow not supported: {0}")]
    UnsupportedAuthFlow(String),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Unavailable(_))
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => DomainError::Unavailable(msg),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<DecodeError> for DomainError {
    fn from(e: DecodeError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Application layer errors - returned by services
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Domain(e.into())
    }
}

impl From<DecodeError> for AppError {
    fn from(e: DecodeError) -> Self {
        AppError::Domain(e.into())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown store backend: {0} (expected \"memory\" or \"dynamodb\")")]
    UnknownBackend(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{set} is set but {missing} is not")]
    IncompletePair {
        set: &'static str,
        missing: &'static str,
    },
}
