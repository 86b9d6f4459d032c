//! Error type definitions for the catalog mirror
//!
//! All error types used throughout the application live here. The hierarchy
//! mirrors the layering of the system: provider client errors stay inside
//! `SourceError`, persistence errors inside `RepositoryError`, and `AppError`
//! is the top-level type services return across module boundaries.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Provider client errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// Constraint violations (unique, foreign key)
    #[error("Constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },
}

/// Provider client specific errors
///
/// The login flow depends on these variants staying distinguishable:
/// `AuthenticationFailed` (the server rejected the credentials),
/// `Network` (the server was never reached), and `MissingAccountInfo`
/// (a 2xx response that carried no usable account data).
#[derive(Error, Debug)]
pub enum SourceError {
    /// The provider rejected the request with a non-2xx status during login
    #[error("Authentication failed: HTTP {status} - {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// A 2xx authentication response without a usable `user_info` block
    #[error("Server reachable but returned no usable account info")]
    MissingAccountInfo,

    /// Transport-level failure (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx response from a catalog endpoint
    #[error("Provider error: HTTP {status} - {body}")]
    Http { status: u16, body: String },

    /// Response body did not decode as the expected JSON shape
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Malformed provider URL
    #[error("Invalid provider URL: {message}")]
    InvalidUrl { message: String },
}

impl SourceError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }
}
