//! Error handling for the catalog mirror
//!
//! Provides a hierarchical error system: a top-level `AppError` plus
//! layer-specific error types for the repository and provider layers.

pub mod types;

pub use types::{AppError, RepositoryError, SourceError};

/// Convenience result type used throughout the application
pub type AppResult<T> = Result<T, AppError>;
