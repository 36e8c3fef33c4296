//! Error types for configuration and use-case loading.
//!
//! Permission compilation and lookups are total and never fail.

use thiserror::Error;

/// Errors raised while parsing permissions use cases.
#[derive(Debug, Error)]
pub enum UseCaseError {
    /// The use-case document is not valid JSON or does not match the schema.
    #[error("invalid permissions use cases: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Errors raised while loading [`PermissionsConfig`](crate::PermissionsConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not read or extract the configuration.
    #[error("failed to load permissions configuration: {0}")]
    Load(#[from] figment::Error),

    /// The embedded use-case document is invalid.
    #[error(transparent)]
    UseCases(#[from] UseCaseError),
}
