//! # Registry Errors

use std::num::ParseIntError;

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The short name and version are already bound to another full name.
    #[error("Policy '{short_name}' version {version} is already registered as '{existing_full_name}', refusing '{full_name}'")]
    Conflict {
        short_name: String,
        version: String,
        existing_full_name: String,
        full_name: String,
    },

    #[error("Invalid policy version '{0}': expected <major>.<minor>.<patch>")]
    InvalidVersion(String),

    /// A major-only version spec that is not an unsigned integer.
    #[error("Invalid version spec '{spec}': {source}")]
    InvalidVersionSpec {
        spec: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::Conflict { .. } => 409,
            RegistryError::InvalidVersion(_) => 400,
            RegistryError::InvalidVersionSpec { .. } => 400,
            RegistryError::Internal(_) => 500,
        }
    }

    /// Conflicts are configuration errors; retrying the same registration cannot succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Internal(_))
    }

    pub(crate) fn poisoned() -> Self {
        RegistryError::Internal("Lock poisoned".into())
    }
}
