//! Store error taxonomy
//!
//! Four failure classes with strict propagation rules: a validation failure
//! aborts only the enclosing write session; an observation failure keeps the
//! observer inactive; a lifecycle failure rejects calls on stopped or
//! not-yet-started observers; a storage failure surfaces to the caller of the
//! triggering operation without corrupting committed state.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed or incomplete payload; the enclosing write session aborts
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Initial fetch or registration failed; the observer never became active
    #[error("Observation failed: {0}")]
    Observation(String),

    /// Operation invoked on a stopped or not-yet-started observer
    #[error("Lifecycle violation: {0}")]
    Lifecycle(String),

    /// Underlying engine I/O failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Get an error code string for logging and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Observation(_) => "OBSERVATION_ERROR",
            Self::Lifecycle(_) => "LIFECYCLE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a lifecycle error
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
