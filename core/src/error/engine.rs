use thiserror::Error;

use crate::hooks::{Phase, Target};

use super::code::ErrorCode;
use super::storage::StorageError;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Unknown hook/store/task kind or a malformed hook configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A hook was invoked outside the phase(s) it is written for.
    #[error("the '{hook}' hook should only be used as a '{expected}' hook (invoked as '{actual}')")]
    PhaseMismatch {
        hook: String,
        expected: String,
        actual: Phase,
    },

    /// Malformed job or task input.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Opaque failure raised by a pluggable hook or task kind.
    #[error("{0}")]
    Domain(#[from] anyhow::Error),

    /// Failure of a named hook, located by target and phase.
    #[error("{target} {phase} hook '{hook}' failed: {source}")]
    Hook {
        target: Target,
        phase: Phase,
        hook: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn domain(msg: impl std::fmt::Display) -> Self {
        Self::Domain(anyhow::anyhow!("{msg}"))
    }

    /// Innermost error, looking through `Hook` wrappers.
    pub fn root(&self) -> &EngineError {
        match self {
            Self::Hook { source, .. } => source.root(),
            other => other,
        }
    }

    /// Map engine error to its error code, using the root cause.
    pub fn error_code(&self) -> ErrorCode {
        match self.root() {
            Self::Configuration(_) => ErrorCode::ConfigurationError,
            Self::PhaseMismatch { .. } => ErrorCode::PhaseMismatch,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Storage(e) => e.error_code(),
            Self::Domain(_) => ErrorCode::DomainError,
            Self::Hook { .. } => ErrorCode::GeneralError,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(StorageError::Io(err))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}
