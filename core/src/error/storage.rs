use thiserror::Error;

use super::code::ErrorCode;

/// Errors raised by store backends and the store registry.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("key '{key}' not found in store '{store}'")]
    NotFound { store: String, key: String },

    #[error("can't find store with id '{0}'")]
    StoreNotFound(String),

    #[error("store with id '{0}' already exists")]
    StoreExists(String),

    #[error("store '{store}' does not support {capability}")]
    Unsupported {
        store: String,
        capability: &'static str,
    },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::StorageError,
            Self::StoreNotFound(_) => ErrorCode::StoreNotFound,
            Self::StoreExists(_) => ErrorCode::StoreExists,
            Self::Unsupported { .. } => ErrorCode::UnsupportedCapability,
            Self::Io(_) => ErrorCode::StorageError,
        }
    }

    pub fn not_found(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            store: store.into(),
            key: key.into(),
        }
    }
}
