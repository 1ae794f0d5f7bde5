use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{EngineError, StorageError};

pub type BoxReader = Pin<Box<dyn AsyncRead + Send>>;
pub type BoxWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Storage contract every backend satisfies.
///
/// A blob written through [`Store::create_write_stream`] becomes visible once
/// the writer has been shut down (`AsyncWriteExt::shutdown`).
#[async_trait]
pub trait Store: Send + Sync {
    /// Registry id of this store.
    fn id(&self) -> &str;

    async fn create_read_stream(&self, key: &str) -> Result<BoxReader, StorageError>;

    async fn create_write_stream(&self, key: &str) -> Result<BoxWriter, StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Release backend resources once the store has been unregistered.
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Root directory for filesystem-backed stores.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Root directory, or a clear error when the backend has none.
    fn require_path(&self) -> Result<&Path, StorageError> {
        self.path().ok_or_else(|| StorageError::Unsupported {
            store: self.id().to_string(),
            capability: "direct path access",
        })
    }
}

impl std::fmt::Debug for dyn Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id())
            .field("path", &self.path())
            .finish()
    }
}

/// Builds a store of one backend type from its declarative options.
pub trait StoreFactory: Send + Sync {
    /// Backend type name (`fs`, `memory`, ...).
    fn kind(&self) -> &str;

    fn create(&self, id: &str, options: &Value) -> Result<Arc<dyn Store>, EngineError>;
}
