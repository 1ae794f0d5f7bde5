use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use krawler_core::api::{BoxReader, BoxWriter, EngineError, StorageError, Store, StoreFactory};
use serde::Deserialize;
use serde_json::Value;

/// Store keeping each blob as a file below a root directory. Keys may contain
/// `/` to address sub directories.
#[derive(Debug)]
pub struct FsStore {
    id: String,
    root: PathBuf,
}

impl FsStore {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid key '{key}' for store '{}'", self.id),
            )));
        }
        Ok(self.root.join(relative))
    }

    fn map_not_found(&self, key: &str, err: io::Error) -> StorageError {
        if err.kind() == io::ErrorKind::NotFound {
            StorageError::not_found(&self.id, key)
        } else {
            StorageError::Io(err)
        }
    }
}

#[async_trait]
impl Store for FsStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_read_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let path = self.file_path(key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| self.map_not_found(key, e))?;
        Ok(Box::pin(file))
    }

    async fn create_write_stream(&self, key: &str) -> Result<BoxWriter, StorageError> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(&path).await?;
        Ok(Box::pin(file))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.file_path(key)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| self.map_not_found(key, e))?;
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        tracing::debug!(target: "krawler.stores", store = %self.id, key, "removed");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[derive(Debug, Deserialize)]
struct FsOptions {
    path: PathBuf,
}

/// Builds [`FsStore`]s from `{ "path": "<root dir>" }`; the root is created
/// when missing.
pub struct FsStoreFactory;

impl StoreFactory for FsStoreFactory {
    fn kind(&self) -> &str {
        "fs"
    }

    fn create(&self, id: &str, options: &Value) -> Result<Arc<dyn Store>, EngineError> {
        let opts: FsOptions = serde_json::from_value(options.clone()).map_err(|e| {
            EngineError::configuration(format!("invalid options for fs store '{id}': {e}"))
        })?;
        std::fs::create_dir_all(&opts.path)?;
        Ok(Arc::new(FsStore::new(id, opts.path)))
    }
}
