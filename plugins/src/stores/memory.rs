use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use krawler_core::api::{BoxReader, BoxWriter, EngineError, StorageError, Store, StoreFactory};
use serde_json::Value;
use tokio::io::AsyncWrite;

type Blobs = Arc<RwLock<HashMap<String, Bytes>>>;

/// Process-local store. Has no `path` capability.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    id: String,
    blobs: Blobs,
}

impl MemoryStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blobs: Arc::default(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// Buffers writes; the blob becomes visible on shutdown.
struct MemoryWriter {
    key: String,
    buf: BytesMut,
    blobs: Blobs,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let blob = self.buf.split().freeze();
        let key = self.key.clone();
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, blob);
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_read_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let blob = self
            .blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(&self.id, key))?;
        Ok(Box::pin(io::Cursor::new(blob)))
    }

    async fn create_write_stream(&self, key: &str) -> Result<BoxWriter, StorageError> {
        Ok(Box::pin(MemoryWriter {
            key: key.to_string(),
            buf: BytesMut::new(),
            blobs: self.blobs.clone(),
        }))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(&self.id, key))
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.blobs.write().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn kind(&self) -> &str {
        "memory"
    }

    fn create(&self, id: &str, _options: &Value) -> Result<Arc<dyn Store>, EngineError> {
        Ok(Arc::new(MemoryStore::new(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krawler_core::api::{read_to_bytes, write_bytes};

    #[tokio::test]
    async fn blob_visible_after_shutdown_only() {
        use tokio::io::AsyncWriteExt;

        let store = MemoryStore::new("memory");
        let mut writer = store.create_write_stream("a").await.unwrap();
        writer.write_all(b"partial").await.unwrap();
        assert!(store.keys().is_empty());
        writer.shutdown().await.unwrap();
        assert_eq!(read_to_bytes(&store, "a").await.unwrap(), b"partial");
    }

    #[tokio::test]
    async fn remove_and_close() {
        let store = MemoryStore::new("memory");
        write_bytes(&store, "a", b"1").await.unwrap();
        write_bytes(&store, "b", b"2").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(matches!(store.remove("a").await, Err(StorageError::NotFound { .. })));
        store.close().await.unwrap();
        assert!(store.keys().is_empty());
        assert!(store.path().is_none());
    }
}
