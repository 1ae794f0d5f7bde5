//! Minimal in-memory store for engine unit tests.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::StorageError;

use super::{BoxReader, BoxWriter, Store};

type Blobs = Arc<Mutex<HashMap<String, Vec<u8>>>>;

#[derive(Clone)]
pub(crate) struct MemStore {
    id: String,
    blobs: Blobs,
    pub(crate) fail_remove: bool,
}

impl MemStore {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            blobs: Arc::default(),
            fail_remove: false,
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

struct MemWriter {
    key: String,
    buf: Vec<u8>,
    blobs: Blobs,
}

impl AsyncWrite for MemWriter {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let bytes = std::mem::take(&mut self.buf);
        let key = self.key.clone();
        self.blobs.lock().unwrap().insert(key, bytes);
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl Store for MemStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_read_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let bytes = self
            .blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(&self.id, key))?;
        Ok(Box::pin(io::Cursor::new(bytes)))
    }

    async fn create_write_stream(&self, key: &str) -> Result<BoxWriter, StorageError> {
        Ok(Box::pin(MemWriter {
            key: key.to_string(),
            buf: Vec::new(),
            blobs: self.blobs.clone(),
        }))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_remove {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "remove refused",
            )));
        }
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        if self.fail_remove {
            return Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "close refused")));
        }
        Ok(())
    }
}
