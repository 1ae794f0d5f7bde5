use std::sync::Arc;

use serde_json::Value;

use crate::error::{EngineError, StorageError};
use crate::store::{Store, StoreRegistry};

/// Store management: create, get and remove stores by id.
#[derive(Debug, Clone)]
pub struct StoresService {
    registry: Arc<StoreRegistry>,
}

impl StoresService {
    pub fn new(registry: Arc<StoreRegistry>) -> Self {
        Self { registry }
    }

    /// Fails if `id` is already registered or no backend exists for `kind`
    /// (which defaults to `id`).
    pub fn create(&self, id: &str, kind: Option<&str>, options: &Value) -> Result<Arc<dyn Store>, EngineError> {
        self.registry.create(id, kind, options)
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Store>, StorageError> {
        self.registry.get(id)
    }

    /// Unregister `id`, then release the backend. Only an unknown id fails;
    /// a backend cleanup failure is logged.
    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let store = self.registry.remove(id)?;
        if let Err(err) = store.close().await {
            tracing::warn!(target: "krawler.stores", store = %id, error = %err, "store cleanup failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemStore;

    #[tokio::test]
    async fn remove_is_strict_on_id_lenient_on_cleanup() {
        let registry = Arc::new(StoreRegistry::new());
        let mut store = MemStore::new("mem");
        store.fail_remove = true;
        registry.insert(Arc::new(store)).unwrap();
        let service = StoresService::new(registry);

        service.remove("mem").await.unwrap();
        assert!(matches!(service.get("mem"), Err(StorageError::StoreNotFound(_))));
        assert!(matches!(
            service.remove("mem").await,
            Err(StorageError::StoreNotFound(_))
        ));
    }
}
