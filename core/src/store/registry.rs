use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{EngineError, StorageError};

use super::contract::{Store, StoreFactory};

/// Live stores keyed by id, plus the factories able to build them.
///
/// One registry is shared by every job of a process. Backends are built
/// outside the lock; the id is checked again and inserted under a single
/// write lock, so concurrent creations of the same id yield exactly one
/// store and `StoreExists` for the others.
#[derive(Default)]
pub struct StoreRegistry {
    factories: RwLock<HashMap<String, Arc<dyn StoreFactory>>>,
    stores: RwLock<HashMap<String, Arc<dyn Store>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend factory under its kind; last registration wins.
    pub fn register_factory(&self, factory: Arc<dyn StoreFactory>) {
        let kind = factory.kind().to_string();
        tracing::debug!(target: "krawler.stores", kind = %kind, "register store factory");
        self.factories
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, factory);
    }

    /// Create and register a store. `kind` defaults to `id`.
    pub fn create(
        &self,
        id: &str,
        kind: Option<&str>,
        options: &Value,
    ) -> Result<Arc<dyn Store>, EngineError> {
        if self.contains(id) {
            return Err(exists(id).into());
        }
        let kind = kind.unwrap_or(id);
        let factory = self
            .factories
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(kind)
            .cloned()
            .ok_or_else(|| {
                EngineError::configuration(format!("can't find store generator for store type '{kind}'"))
            })?;

        let store = factory.create(id, options)?;

        let mut stores = self.stores.write().unwrap_or_else(|e| e.into_inner());
        if stores.contains_key(id) {
            return Err(exists(id).into());
        }
        stores.insert(id.to_string(), store.clone());
        tracing::info!(target: "krawler.stores", store = %id, kind = %kind, "store created");
        Ok(store)
    }

    /// Register an already-built store under its own id.
    pub fn insert(&self, store: Arc<dyn Store>) -> Result<(), StorageError> {
        let mut stores = self.stores.write().unwrap_or_else(|e| e.into_inner());
        let id = store.id().to_string();
        if stores.contains_key(&id) {
            return Err(StorageError::StoreExists(id));
        }
        stores.insert(id, store);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stores
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Store>, StorageError> {
        self.stores
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::StoreNotFound(id.to_string()))
    }

    /// Unregister a store and hand it back to the caller.
    pub fn remove(&self, id: &str) -> Result<Arc<dyn Store>, StorageError> {
        let removed = self
            .stores
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .ok_or_else(|| StorageError::StoreNotFound(id.to_string()))?;
        tracing::info!(target: "krawler.stores", store = %id, "store removed");
        Ok(removed)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .stores
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

fn exists(id: &str) -> StorageError {
    tracing::debug!(target: "krawler.stores", store = %id, "store already exists");
    StorageError::StoreExists(id.to_string())
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxReader, BoxWriter};
    use async_trait::async_trait;
    use serde_json::json;

    struct NullStore(String);

    #[async_trait]
    impl Store for NullStore {
        fn id(&self) -> &str {
            &self.0
        }
        async fn create_read_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
            Err(StorageError::not_found(&self.0, key))
        }
        async fn create_write_stream(&self, _key: &str) -> Result<BoxWriter, StorageError> {
            Ok(Box::pin(tokio::io::sink()))
        }
        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    struct NullFactory;

    impl StoreFactory for NullFactory {
        fn kind(&self) -> &str {
            "null"
        }
        fn create(&self, id: &str, _options: &Value) -> Result<Arc<dyn Store>, EngineError> {
            Ok(Arc::new(NullStore(id.to_string())))
        }
    }

    fn registry() -> StoreRegistry {
        let registry = StoreRegistry::new();
        registry.register_factory(Arc::new(NullFactory));
        registry
    }

    #[test]
    fn create_get_remove() {
        let registry = registry();
        registry.create("out", Some("null"), &json!({})).unwrap();
        assert_eq!(registry.get("out").unwrap().id(), "out");
        registry.remove("out").unwrap();
        assert!(matches!(registry.get("out"), Err(StorageError::StoreNotFound(_))));
        assert!(matches!(registry.remove("out"), Err(StorageError::StoreNotFound(_))));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = registry();
        registry.create("out", Some("null"), &json!({})).unwrap();
        let err = registry.create("out", Some("null"), &json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Storage(StorageError::StoreExists(_))));
    }

    #[test]
    fn existing_id_wins_over_unknown_kind() {
        let registry = registry();
        registry.create("out", Some("null"), &json!({})).unwrap();
        let err = registry.create("out", Some("s3"), &json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Storage(StorageError::StoreExists(_))));
    }

    #[test]
    fn factory_runs_without_holding_the_registry_lock() {
        struct Reentrant(Arc<StoreRegistry>);

        impl StoreFactory for Reentrant {
            fn kind(&self) -> &str {
                "reentrant"
            }
            fn create(&self, id: &str, _options: &Value) -> Result<Arc<dyn Store>, EngineError> {
                // Blocks forever if the stores lock is held here.
                assert!(!self.0.contains(id));
                Ok(Arc::new(NullStore(id.to_string())))
            }
        }

        let registry = Arc::new(registry());
        registry.register_factory(Arc::new(Reentrant(registry.clone())));
        registry.create("r", Some("reentrant"), &json!({})).unwrap();
        assert_eq!(registry.ids(), vec!["r"]);
    }

    #[test]
    fn kind_defaults_to_id() {
        let registry = registry();
        registry.create("null", None, &json!({})).unwrap();
        let err = registry.create("s3", None, &json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn concurrent_creation_has_a_single_winner() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.create("shared", Some("null"), &json!({})).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn missing_path_capability_is_reported() {
        let store = NullStore("mem".into());
        assert!(matches!(
            store.require_path(),
            Err(StorageError::Unsupported { .. })
        ));
    }
}
