use std::sync::Arc;

use krawler_core::api::{HookContext, HookParams, Store, StoreRegistry, Target};
use serde_json::Value;

use crate::stores::MemoryStore;

/// Task context in the `before` phase with an empty store registry.
pub(crate) fn task_ctx(data: Value) -> HookContext {
    HookContext::new(Target::Tasks, data, HookParams::new(Arc::new(StoreRegistry::new())))
}

/// Task context whose chain store is `store`, also registered by id.
pub(crate) fn task_ctx_with_store(data: Value, store: &MemoryStore) -> HookContext {
    let registry = Arc::new(StoreRegistry::new());
    let store: Arc<dyn Store> = Arc::new(store.clone());
    registry.insert(store.clone()).unwrap();
    HookContext::new(Target::Tasks, data, HookParams::new(registry).with_store(Some(store)))
}
