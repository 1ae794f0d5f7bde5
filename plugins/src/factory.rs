use std::sync::Arc;

use anyhow::Result;
use krawler_core::api::{Krawler, StoreFactory, StoreRegistry};

use crate::hooks::register_builtin_hooks;
use crate::stores::{FsStoreFactory, MemoryStoreFactory};
use crate::tasks::register_builtin_task_kinds;

pub fn build_store_factories() -> Vec<Arc<dyn StoreFactory>> {
    vec![Arc::new(FsStoreFactory), Arc::new(MemoryStoreFactory)]
}

pub fn register_store_factories(registry: &StoreRegistry) {
    for factory in build_store_factories() {
        registry.register_factory(factory);
    }
}

/// Register built-in store backends, hooks and task kinds into the
/// registries of `krawler`. Registering again is harmless: later
/// registrations replace earlier ones.
pub fn register_builtins(krawler: &Krawler) -> Result<()> {
    register_store_factories(krawler.store_registry());
    register_builtin_hooks(krawler.hook_registry());
    register_builtin_task_kinds(krawler.task_kinds())?;
    tracing::debug!(
        target: "krawler.hooks",
        hooks = ?krawler.hook_registry().names(),
        task_kinds = ?krawler.task_kinds().names(),
        "built-ins registered"
    );
    Ok(())
}
