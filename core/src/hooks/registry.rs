use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use serde_json::Value;

use crate::error::EngineError;

use super::hook::{Hook, HookFactory};

lazy_static! {
    static ref GLOBAL: Arc<HookRegistry> = Arc::new(HookRegistry::new());
}

/// Mapping from hook name to hook factory.
///
/// The process-wide instance ([`HookRegistry::global`]) lives as long as the
/// process: built-ins are registered at startup, callers may add or override
/// names at any time afterwards. There is no removal.
#[derive(Default)]
pub struct HookRegistry {
    factories: RwLock<HashMap<String, HookFactory>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<HookRegistry> {
        GLOBAL.clone()
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn Hook>, EngineError> + Send + Sync + 'static,
    {
        let replaced = self
            .factories
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), Arc::new(factory))
            .is_some();
        tracing::debug!(target: "krawler.hooks", hook = %name, replaced, "register hook");
    }

    pub fn lookup(&self, name: &str) -> Result<HookFactory, EngineError> {
        self.factories
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::configuration(format!("unknown hook '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Register a hook factory in the process-wide registry.
pub fn register_hook<F>(name: &str, factory: F)
where
    F: Fn(&Value) -> Result<Arc<dyn Hook>, EngineError> + Send + Sync + 'static,
{
    HookRegistry::global().register(name, factory);
}

/// Resolve a hook factory from the process-wide registry.
pub fn lookup_hook(name: &str) -> Result<HookFactory, EngineError> {
    HookRegistry::global().lookup(name)
}
