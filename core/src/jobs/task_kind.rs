use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lazy_static::lazy_static;

use crate::error::EngineError;
use crate::hooks::HookContext;

/// Domain work performed by a task between its `before` and `after` chains.
///
/// Implementations read the resolved task from `ctx.data`, use the store in
/// `ctx.params.store` and write what they produce into `ctx.result`.
#[async_trait]
pub trait TaskKind: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut HookContext) -> Result<(), EngineError>;
}

lazy_static! {
    static ref GLOBAL: Arc<TaskKindRegistry> = Arc::new(TaskKindRegistry::new());
}

/// Task kinds by `type` name. Last registration wins.
#[derive(Default)]
pub struct TaskKindRegistry {
    kinds: RwLock<HashMap<String, Arc<dyn TaskKind>>>,
}

impl TaskKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<TaskKindRegistry> {
        GLOBAL.clone()
    }

    pub fn register(&self, kind: Arc<dyn TaskKind>) {
        let name = kind.name().to_string();
        let replaced = self
            .kinds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.clone(), kind)
            .is_some();
        tracing::debug!(target: "krawler.tasks", kind = %name, replaced, "register task kind");
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn TaskKind>, EngineError> {
        self.kinds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::configuration(format!("unknown task type '{name}'")))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .kinds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

pub fn register_task_kind(kind: Arc<dyn TaskKind>) {
    TaskKindRegistry::global().register(kind);
}
