use std::sync::Arc;

use crate::config::AppConfig;
use crate::hooks::HookRegistry;
use crate::jobs::{JobExecutor, TaskKindRegistry};
use crate::services::{JobsService, StoresService};
use crate::store::StoreRegistry;

/// Service context of one krawler instance: configuration, the shared store
/// registry, and the hook and task kind registries jobs are activated from.
#[derive(Clone)]
pub struct Krawler {
    cfg: AppConfig,
    stores: Arc<StoreRegistry>,
    hooks: Arc<HookRegistry>,
    kinds: Arc<TaskKindRegistry>,
}

impl Krawler {
    /// Fresh store registry, process-wide hook and task kind registries.
    pub fn new(cfg: AppConfig) -> Self {
        Self {
            cfg,
            stores: Arc::new(StoreRegistry::new()),
            hooks: HookRegistry::global(),
            kinds: TaskKindRegistry::global(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_task_kinds(mut self, kinds: Arc<TaskKindRegistry>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn store_registry(&self) -> &Arc<StoreRegistry> {
        &self.stores
    }

    pub fn hook_registry(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub fn task_kinds(&self) -> &Arc<TaskKindRegistry> {
        &self.kinds
    }

    pub fn stores(&self) -> StoresService {
        StoresService::new(self.stores.clone())
    }

    pub fn jobs(&self) -> JobsService {
        let executor = JobExecutor::new(self.stores.clone())
            .with_hooks(self.hooks.clone())
            .with_task_kinds(self.kinds.clone())
            .with_workers_limit(self.cfg.engine.workers_limit)
            .with_default_job_type(self.cfg.engine.default_job_type.clone());
        JobsService::new(executor)
    }
}
