use std::sync::Arc;

use krawler_core::api::{AppConfig, HookRegistry, Krawler, TaskKindRegistry};

/// Krawler with built-ins registered into private registries, so tests can
/// override hooks without touching the process-wide ones.
pub fn krawler() -> Krawler {
    let krawler = Krawler::new(AppConfig::default())
        .with_hooks(Arc::new(HookRegistry::new()))
        .with_task_kinds(Arc::new(TaskKindRegistry::new()));
    krawler_plugins::register_builtins(&krawler).unwrap();
    krawler
}
