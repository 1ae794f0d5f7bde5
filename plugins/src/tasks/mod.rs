mod http;
mod noop;

use std::sync::Arc;

use krawler_core::api::TaskKindRegistry;

pub use http::HttpTask;
pub use noop::NoopTask;

pub fn register_builtin_task_kinds(registry: &TaskKindRegistry) -> anyhow::Result<()> {
    registry.register(Arc::new(HttpTask::new()?));
    registry.register(Arc::new(NoopTask));
    Ok(())
}
