use async_trait::async_trait;
use krawler_core::api::{EngineError, HookContext, TaskKind};

/// Performs no domain work; the task is driven by its hooks alone.
pub struct NoopTask;

#[async_trait]
impl TaskKind for NoopTask {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&self, _ctx: &mut HookContext) -> Result<(), EngineError> {
        Ok(())
    }
}
