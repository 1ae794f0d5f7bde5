use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

use super::context::HookContext;

/// An executable lifecycle hook, bound to its options at activation time.
///
/// Hooks run strictly one after another inside a chain, so a hook may rely on
/// everything earlier hooks wrote into the context.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError>;
}

/// Builds a hook from its declared options (`options → hook`).
pub type HookFactory = Arc<dyn Fn(&Value) -> Result<Arc<dyn Hook>, EngineError> + Send + Sync>;

/// Adapter turning a synchronous closure into a [`Hook`].
pub struct SyncHook<F> {
    f: F,
}

#[async_trait]
impl<F> Hook for SyncHook<F>
where
    F: Fn(&mut HookContext) -> Result<(), EngineError> + Send + Sync,
{
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        (self.f)(ctx)
    }
}

pub fn sync_hook<F>(f: F) -> Arc<dyn Hook>
where
    F: Fn(&mut HookContext) -> Result<(), EngineError> + Send + Sync + 'static,
{
    Arc::new(SyncHook { f })
}
