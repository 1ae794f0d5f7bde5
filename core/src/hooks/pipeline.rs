use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

use super::context::{HookContext, Phase, Target};
use super::hook::Hook;
use super::registry::HookRegistry;

/// Hooks of one target, grouped by phase. Declaration order is kept and is
/// the execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetHooks {
    #[serde(default)]
    pub before: IndexMap<String, Value>,
    #[serde(default)]
    pub after: IndexMap<String, Value>,
    #[serde(default)]
    pub error: IndexMap<String, Value>,
}

impl TargetHooks {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.error.is_empty()
    }

    fn phase(&self, phase: Phase) -> &IndexMap<String, Value> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
            Phase::Error => &self.error,
        }
    }
}

/// Declarative hook configuration as authored in jobfiles:
/// `{ jobs: { before: { name: options } }, tasks: { after: { ... } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookConfig {
    #[serde(default)]
    pub jobs: TargetHooks,
    #[serde(default)]
    pub tasks: TargetHooks,
}

impl HookConfig {
    /// Targets and phases must be objects; `null` stands for "none".
    /// Sequences are rejected rather than read positionally.
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        let mut targets = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(targets) => targets,
            other => return Err(malformed(format!("expected an object, got {other}"))),
        };
        targets.retain(|_, v| !v.is_null());
        for (target, phases) in targets.iter_mut() {
            let Value::Object(phases) = phases else {
                return Err(malformed(format!("'{target}' must be an object of phases, got {phases}")));
            };
            phases.retain(|_, v| !v.is_null());
            if let Some((phase, hooks)) = phases.iter().find(|(_, v)| !v.is_object()) {
                return Err(malformed(format!(
                    "'{target}.{phase}' must be an object of hooks, got {hooks}"
                )));
            }
        }
        serde_json::from_value(Value::Object(targets)).map_err(|e| malformed(e.to_string()))
    }

    pub fn target(&self, target: Target) -> &TargetHooks {
        match target {
            Target::Jobs => &self.jobs,
            Target::Tasks => &self.tasks,
        }
    }
}

fn malformed(detail: String) -> EngineError {
    EngineError::configuration(format!("malformed hook configuration: {detail}"))
}

/// A hook resolved from the registry and bound to its options.
#[derive(Clone)]
pub struct BoundHook {
    pub name: String,
    hook: Arc<dyn Hook>,
}

impl BoundHook {
    pub fn new(name: impl Into<String>, hook: Arc<dyn Hook>) -> Self {
        Self {
            name: name.into(),
            hook,
        }
    }
}

impl std::fmt::Debug for BoundHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Executable `before`/`after`/`error` chains of one target.
#[derive(Debug, Clone)]
pub struct PhaseChains {
    pub target: Target,
    before: Vec<BoundHook>,
    after: Vec<BoundHook>,
    error: Vec<BoundHook>,
}

/// Compile the hooks of `target` using the process-wide registry.
pub fn activate_hooks(config: &HookConfig, target: Target) -> Result<PhaseChains, EngineError> {
    activate_hooks_with(&HookRegistry::global(), config, target)
}

pub fn activate_hooks_with(
    registry: &HookRegistry,
    config: &HookConfig,
    target: Target,
) -> Result<PhaseChains, EngineError> {
    let hooks = config.target(target);
    let mut chains = PhaseChains::empty(target);
    for phase in [Phase::Before, Phase::After, Phase::Error] {
        for (name, options) in hooks.phase(phase) {
            let options = match options {
                Value::Null => Value::Object(Default::default()),
                Value::Object(_) => options.clone(),
                other => {
                    return Err(EngineError::configuration(format!(
                        "options of {target} {phase} hook '{name}' must be an object, got {other}"
                    )))
                }
            };
            let factory = registry.lookup(name)?;
            let hook = factory(&options)?;
            chains.push(phase, BoundHook::new(name.clone(), hook));
        }
    }
    tracing::debug!(
        target: "krawler.hooks",
        target_kind = %target,
        before = ?chains.before,
        after = ?chains.after,
        error = ?chains.error,
        "hooks activated"
    );
    Ok(chains)
}

impl PhaseChains {
    pub fn empty(target: Target) -> Self {
        Self {
            target,
            before: Vec::new(),
            after: Vec::new(),
            error: Vec::new(),
        }
    }

    pub fn push(&mut self, phase: Phase, hook: BoundHook) {
        match phase {
            Phase::Before => self.before.push(hook),
            Phase::After => self.after.push(hook),
            Phase::Error => self.error.push(hook),
        }
    }

    pub fn chain(&self, phase: Phase) -> &[BoundHook] {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
            Phase::Error => &self.error,
        }
    }

    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.chain(phase).iter().map(|h| h.name.as_str()).collect()
    }

    /// Run the chain of `phase` sequentially against `ctx`.
    ///
    /// On failure the remaining hooks are skipped, the failure is recorded in
    /// `ctx.error`, the error chain runs, and the error is returned wrapped
    /// with the failing hook's location.
    pub async fn run_phase(&self, phase: Phase, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.phase = phase;
        for bound in self.chain(phase) {
            let started = Instant::now();
            tracing::debug!(
                target: "krawler.hooks",
                target_kind = %self.target, %phase, hook = %bound.name, id = ?ctx.data_id(),
                "hook start"
            );
            if let Err(err) = bound.hook.execute(ctx).await {
                let err = EngineError::Hook {
                    target: self.target,
                    phase,
                    hook: bound.name.clone(),
                    source: Box::new(err),
                };
                ctx.phase = phase;
                ctx.record_failure(Some(phase), Some(&bound.name), None, &err);
                if phase != Phase::Error {
                    self.run_error_chain(ctx).await;
                }
                return Err(err);
            }
            tracing::debug!(
                target: "krawler.hooks",
                target_kind = %self.target, %phase, hook = %bound.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "hook done"
            );
        }
        Ok(())
    }

    /// Record a failure raised outside the hook chains and run the error
    /// chain. `task_kind` names the kind when the task's own work failed.
    /// Returns the error for propagation.
    pub async fn fail(&self, ctx: &mut HookContext, task_kind: Option<&str>, err: EngineError) -> EngineError {
        ctx.record_failure(None, None, task_kind, &err);
        self.run_error_chain(ctx).await;
        err
    }

    async fn run_error_chain(&self, ctx: &mut HookContext) {
        if self.error.is_empty() {
            return;
        }
        ctx.phase = Phase::Error;
        for bound in &self.error {
            if let Err(err) = bound.hook.execute(ctx).await {
                // The original failure is the one reported.
                tracing::warn!(
                    target: "krawler.hooks",
                    target_kind = %self.target, hook = %bound.name, error = %err,
                    "error hook failed"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{sync_hook, HookParams};
    use crate::store::StoreRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(target: Target) -> HookContext {
        HookContext::new(target, json!({ "id": "job" }), HookParams::new(Arc::new(StoreRegistry::new())))
    }

    /// Registry with `push` (appends its `value` option to `data.trace`),
    /// `fail` and `copyTrace` (copies `data.trace` into `result`).
    fn registry() -> HookRegistry {
        let registry = HookRegistry::new();
        registry.register("push", |options| {
            let value = options.get("value").cloned().unwrap_or(Value::Null);
            Ok(sync_hook(move |ctx| {
                let mut trace = ctx.data["trace"].as_array().cloned().unwrap_or_default();
                trace.push(value.clone());
                ctx.data["trace"] = Value::Array(trace);
                Ok(())
            }))
        });
        registry.register("fail", |_| {
            Ok(sync_hook(|_| Err(EngineError::domain("boom"))))
        });
        registry.register("copyTrace", |_| {
            Ok(sync_hook(|ctx| {
                ctx.result = json!({ "trace": ctx.data["trace"].clone(), "failed": ctx.error.is_some() });
                Ok(())
            }))
        });
        registry
    }

    fn config(value: Value) -> HookConfig {
        HookConfig::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn hooks_run_in_declaration_order_and_see_earlier_writes() {
        let registry = registry();
        registry.register("second", |_| {
            Ok(sync_hook(|ctx| {
                let seen = ctx.data["trace"].clone();
                ctx.data["seen_by_second"] = seen;
                Ok(())
            }))
        });
        let cfg = config(json!({
            "jobs": { "before": { "push": { "value": "A" }, "second": {} } }
        }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Jobs).unwrap();
        assert_eq!(chains.names(Phase::Before), vec!["push", "second"]);

        let mut c = ctx(Target::Jobs);
        chains.run_phase(Phase::Before, &mut c).await.unwrap();
        assert_eq!(c.data["seen_by_second"], json!(["A"]));
    }

    #[test]
    fn declaration_order_is_not_alphabetical() {
        let cfg = config(json!({
            "tasks": { "after": { "push": {}, "copyTrace": {}, "fail": {} } }
        }));
        let chains = activate_hooks_with(&registry(), &cfg, Target::Tasks).unwrap();
        assert_eq!(chains.names(Phase::After), vec!["push", "copyTrace", "fail"]);
    }

    #[tokio::test]
    async fn failure_short_circuits_and_runs_error_chain() {
        let registry = registry();
        let cfg = config(json!({
            "jobs": {
                "before": { "fail": {}, "push": { "value": "B" } },
                "error": { "copyTrace": {} }
            }
        }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Jobs).unwrap();
        let mut c = ctx(Target::Jobs);
        let err = chains.run_phase(Phase::Before, &mut c).await.unwrap_err();

        assert!(matches!(err, EngineError::Hook { ref hook, phase: Phase::Before, .. } if hook == "fail"));
        assert!(c.data.get("trace").is_none(), "B must never run");
        assert_eq!(c.result, json!({ "trace": null, "failed": true }));
        let failure = c.error.unwrap();
        assert_eq!(failure.hook.as_deref(), Some("fail"));
        assert_eq!(failure.phase, Some(Phase::Before));
        assert_eq!(failure.message, "boom");
    }

    #[tokio::test]
    async fn work_failure_is_not_attributed_to_a_hook_phase() {
        let registry = registry();
        let cfg = config(json!({
            "tasks": { "before": { "push": { "value": 1 } }, "error": { "copyTrace": {} } }
        }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Tasks).unwrap();
        let mut c = ctx(Target::Tasks);
        chains.run_phase(Phase::Before, &mut c).await.unwrap();

        let err = chains.fail(&mut c, Some("http"), EngineError::domain("timeout")).await;
        assert!(matches!(err, EngineError::Domain(_)));
        let failure = c.error.unwrap();
        assert_eq!(failure.phase, None);
        assert_eq!(failure.hook, None);
        assert_eq!(failure.task_kind.as_deref(), Some("http"));
        assert_eq!(c.result, json!({ "trace": [1], "failed": true }));
    }

    #[tokio::test]
    async fn failure_without_error_chain_propagates() {
        let registry = registry();
        let cfg = config(json!({ "tasks": { "after": { "fail": {} } } }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Tasks).unwrap();
        let mut c = ctx(Target::Tasks);
        assert!(chains.run_phase(Phase::After, &mut c).await.is_err());
        assert!(c.error.is_some());
    }

    #[tokio::test]
    async fn failing_error_hook_keeps_original_error() {
        let registry = registry();
        let cfg = config(json!({
            "jobs": { "after": { "push": { "value": 1 } , "fail": {} }, "error": { "fail": {} } }
        }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Jobs).unwrap();
        let mut c = ctx(Target::Jobs);
        let err = chains.run_phase(Phase::After, &mut c).await.unwrap_err();
        assert!(matches!(err, EngineError::Hook { phase: Phase::After, .. }));
        assert_eq!(c.data["trace"], json!([1]));
    }

    #[tokio::test]
    async fn hooks_run_sequentially() {
        struct Slow(Arc<AtomicUsize>, Arc<AtomicUsize>);

        #[async_trait::async_trait]
        impl Hook for Slow {
            async fn execute(&self, _ctx: &mut HookContext) -> Result<(), EngineError> {
                let now = self.0.fetch_add(1, Ordering::SeqCst) + 1;
                self.1.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                self.0.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut chains = PhaseChains::empty(Target::Tasks);
        for i in 0..4 {
            chains.push(
                Phase::Before,
                BoundHook::new(format!("slow{i}"), Arc::new(Slow(active.clone(), peak.clone()))),
            );
        }
        chains.run_phase(Phase::Before, &mut ctx(Target::Tasks)).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_hook_name_fails_activation() {
        let cfg = config(json!({ "tasks": { "before": { "doesNotExist": {} } } }));
        let err = activate_hooks_with(&registry(), &cfg, Target::Tasks).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        // Jobs target does not reference it.
        assert!(activate_hooks_with(&registry(), &cfg, Target::Jobs).is_ok());
    }

    #[test]
    fn malformed_configuration_is_rejected() {
        for bad in [
            json!({ "jobs": { "during": {} } }),
            json!({ "jobs": [] }),
            json!({ "jobs": [{ "push": {} }] }),
            json!({ "tasks": { "before": [{ "push": {} }] } }),
            json!({ "tasks": { "after": "push" } }),
            json!(["jobs"]),
        ] {
            let err = HookConfig::from_value(bad.clone()).unwrap_err();
            assert!(matches!(err, EngineError::Configuration(_)), "accepted {bad}");
        }

        let cfg = config(json!({ "jobs": { "before": { "push": 3 } } }));
        let err = activate_hooks_with(&registry(), &cfg, Target::Jobs).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn null_targets_and_phases_are_empty() {
        let cfg = config(json!({ "jobs": null, "tasks": { "before": null, "after": { "push": {} } } }));
        assert!(cfg.jobs.is_empty());
        assert!(cfg.tasks.before.is_empty());
        assert_eq!(cfg.tasks.after.len(), 1);
    }

    #[test]
    fn custom_hook_is_activated_in_before_and_after() {
        let registry = registry();
        registry.register("custom", |_| Ok(sync_hook(|_| Ok(()))));
        let cfg = config(json!({
            "tasks": { "before": { "custom": { "parameter": 1 } }, "after": { "custom": { "parameter": 2 } } }
        }));
        let chains = activate_hooks_with(&registry, &cfg, Target::Tasks).unwrap();
        assert_eq!(chains.names(Phase::Before), vec!["custom"]);
        assert_eq!(chains.names(Phase::After), vec!["custom"]);
    }
}
