use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{EngineError, ErrorCode};
use crate::store::{Store, StoreRegistry};
use crate::util::path::get_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    After,
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Jobs,
    Tasks,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jobs => "jobs",
            Self::Tasks => "tasks",
        })
    }
}

/// Failure recorded on the context before the error chain runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookFailure {
    pub target: Target,
    /// Chain the failure happened in. `None` outside the hook chains: store
    /// resolution, the task's own work, a panicking pipeline.
    pub phase: Option<Phase>,
    /// Failing hook, if a hook failed.
    pub hook: Option<String>,
    /// Task kind whose work failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_kind: Option<String>,
    pub message: String,
    pub code: u16,
}

/// Runtime parameters handed to every hook of a chain.
#[derive(Clone)]
pub struct HookParams {
    /// Store the current job/task reads and writes through.
    pub store: Option<Arc<dyn Store>>,
    /// Process-wide store registry, for hooks addressing stores by id.
    pub stores: Arc<StoreRegistry>,
    /// Free-form caller parameters.
    pub extra: Map<String, Value>,
}

impl HookParams {
    pub fn new(stores: Arc<StoreRegistry>) -> Self {
        Self {
            store: None,
            stores,
            extra: Map::new(),
        }
    }

    pub fn with_store(mut self, store: Option<Arc<dyn Store>>) -> Self {
        self.store = store;
        self
    }
}

impl fmt::Debug for HookParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookParams")
            .field("store", &self.store.as_ref().map(|s| s.id().to_string()))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Record threaded by mutable reference through a phase chain.
///
/// Hooks read and write `data` (the job or task definition), `result` (the
/// output accumulator) and `params`. `phase` is set by the pipeline and must
/// not be changed by hooks; a hook written for another phase fails with
/// [`EngineError::PhaseMismatch`] via [`HookContext::expect_phase`].
#[derive(Debug, Clone)]
pub struct HookContext {
    pub phase: Phase,
    pub target: Target,
    pub data: Value,
    pub result: Value,
    pub params: HookParams,
    pub error: Option<HookFailure>,
}

impl HookContext {
    pub fn new(target: Target, data: Value, params: HookParams) -> Self {
        Self {
            phase: Phase::Before,
            target,
            data,
            result: Value::Null,
            params,
            error: None,
        }
    }

    /// Id of the entity being processed (`data.id`).
    pub fn data_id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    /// Fail fast when invoked outside the phases `hook` supports.
    pub fn expect_phase(&self, hook: &str, allowed: &[Phase]) -> Result<(), EngineError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        let expected = allowed
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Err(EngineError::PhaseMismatch {
            hook: hook.to_string(),
            expected,
            actual: self.phase,
        })
    }

    /// Resolve the store a hook should use: an explicit store id wins over
    /// the store carried by the chain parameters.
    pub fn store(&self, hook: &str, store_id: Option<&str>) -> Result<Arc<dyn Store>, EngineError> {
        if let Some(id) = store_id {
            return Ok(self.params.stores.get(id)?);
        }
        self.params.store.clone().ok_or_else(|| {
            EngineError::configuration(format!(
                "you must provide a store for the '{hook}' hook to work"
            ))
        })
    }

    /// Lookup `path` over the whole context (`data.*`, `result.*`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (root, rest) = path.split_once('.').unwrap_or((path, ""));
        let value = match root {
            "data" => &self.data,
            "result" => &self.result,
            _ => return None,
        };
        get_path(value, rest)
    }

    /// Mutable root for a context path (`data` or `result`) and the remainder.
    pub fn root_mut<'a>(&mut self, path: &'a str) -> Result<(&mut Value, &'a str), EngineError> {
        let (root, rest) = path.split_once('.').unwrap_or((path, ""));
        match root {
            "data" => Ok((&mut self.data, rest)),
            "result" => Ok((&mut self.result, rest)),
            other => Err(EngineError::configuration(format!(
                "context path must start with 'data' or 'result', got '{other}'"
            ))),
        }
    }

    /// Record an output key in `result.outputs` so later hooks (and cleanup)
    /// can find it.
    pub fn add_output(&mut self, key: &str, output_type: Option<&str>) {
        if !self.result.is_object() {
            self.result = json!({});
        }
        let Value::Object(result) = &mut self.result else {
            return;
        };
        let outputs = result
            .entry("outputs")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = outputs {
            let mut entry = json!({ "id": key });
            if let Some(kind) = output_type {
                entry["type"] = json!(kind);
            }
            items.push(entry);
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        phase: Option<Phase>,
        hook: Option<&str>,
        task_kind: Option<&str>,
        err: &EngineError,
    ) {
        let code: ErrorCode = err.error_code();
        self.error = Some(HookFailure {
            target: self.target,
            phase,
            hook: hook.map(str::to_string),
            task_kind: task_kind.map(str::to_string),
            message: err.root().to_string(),
            code: code.as_u16(),
        });
    }
}
