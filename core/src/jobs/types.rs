use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, ErrorCode};
use crate::hooks::{HookConfig, HookFailure, Target};

use super::state::JobState;

/// A submitted batch of work. Exists only for the duration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,

    /// Executor strategy (`async` when unset).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub options: Value,

    /// Partial task definition; its `id` is a template over `jobId`/`taskId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_template: Option<Value>,

    /// Raw task descriptors, each carrying at least an `id`.
    #[serde(default)]
    pub tasks: Vec<Value>,

    #[serde(default)]
    pub hooks: HookConfig,

    /// Id of the store job outputs go to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            options: Value::Null,
            task_template: None,
            tasks: Vec::new(),
            hooks: HookConfig::default(),
            store: None,
        }
    }

    /// Build a job from external input. A malformed `hooks` section is a
    /// configuration error, anything else malformed a validation error.
    pub fn from_value(mut value: Value) -> Result<Self, EngineError> {
        let hooks = match value.as_object_mut().and_then(|m| m.remove("hooks")) {
            Some(hooks) => HookConfig::from_value(hooks)?,
            None => HookConfig::default(),
        };
        let mut job: Job = serde_json::from_value(value)
            .map_err(|e| EngineError::validation(format!("malformed job: {e}")))?;
        job.hooks = hooks;
        Ok(job)
    }

    /// JSON view handed to job-level hooks as `data`. The hook configuration
    /// itself is not part of it.
    pub fn to_data(&self) -> Value {
        let mut data = Map::new();
        data.insert("id".into(), Value::String(self.id.clone()));
        if let Some(kind) = &self.kind {
            data.insert("type".into(), Value::String(kind.clone()));
        }
        let options = if self.options.is_null() {
            Value::Object(Map::new())
        } else {
            self.options.clone()
        };
        data.insert("options".into(), options);
        if let Some(template) = &self.task_template {
            data.insert("taskTemplate".into(), template.clone());
        }
        data.insert("tasks".into(), Value::Array(self.tasks.clone()));
        if let Some(store) = &self.store {
            data.insert("store".into(), Value::String(store.clone()));
        }
        Value::Object(data)
    }
}

/// A fully resolved unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Template merged with the raw task's own fields.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Task {
    /// Task kind performing the domain work (`type` field).
    pub fn kind(&self) -> Option<&str> {
        self.options.get("type").and_then(Value::as_str)
    }

    /// Id of the store this task reads and writes through (`store` field).
    pub fn store_id(&self) -> Option<&str> {
        self.options.get("store").and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.options.len() + 1);
        map.insert("id".into(), Value::String(self.id.clone()));
        for (k, v) in &self.options {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// Terminal state of one task pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub id: String,
    pub status: TaskStatus,
    /// Final `result` of the task context; partial for failed tasks.
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HookFailure>,
    pub duration_ms: u64,
}

impl TaskOutcome {
    /// Outcome of a pipeline that panicked before it could record a failure.
    pub fn panicked(id: String, message: String, duration_ms: u64) -> Self {
        Self {
            id,
            status: TaskStatus::Failed,
            result: Value::Null,
            error: Some(HookFailure {
                target: Target::Tasks,
                phase: None,
                hook: None,
                task_kind: None,
                message: format!("task panicked: {message}"),
                code: ErrorCode::DomainError.as_u16(),
            }),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}

/// Aggregate returned to the submitter of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub id: String,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-task outcomes, in expansion order.
    pub outcomes: Vec<TaskOutcome>,
    /// `result` of the job context after the job `after` chain.
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_from_value_reads_external_shape() {
        let job = Job::from_value(json!({
            "id": "dem",
            "type": "async",
            "options": { "workersLimit": 2 },
            "taskTemplate": { "id": "<%= jobId %>-<%= taskId %>", "type": "http" },
            "tasks": [{ "id": 1 }],
            "hooks": { "jobs": { "before": { "basicAuth": {} } } },
            "store": "job-store"
        }))
        .unwrap();
        assert_eq!(job.kind.as_deref(), Some("async"));
        assert_eq!(job.hooks.jobs.before.len(), 1);
        assert_eq!(job.store.as_deref(), Some("job-store"));
        assert!(job.to_data().get("hooks").is_none());
        assert_eq!(job.to_data()["taskTemplate"]["type"], json!("http"));
    }

    #[test]
    fn malformed_hooks_vs_malformed_job() {
        let err = Job::from_value(json!({ "id": "j", "hooks": { "jobs": [] } })).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        let err = Job::from_value(json!({ "id": "j", "hooks": { "jobs": [{ "basicAuth": {} }] } }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        let err = Job::from_value(json!({ "tasks": [] })).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn task_accessors() {
        let task: Task = serde_json::from_value(json!({
            "id": "t", "type": "http", "store": "fs", "options": { "url": "u" }
        }))
        .unwrap();
        assert_eq!(task.kind(), Some("http"));
        assert_eq!(task.store_id(), Some("fs"));
        assert_eq!(task.to_value()["options"]["url"], json!("u"));
        assert!(task.options.get("id").is_none());
    }
}
