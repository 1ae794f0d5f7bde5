use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::error::EngineError;
use crate::util::{deep_merge, render};

use super::types::Task;

fn raw_task_id(raw: &Map<String, Value>, index: usize) -> Result<String, EngineError> {
    match raw.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(EngineError::validation(format!(
            "task #{index} has an invalid id: {other}"
        ))),
        None => Err(EngineError::validation(format!("task #{index} has no id"))),
    }
}

fn without_id(map: &Map<String, Value>) -> Map<String, Value> {
    let mut copy = map.clone();
    copy.remove("id");
    copy
}

/// `deep_merge` at the top level: `overlay` keys win, nested values merge.
fn overlay_fields(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(slot) => deep_merge(slot, &value),
            None => {
                base.insert(key, value);
            }
        }
    }
    base
}

/// Resolve raw task descriptors into tasks.
///
/// Without a template every raw task is taken as-is. With a template, each
/// task id is rendered from the template `id` (variables `jobId`, `taskId`)
/// and the options are `deep_merge(template − id, raw − id)`, raw fields
/// winning. The whole list is validated before any task is returned: every
/// raw task needs an id and the resulting ids must be unique.
pub fn expand_tasks(
    job_id: &str,
    template: Option<&Value>,
    raw_tasks: &[Value],
) -> Result<Vec<Task>, EngineError> {
    let template = match template {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            return Err(EngineError::validation(format!(
                "task template must be an object, got {other}"
            )))
        }
    };
    let id_template = match template.map(|t| t.get("id")) {
        Some(Some(Value::String(s))) => Some(s.as_str()),
        Some(Some(other)) => {
            return Err(EngineError::validation(format!(
                "task template id must be a string, got {other}"
            )))
        }
        _ => None,
    };
    if template.is_some() {
        tracing::debug!(target: "krawler.jobs", job_id, id_template = ?id_template, "expanding with task template");
    }

    let mut seen = HashSet::with_capacity(raw_tasks.len());
    let mut tasks = Vec::with_capacity(raw_tasks.len());
    for (index, raw) in raw_tasks.iter().enumerate() {
        let Value::Object(raw) = raw else {
            return Err(EngineError::validation(format!(
                "task #{index} must be an object, got {raw}"
            )));
        };
        let task_id = raw_task_id(raw, index)?;

        let (id, options) = match template {
            Some(template) => {
                let id = match id_template {
                    Some(tpl) => render(tpl, &json!({ "jobId": job_id, "taskId": task_id }))?,
                    None => task_id,
                };
                (id, overlay_fields(without_id(template), without_id(raw)))
            }
            None => (task_id, without_id(raw)),
        };

        if !seen.insert(id.clone()) {
            return Err(EngineError::validation(format!(
                "duplicate task id '{id}' in job '{job_id}'"
            )));
        }
        tasks.push(Task { id, options });
    }
    Ok(tasks)
}
