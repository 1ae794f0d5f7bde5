use async_trait::async_trait;
use krawler_core::api::{
    read_to_bytes, render, set_path, write_bytes, EngineError, Hook, HookContext, Phase,
};
use serde::Deserialize;
use serde_json::Value;

use super::{default_data_path, parse_options};

/// Key template rendered against `data`, or `<data.id><suffix>`.
fn resolve_key(ctx: &HookContext, template: Option<&str>, suffix: &str) -> Result<String, EngineError> {
    match template {
        Some(template) => render(template, &ctx.data),
        None => ctx
            .data_id()
            .map(|id| format!("{id}{suffix}"))
            .ok_or_else(|| EngineError::validation("hook data has no string id")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteJsonOptions {
    #[serde(default = "default_data_path")]
    data_path: String,
    #[serde(default)]
    store: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    output_type: Option<String>,
    /// Only accept stores exposing a filesystem path.
    #[serde(default)]
    require_path: bool,
    #[serde(default)]
    pretty: bool,
}

/// Persists the value at `dataPath` as `<data.id>.json`.
pub struct WriteJson {
    options: WriteJsonOptions,
}

impl WriteJson {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("writeJson", options)?,
        })
    }
}

#[async_trait]
impl Hook for WriteJson {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("writeJson", &[Phase::After])?;
        let store = ctx.store("writeJson", self.options.store.as_deref())?;
        if self.options.require_path {
            store.require_path()?;
        }
        let value = ctx.get(&self.options.data_path).ok_or_else(|| {
            EngineError::validation(format!("nothing to write at '{}'", self.options.data_path))
        })?;
        let bytes = if self.options.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        let key = resolve_key(ctx, self.options.key.as_deref(), ".json")?;
        write_bytes(store.as_ref(), &key, &bytes).await?;
        tracing::debug!(target: "krawler.hooks", hook = "writeJson", store = %store.id(), key = %key, size = bytes.len(), "json written");
        ctx.add_output(&key, self.options.output_type.as_deref());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadJsonOptions {
    #[serde(default = "default_data_path")]
    data_path: String,
    #[serde(default)]
    store: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Parses the blob named after `result.id` (usually what the task just
/// downloaded) into `dataPath`.
pub struct ReadJson {
    options: ReadJsonOptions,
}

impl ReadJson {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("readJson", options)?,
        })
    }
}

#[async_trait]
impl Hook for ReadJson {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("readJson", &[Phase::After])?;
        let store = ctx.store("readJson", self.options.store.as_deref())?;
        let key = match self.options.key.as_deref() {
            Some(template) => render(template, &ctx.data)?,
            None => ctx
                .get("result.id")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| EngineError::validation("readJson needs a 'result.id' or a 'key' option"))?,
        };
        let bytes = read_to_bytes(store.as_ref(), &key).await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::domain(format!("blob '{key}' is not valid JSON: {e}")))?;
        let (root, rest) = ctx.root_mut(&self.options.data_path)?;
        set_path(root, rest, value);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeJsonOptions {
    #[serde(default)]
    store: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Job `after` hook: concatenates the `<task id>.json` blobs of succeeded
/// tasks into `<job id>.json`, in task order. Array blobs are flattened.
pub struct MergeJson {
    options: MergeJsonOptions,
}

impl MergeJson {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("mergeJson", options)?,
        })
    }
}

#[async_trait]
impl Hook for MergeJson {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("mergeJson", &[Phase::After])?;
        let store = ctx.store("mergeJson", self.options.store.as_deref())?;
        let task_ids: Vec<String> = ctx
            .result
            .as_array()
            .ok_or_else(|| EngineError::validation("mergeJson expects task outcomes in 'result'"))?
            .iter()
            .filter(|o| o.get("status").and_then(Value::as_str) == Some("succeeded"))
            .filter_map(|o| o.get("id").and_then(Value::as_str).map(str::to_owned))
            .collect();

        let mut merged = Vec::with_capacity(task_ids.len());
        for id in &task_ids {
            let bytes = read_to_bytes(store.as_ref(), &format!("{id}.json")).await?;
            match serde_json::from_slice::<Value>(&bytes)? {
                Value::Array(items) => merged.extend(items),
                other => merged.push(other),
            }
        }
        let key = resolve_key(ctx, self.options.key.as_deref(), ".json")?;
        write_bytes(store.as_ref(), &key, &serde_json::to_vec(&merged)?).await?;
        tracing::info!(target: "krawler.hooks", hook = "mergeJson", key = %key, parts = task_ids.len(), "json merged");
        Ok(())
    }
}
