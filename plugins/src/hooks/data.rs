use async_trait::async_trait;
use krawler_core::api::{EngineError, Hook, HookContext, Phase};
use serde::Deserialize;
use serde_json::Value;

use super::{default_data_path, parse_options};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearDataOptions {
    #[serde(default = "default_data_path")]
    data_path: String,
}

/// Drops an intermediate value once later hooks have persisted it.
pub struct ClearData {
    options: ClearDataOptions,
}

impl ClearData {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("clearData", options)?,
        })
    }
}

#[async_trait]
impl Hook for ClearData {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("clearData", &[Phase::After])?;
        let (root, rest) = ctx.root_mut(&self.options.data_path)?;
        krawler_core::api::unset_path(root, rest);
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearOutputsOptions {
    /// Store id; the chain store when unset.
    #[serde(default)]
    store: Option<String>,
}

/// Removes every blob recorded in `result.outputs`. As a job hook, where
/// `result` holds the task outcomes, it removes the outputs of every task.
/// Removal failures are logged and do not fail the hook.
pub struct ClearOutputs {
    options: ClearOutputsOptions,
}

impl ClearOutputs {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("clearOutputs", options)?,
        })
    }
}

#[async_trait]
impl Hook for ClearOutputs {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("clearOutputs", &[Phase::After, Phase::Error])?;
        let keys: Vec<String> = match &ctx.result {
            Value::Array(outcomes) => outcomes
                .iter()
                .flat_map(|outcome| output_ids(outcome.pointer("/result/outputs")))
                .collect(),
            result => output_ids(result.get("outputs")),
        };
        if keys.is_empty() {
            return Ok(());
        }

        let store = ctx.store("clearOutputs", self.options.store.as_deref())?;
        for key in &keys {
            if let Err(err) = store.remove(key).await {
                tracing::warn!(target: "krawler.hooks", hook = "clearOutputs", store = %store.id(), key = %key, error = %err, "output removal failed");
            }
        }
        match &mut ctx.result {
            Value::Array(outcomes) => {
                for outcome in outcomes {
                    if let Some(result) = outcome.get_mut("result").and_then(Value::as_object_mut) {
                        result.remove("outputs");
                    }
                }
            }
            Value::Object(result) => {
                result.remove("outputs");
            }
            _ => {}
        }
        tracing::debug!(target: "krawler.hooks", hook = "clearOutputs", removed = keys.len(), "outputs cleared");
        Ok(())
    }
}

fn output_ids(outputs: Option<&Value>) -> Vec<String> {
    outputs
        .and_then(Value::as_array)
        .map(|outputs| {
            outputs
                .iter()
                .filter_map(|o| o.get("id").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
