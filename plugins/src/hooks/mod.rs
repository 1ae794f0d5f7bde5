//! Built-in hooks. Each factory parses its options once at activation time,
//! so a bad option is a configuration error before any job work starts.

mod auth;
mod data;
mod json;
mod store;

#[cfg(test)]
pub(crate) mod testing;

use krawler_core::api::{EngineError, HookRegistry};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub use auth::BasicAuth;
pub use data::{ClearData, ClearOutputs};
pub use json::{MergeJson, ReadJson, WriteJson};
pub use store::{StoreTransfer, TransferOp};

pub(crate) fn parse_options<T: DeserializeOwned>(hook: &str, options: &Value) -> Result<T, EngineError> {
    serde_json::from_value(options.clone())
        .map_err(|e| EngineError::configuration(format!("invalid options for the '{hook}' hook: {e}")))
}

pub(crate) fn default_data_path() -> String {
    "result.data".to_string()
}

pub fn register_builtin_hooks(registry: &HookRegistry) {
    registry.register("basicAuth", |o| Ok(Arc::new(BasicAuth::from_options(o)?)));
    registry.register("writeJson", |o| Ok(Arc::new(WriteJson::from_options(o)?)));
    registry.register("readJson", |o| Ok(Arc::new(ReadJson::from_options(o)?)));
    registry.register("mergeJson", |o| Ok(Arc::new(MergeJson::from_options(o)?)));
    registry.register("clearData", |o| Ok(Arc::new(ClearData::from_options(o)?)));
    registry.register("clearOutputs", |o| Ok(Arc::new(ClearOutputs::from_options(o)?)));
    registry.register("copyToStore", |o| {
        Ok(Arc::new(StoreTransfer::from_options(TransferOp::Copy, o)?))
    });
    registry.register("gzipToStore", |o| {
        Ok(Arc::new(StoreTransfer::from_options(TransferOp::Gzip, o)?))
    });
    registry.register("gunzipFromStore", |o| {
        Ok(Arc::new(StoreTransfer::from_options(TransferOp::Gunzip, o)?))
    });
}
