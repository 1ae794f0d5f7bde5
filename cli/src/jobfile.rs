use std::path::Path;

use krawler_core::api::{CliError, Job, Krawler};
use serde::Deserialize;
use serde_json::Value;

/// Store declared by a jobfile, created before the job runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreSpec {
    pub id: String,
    /// Backend type; defaults to `id`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub options: Value,
}

/// A job plus the stores it needs.
///
/// `store` may be a store id or a full `{ id, type, options }` spec; in the
/// latter case the store is created and becomes the job store. `stores` lists
/// extra stores tasks can address by id.
#[derive(Debug, Clone)]
pub struct Jobfile {
    pub job: Job,
    pub stores: Vec<StoreSpec>,
}

fn config_err(path: &str, e: impl std::fmt::Display) -> CliError {
    CliError::Config(format!("invalid jobfile {path}: {e}"))
}

impl Jobfile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        let name = path.display().to_string();
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let value = if is_toml {
            let table: toml::Value = toml::from_str(&text).map_err(|e| config_err(&name, e))?;
            serde_json::to_value(table).map_err(|e| config_err(&name, e))?
        } else {
            serde_json::from_str(&text).map_err(|e| config_err(&name, e))?
        };
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self, CliError> {
        let Value::Object(map) = &mut value else {
            return Err(CliError::Config("jobfile must be an object".into()));
        };

        let mut stores: Vec<StoreSpec> = match map.remove("stores") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => serde_json::from_value(v).map_err(|e| config_err("stores", e))?,
        };
        match map.remove("store") {
            None | Some(Value::Null) => {}
            Some(Value::String(id)) => {
                map.insert("store".into(), Value::String(id));
            }
            Some(spec @ Value::Object(_)) => {
                let spec: StoreSpec = serde_json::from_value(spec).map_err(|e| config_err("store", e))?;
                map.insert("store".into(), Value::String(spec.id.clone()));
                stores.push(spec);
            }
            Some(other) => {
                return Err(CliError::Config(format!(
                    "jobfile store must be an id or an object, got {other}"
                )))
            }
        }
        if !map.contains_key("id") {
            let id = uuid::Uuid::new_v4().to_string();
            tracing::debug!(target: "krawler.jobs", job_id = %id, "jobfile has no id, generated one");
            map.insert("id".into(), Value::String(id));
        }

        let job = Job::from_value(value)?;
        Ok(Self { job, stores })
    }

    pub fn create_stores(&self, krawler: &Krawler) -> Result<(), CliError> {
        let stores = krawler.stores();
        for spec in &self.stores {
            stores.create(&spec.id, spec.kind.as_deref(), &spec.options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn store_spec_becomes_job_store() {
        let jobfile = Jobfile::from_value(json!({
            "id": "dem",
            "store": { "id": "job-store", "type": "fs", "options": { "path": "/tmp/out" } },
            "stores": [{ "id": "memory" }],
            "tasks": [{ "id": 1 }]
        }))
        .unwrap();
        assert_eq!(jobfile.job.store.as_deref(), Some("job-store"));
        let ids: Vec<_> = jobfile.stores.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["memory", "job-store"]);
        assert_eq!(jobfile.stores[1].kind.as_deref(), Some("fs"));
    }

    #[test]
    fn missing_id_is_generated() {
        let jobfile = Jobfile::from_value(json!({ "tasks": [] })).unwrap();
        assert!(uuid::Uuid::parse_str(&jobfile.job.id).is_ok());
    }

    #[test]
    fn toml_jobfile_keeps_hook_order() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
id = "grid"
store = "out"

[taskTemplate]
id = "<%= jobId %>-<%= taskId %>"
type = "http"

[[tasks]]
id = "0-0"

[hooks.tasks.after]
writeJson = {{}}
clearData = {{}}
"#
        )
        .unwrap();
        let jobfile = Jobfile::load(file.path()).unwrap();
        assert_eq!(jobfile.job.store.as_deref(), Some("out"));
        assert!(jobfile.stores.is_empty());
        let after: Vec<_> = jobfile.job.hooks.tasks.after.keys().cloned().collect();
        assert_eq!(after, vec!["writeJson", "clearData"]);
        assert!(jobfile.job.hooks.tasks.before.is_empty());
    }

    #[test]
    fn malformed_input_is_config_error() {
        assert!(matches!(Jobfile::from_value(json!([])), Err(CliError::Config(_))));
        assert!(matches!(
            Jobfile::from_value(json!({ "store": 3 })),
            Err(CliError::Config(_))
        ));
    }
}
