use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "krawler.tasks=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Task pipelines allowed in flight per job, unless the job sets
    /// `options.workersLimit`.
    #[serde(default = "default_workers_limit")]
    pub workers_limit: usize,

    #[serde(default = "default_job_type")]
    pub default_job_type: String,
}

fn default_workers_limit() -> usize {
    crate::jobs::DEFAULT_WORKERS_LIMIT
}

fn default_job_type() -> String {
    crate::jobs::DEFAULT_JOB_TYPE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers_limit: default_workers_limit(),
            default_job_type: default_job_type(),
        }
    }
}
