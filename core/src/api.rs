//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `krawler_core::api` instead of reaching into internal modules.

pub use crate::config::{load_default, load_from, AppConfig, EngineConfig, LoggingConfig};
pub use crate::context::Krawler;
pub use crate::error::{CliError, EngineError, ErrorCode, StorageError};
pub use crate::hooks::{
    activate_hooks, lookup_hook, register_hook, sync_hook, Hook, HookConfig, HookContext, HookFailure,
    HookParams, HookRegistry, Phase, PhaseChains, Target,
};
pub use crate::jobs::{
    expand_tasks, register_task_kind, Job, JobExecutor, JobResult, JobState, Task, TaskKind,
    TaskKindRegistry, TaskOutcome, TaskStatus,
};
pub use crate::services::{JobParams, JobsService, StoresService};
pub use crate::store::{
    copy_between_stores, gunzip_from_store, gzip_to_store, read_to_bytes, write_bytes, BoxReader,
    BoxWriter, Store, StoreFactory, StoreRegistry,
};
pub use crate::util::{deep_merge, get_path, get_path_mut, render, set_path, unset_path};
