//! Jobs, their expansion into tasks, and bounded task execution.

mod executor;
mod expand;
mod scheduler;
mod state;
mod task_kind;
mod types;

pub use executor::{JobExecutor, DEFAULT_JOB_TYPE, DEFAULT_WORKERS_LIMIT};
pub use expand::expand_tasks;
pub use scheduler::run_tasks;
pub use state::{JobState, TransitionError};
pub use task_kind::{register_task_kind, TaskKind, TaskKindRegistry};
pub use types::{Job, JobResult, Task, TaskOutcome, TaskStatus};
