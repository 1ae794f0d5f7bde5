use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::hooks::{activate_hooks_with, HookContext, HookParams, HookRegistry, Phase, PhaseChains, Target};
use crate::store::{Store, StoreRegistry};

use super::expand::expand_tasks;
use super::scheduler::run_tasks;
use super::state::JobState;
use super::task_kind::TaskKindRegistry;
use super::types::{Job, JobResult, Task, TaskOutcome, TaskStatus};

pub const DEFAULT_WORKERS_LIMIT: usize = 4;
pub const DEFAULT_JOB_TYPE: &str = "async";

/// Tracks and logs the state of one job run.
struct JobTracker<'a> {
    job_id: &'a str,
    state: JobState,
}

impl<'a> JobTracker<'a> {
    fn new(job_id: &'a str) -> Self {
        Self {
            job_id,
            state: JobState::Created,
        }
    }

    fn advance(&mut self, to: JobState) -> Result<(), EngineError> {
        self.state.validate(to).map_err(EngineError::domain)?;
        tracing::debug!(target: "krawler.jobs", job_id = %self.job_id, from = %self.state, to = %to, "job state");
        self.state = to;
        Ok(())
    }

    fn errored(&mut self, err: &EngineError) {
        tracing::error!(target: "krawler.jobs", job_id = %self.job_id, state = %self.state, error = %err, "job failed");
        if self.state.can_transition_to(JobState::Errored) {
            self.state = JobState::Errored;
        }
    }
}

/// Everything a task pipeline needs, shared by all pipelines of a job.
struct TaskRun {
    job_id: String,
    chains: PhaseChains,
    kinds: Arc<TaskKindRegistry>,
    stores: Arc<StoreRegistry>,
    job_store: Option<Arc<dyn Store>>,
}

impl TaskRun {
    async fn run(&self, task: Task) -> TaskOutcome {
        let started = Instant::now();
        let id = task.id.clone();
        let mut ctx = HookContext::new(
            Target::Tasks,
            task.to_value(),
            HookParams::new(self.stores.clone()),
        );
        ctx.result = json!({ "id": id });

        tracing::debug!(target: "krawler.tasks", job_id = %self.job_id, task_id = %id, "task start");
        let res = self.pipeline(&task, &mut ctx).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match res {
            Ok(()) => {
                tracing::info!(target: "krawler.tasks", job_id = %self.job_id, task_id = %id, duration_ms, "task succeeded");
                TaskOutcome {
                    id,
                    status: TaskStatus::Succeeded,
                    result: ctx.result,
                    error: None,
                    duration_ms,
                }
            }
            Err(err) => {
                tracing::warn!(target: "krawler.tasks", job_id = %self.job_id, task_id = %id, error = %err, "task failed");
                TaskOutcome {
                    id,
                    status: TaskStatus::Failed,
                    result: ctx.result,
                    error: ctx.error,
                    duration_ms,
                }
            }
        }
    }

    /// before chain, domain work, after chain. Failures outside a chain still
    /// go through the error chain.
    async fn pipeline(&self, task: &Task, ctx: &mut HookContext) -> Result<(), EngineError> {
        let store = match task.store_id() {
            Some(store_id) => match self.stores.get(store_id) {
                Ok(store) => Some(store),
                Err(err) => return Err(self.chains.fail(ctx, None, err.into()).await),
            },
            None => self.job_store.clone(),
        };
        ctx.params.store = store;

        self.chains.run_phase(Phase::Before, ctx).await?;

        // Before hooks may rewrite the task, so its kind is read afterwards.
        let kind = ctx.data.get("type").and_then(Value::as_str).map(str::to_owned);
        if let Some(kind) = kind {
            let done = match self.kinds.lookup(&kind) {
                Ok(task_kind) => task_kind.run(ctx).await,
                Err(err) => Err(err),
            };
            if let Err(err) = done {
                return Err(self.chains.fail(ctx, Some(&kind), err).await);
            }
        }

        self.chains.run_phase(Phase::After, ctx).await
    }
}

/// Drives a job through its states: job `before` chain, task expansion,
/// bounded task scheduling, job `after` chain.
#[derive(Clone)]
pub struct JobExecutor {
    stores: Arc<StoreRegistry>,
    hooks: Arc<HookRegistry>,
    kinds: Arc<TaskKindRegistry>,
    workers_limit: usize,
    default_job_type: String,
}

impl JobExecutor {
    /// Executor over the process-wide hook and task kind registries.
    pub fn new(stores: Arc<StoreRegistry>) -> Self {
        Self {
            stores,
            hooks: HookRegistry::global(),
            kinds: TaskKindRegistry::global(),
            workers_limit: DEFAULT_WORKERS_LIMIT,
            default_job_type: DEFAULT_JOB_TYPE.to_string(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_task_kinds(mut self, kinds: Arc<TaskKindRegistry>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_workers_limit(mut self, workers_limit: usize) -> Self {
        self.workers_limit = workers_limit.max(1);
        self
    }

    pub fn with_default_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.default_job_type = job_type.into();
        self
    }

    pub fn stores(&self) -> &Arc<StoreRegistry> {
        &self.stores
    }

    /// Run `job` to completion. `store` is the job's default store, used by
    /// job hooks and by every task that does not name its own.
    ///
    /// A failure of a job hook, task expansion or configuration fails the
    /// job. Task failures are isolated and only reported in the outcomes.
    pub async fn run(&self, job: Job, store: Option<Arc<dyn Store>>) -> Result<JobResult, EngineError> {
        let started_at = Utc::now();
        let started = Instant::now();
        let job_id = job.id.clone();
        let mut tracker = JobTracker::new(&job_id);

        match self.drive(&mut tracker, job, store).await {
            Ok((outcomes, result)) => {
                let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
                let failed = outcomes.len() - succeeded;
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::info!(
                    target: "krawler.jobs",
                    job_id = %job_id, succeeded, failed, duration_ms,
                    "job completed"
                );
                Ok(JobResult {
                    id: job_id.clone(),
                    state: tracker.state,
                    started_at,
                    duration_ms,
                    succeeded,
                    failed,
                    outcomes,
                    result,
                })
            }
            Err(err) => {
                tracker.errored(&err);
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        tracker: &mut JobTracker<'_>,
        job: Job,
        store: Option<Arc<dyn Store>>,
    ) -> Result<(Vec<TaskOutcome>, Value), EngineError> {
        let job_type = job
            .kind
            .clone()
            .unwrap_or_else(|| self.default_job_type.clone());
        let sync = match job_type.as_str() {
            "async" => false,
            "sync" => true,
            other => {
                return Err(EngineError::configuration(format!(
                    "can't find job generator for job type '{other}'"
                )))
            }
        };

        let job_chains = activate_hooks_with(&self.hooks, &job.hooks, Target::Jobs)?;
        let task_chains = activate_hooks_with(&self.hooks, &job.hooks, Target::Tasks)?;

        let mut params = HookParams::new(self.stores.clone()).with_store(store.clone());
        params.extra.insert("jobId".into(), Value::String(job.id.clone()));
        let mut ctx = HookContext::new(Target::Jobs, job.to_data(), params);

        tracker.advance(JobState::RunningBeforeHooks)?;
        tracing::info!(target: "krawler.jobs", job_id = %job.id, job_type = %job_type, "job start");
        job_chains.run_phase(Phase::Before, &mut ctx).await?;

        tracker.advance(JobState::ExpandingTasks)?;
        let workers_limit = if sync {
            1
        } else {
            self.workers_limit_for(&ctx.data)?
        };
        let raw_tasks = match ctx.data.get("tasks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(tasks)) => tasks.clone(),
            Some(other) => {
                return Err(EngineError::validation(format!(
                    "job tasks must be an array, got {other}"
                )))
            }
        };
        let tasks = expand_tasks(&job.id, ctx.data.get("taskTemplate"), &raw_tasks)?;
        tracing::info!(target: "krawler.jobs", job_id = %job.id, tasks = tasks.len(), workers_limit, "tasks expanded");

        tracker.advance(JobState::RunningTasks)?;
        let task_run = Arc::new(TaskRun {
            job_id: job.id.clone(),
            chains: task_chains,
            kinds: self.kinds.clone(),
            stores: self.stores.clone(),
            job_store: store,
        });
        let outcomes = run_tasks(tasks, workers_limit, |task| {
            let task_run = task_run.clone();
            async move { task_run.run(task).await }
        })
        .await;

        tracker.advance(JobState::RunningAfterHooks)?;
        ctx.result = serde_json::to_value(&outcomes)?;
        job_chains.run_phase(Phase::After, &mut ctx).await?;

        tracker.advance(JobState::Completed)?;
        Ok((outcomes, ctx.result))
    }

    /// `options.workersLimit` of the (possibly hook-mutated) job, else the
    /// executor default.
    fn workers_limit_for(&self, data: &Value) -> Result<usize, EngineError> {
        match data.get("options").and_then(|o| o.get("workersLimit")) {
            None | Some(Value::Null) => Ok(self.workers_limit),
            Some(value) => match value.as_u64() {
                Some(n) if n > 0 => Ok(n as usize),
                _ => Err(EngineError::validation(format!(
                    "workersLimit must be a positive integer, got {value}"
                ))),
            },
        }
    }
}
