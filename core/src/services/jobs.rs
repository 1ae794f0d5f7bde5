use std::sync::Arc;

use crate::error::EngineError;
use crate::jobs::{Job, JobExecutor, JobResult};
use crate::store::{Store, StoreRegistry};

/// Caller parameters of a job operation.
#[derive(Debug, Clone, Default)]
pub struct JobParams {
    /// Store id, taking precedence over the job's own `store`.
    pub store: Option<String>,
}

impl JobParams {
    pub fn with_store(store: impl Into<String>) -> Self {
        Self {
            store: Some(store.into()),
        }
    }
}

/// Job submission and cleanup.
#[derive(Clone)]
pub struct JobsService {
    executor: JobExecutor,
}

impl JobsService {
    pub fn new(executor: JobExecutor) -> Self {
        Self { executor }
    }

    fn registry(&self) -> &Arc<StoreRegistry> {
        self.executor.stores()
    }

    fn resolve_store(&self, store_id: Option<&str>) -> Result<Option<Arc<dyn Store>>, EngineError> {
        store_id
            .map(|id| self.registry().get(id))
            .transpose()
            .map_err(EngineError::from)
    }

    /// Run a job to completion and return its aggregate.
    pub async fn create(&self, job: Job, params: &JobParams) -> Result<JobResult, EngineError> {
        let store_id = params.store.as_deref().or(job.store.as_deref());
        let store = self.resolve_store(store_id)?;
        self.executor.run(job, store).await
    }

    /// Delete the job's persisted output (`id`) from its store.
    ///
    /// The store must exist; a failure of the deletion itself is only logged
    /// so cleanup never blocks later operations.
    pub async fn remove(&self, id: &str, params: &JobParams) -> Result<(), EngineError> {
        let Some(store) = self.resolve_store(params.store.as_deref())? else {
            return Err(EngineError::configuration(format!(
                "a store is required to remove job '{id}'"
            )));
        };
        tracing::debug!(target: "krawler.jobs", job_id = %id, store = %store.id(), "removing job data");
        if let Err(err) = store.remove(id).await {
            tracing::warn!(target: "krawler.jobs", job_id = %id, store = %store.id(), error = %err, "job cleanup failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;
    use crate::jobs::TaskKindRegistry;
    use crate::store::testing::MemStore;
    use crate::store::write_bytes;
    use serde_json::json;

    fn service(store: MemStore) -> JobsService {
        let registry = Arc::new(StoreRegistry::new());
        registry.insert(Arc::new(store)).unwrap();
        JobsService::new(
            JobExecutor::new(registry)
                .with_hooks(Arc::new(HookRegistry::new()))
                .with_task_kinds(Arc::new(TaskKindRegistry::new())),
        )
    }

    #[tokio::test]
    async fn remove_deletes_job_output() {
        let store = MemStore::new("mem");
        write_bytes(&store, "job-1", b"merged").await.unwrap();
        let jobs = service(store.clone());
        jobs.remove("job-1", &JobParams::with_store("mem")).await.unwrap();
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn remove_swallows_storage_failure() {
        let mut store = MemStore::new("mem");
        store.fail_remove = true;
        write_bytes(&store, "job-1", b"merged").await.unwrap();
        let jobs = service(store.clone());
        jobs.remove("job-1", &JobParams::with_store("mem")).await.unwrap();
        assert_eq!(store.keys(), vec!["job-1"]);
    }

    #[tokio::test]
    async fn remove_requires_a_known_store() {
        let jobs = service(MemStore::new("mem"));
        let err = jobs.remove("job-1", &JobParams::with_store("s3")).await.unwrap_err();
        assert_eq!(err.error_code(), crate::error::ErrorCode::StoreNotFound);
        assert!(jobs.remove("job-1", &JobParams::default()).await.is_err());
    }

    #[tokio::test]
    async fn create_prefers_params_store() {
        let jobs = service(MemStore::new("mem"));
        let job = Job::from_value(json!({ "id": "j", "store": "missing", "tasks": [{ "id": "a" }] })).unwrap();
        assert!(jobs.create(job.clone(), &JobParams::default()).await.is_err());
        let result = jobs.create(job, &JobParams::with_store("mem")).await.unwrap();
        assert_eq!(result.succeeded, 1);
    }
}
