use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::Semaphore;

use super::types::{Task, TaskOutcome};

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one pipeline per task with at most `workers_limit` in flight.
///
/// Every pipeline holds a semaphore slot for its whole duration and releases
/// it on completion, success or failure. Pipelines never see each other's
/// failures; a panicking pipeline becomes a failed outcome. Returns once all
/// tasks are terminal, with outcomes in expansion order.
pub async fn run_tasks<F, Fut>(tasks: Vec<Task>, workers_limit: usize, run: F) -> Vec<TaskOutcome>
where
    F: Fn(Task) -> Fut,
    Fut: Future<Output = TaskOutcome>,
{
    let total = tasks.len();
    let sem = Arc::new(Semaphore::new(workers_limit.max(1)));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for (index, task) in tasks.into_iter().enumerate() {
        let sem = sem.clone();
        let id = task.id.clone();
        let pipeline = run(task);

        futs.push(async move {
            // The semaphore is never closed while pipelines are pending.
            let permit = sem.acquire_owned().await.ok();
            let started = Instant::now();
            let outcome = AssertUnwindSafe(pipeline)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic);
                    tracing::error!(target: "krawler.tasks", task_id = %id, %message, "task pipeline panicked");
                    TaskOutcome::panicked(id, message, started.elapsed().as_millis() as u64)
                });
            drop(permit);
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<TaskOutcome>> = (0..total).map(|_| None).collect();
    while let Some((index, outcome)) = futs.next().await {
        slots[index] = Some(outcome);
    }
    slots.into_iter().flatten().collect()
}
