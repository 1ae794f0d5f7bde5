use krawler_core::api::{CliError, JobParams, Krawler};
use serde_json::json;

use super::cli::{CleanArgs, RunArgs};
use crate::jobfile::Jobfile;

pub async fn run(args: RunArgs, krawler: &Krawler) -> Result<i32, CliError> {
    let mut jobfile = Jobfile::load(&args.jobfile)?;
    if let Some(limit) = args.workers_limit {
        if limit == 0 {
            return Err(CliError::Command("--workers-limit must be at least 1".into()));
        }
        if !jobfile.job.options.is_object() {
            jobfile.job.options = json!({});
        }
        jobfile.job.options["workersLimit"] = json!(limit);
    }
    jobfile.create_stores(krawler)?;

    let result = krawler
        .jobs()
        .create(jobfile.job, &JobParams::default())
        .await?;
    let out = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .map_err(|e| CliError::Command(e.to_string()))?;
    println!("{out}");

    if result.failed > 0 {
        tracing::warn!(target: "krawler.jobs", job_id = %result.id, failed = result.failed, "job completed with failed tasks");
    }
    Ok(0)
}

pub async fn clean(args: CleanArgs, krawler: &Krawler) -> Result<i32, CliError> {
    let jobfile = Jobfile::load(&args.jobfile)?;
    jobfile.create_stores(krawler)?;
    let Some(store) = jobfile.job.store.clone() else {
        return Err(CliError::Config(format!(
            "jobfile {} declares no store to clean",
            args.jobfile.display()
        )));
    };
    krawler
        .jobs()
        .remove(&jobfile.job.id, &JobParams::with_store(store))
        .await?;
    Ok(0)
}
