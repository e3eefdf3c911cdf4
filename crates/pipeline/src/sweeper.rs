//! Out-of-band sweep of running jobs.
//!
//! The synchronous poll loop gives up after its budget; this pass picks
//! up whatever is still marked running, asks the provider once per job,
//! and applies terminal outcomes through the same idempotent write the
//! poll loop uses.

use sqlx::PgPool;

use vidnova_db::models::video_job::{TerminalApply, TerminalOutcome};
use vidnova_db::repositories::VideoJobRepo;
use vidnova_veo::OperationClient;

use crate::generate::outcome_from_status;

/// Provider errors tolerated on one job before it is failed outright.
pub const MAX_CONSECUTIVE_POLL_ERRORS: i32 = 3;

/// Counters from one sweep pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweepReport {
    pub checked: usize,
    pub completed: usize,
    pub failed: usize,
    pub still_running: usize,
    pub poll_errors: usize,
}

/// Run one sweep pass over the oldest running jobs.
///
/// Provider errors increment the job's consecutive error counter; only
/// after `MAX_CONSECUTIVE_POLL_ERRORS` in a row is the job failed.
/// A successful fetch resets the counter.
pub async fn sweep(
    pool: &PgPool,
    client: &dyn OperationClient,
) -> Result<SweepReport, sqlx::Error> {
    let jobs = VideoJobRepo::list_running(pool).await?;
    let mut report = SweepReport {
        checked: jobs.len(),
        ..SweepReport::default()
    };

    for job in jobs {
        let Some(operation_name) = job.operation_name.as_deref() else {
            continue;
        };

        match client.fetch_operation(operation_name).await {
            Ok(status) => {
                VideoJobRepo::reset_poll_errors(pool, job.id).await?;
                if !status.done {
                    report.still_running += 1;
                    continue;
                }
                let outcome = outcome_from_status(&status);
                let applied = VideoJobRepo::record_terminal(pool, job.id, &outcome).await?;
                if applied == TerminalApply::Conflict {
                    tracing::error!(
                        job_id = job.id,
                        observed = outcome.status_name(),
                        "job already terminal with a different outcome"
                    );
                    continue;
                }
                match outcome {
                    TerminalOutcome::Succeeded { .. } => report.completed += 1,
                    TerminalOutcome::Failed { .. } => report.failed += 1,
                }
            }
            Err(err) => {
                report.poll_errors += 1;
                let count = VideoJobRepo::record_poll_error(pool, job.id).await?;
                tracing::warn!(
                    job_id = job.id,
                    consecutive_errors = count,
                    error = %err,
                    "sweep fetch failed"
                );
                if count >= MAX_CONSECUTIVE_POLL_ERRORS {
                    let outcome = TerminalOutcome::Failed {
                        error: format!("provider polling failed repeatedly: {err}"),
                    };
                    VideoJobRepo::record_terminal(pool, job.id, &outcome).await?;
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}
