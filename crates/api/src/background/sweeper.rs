//! In-process sweep loop.
//!
//! Deployments without an external cron scheduler can run the sweeper
//! inside the API process instead. Each tick runs the same pass as
//! `POST /cron/sweep`, so it is safe to enable both.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use vidnova_veo::OperationClient;

/// Run the sweep loop. Runs until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    client: Arc<dyn OperationClient>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Sweep task started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sweep task stopping");
                break;
            }
            _ = ticker.tick() => {
                match vidnova_pipeline::sweep(&pool, client.as_ref()).await {
                    Ok(report) => {
                        if report.checked > 0 {
                            tracing::info!(
                                checked = report.checked,
                                completed = report.completed,
                                failed = report.failed,
                                still_running = report.still_running,
                                poll_errors = report.poll_errors,
                                "Sweep pass finished"
                            );
                        } else {
                            tracing::debug!("Sweep pass: no running jobs");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep pass failed");
                    }
                }
            }
        }
    }
}
