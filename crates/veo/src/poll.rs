//! Bounded synchronous polling of a long-running operation.

use std::time::Duration;

use tokio::time::Instant;

use crate::client::{OperationClient, OperationStatus, VeoApiError};

/// Total budget for waiting on one operation in the request path.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(240);

/// Delay between fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(6);

/// Consecutive fetch failures tolerated before giving up.
const MAX_FETCH_ERRORS: u32 = 3;

/// Poll an operation until it reports done or the budget runs out.
///
/// Returns `Ok(Some(status))` when the operation finished,
/// `Ok(None)` on timeout with the operation still running. Transient
/// fetch errors are logged and retried on the next tick; only
/// `MAX_FETCH_ERRORS` failures in a row abort the loop.
pub async fn poll_until_done(
    client: &dyn OperationClient,
    operation_name: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Option<OperationStatus>, VeoApiError> {
    let start = Instant::now();
    let mut consecutive_errors: u32 = 0;

    loop {
        match client.fetch_operation(operation_name).await {
            Ok(status) => {
                if status.done {
                    return Ok(Some(status));
                }
                consecutive_errors = 0;
            }
            Err(err) => {
                consecutive_errors += 1;
                if consecutive_errors >= MAX_FETCH_ERRORS {
                    return Err(err);
                }
                tracing::warn!(
                    operation_name,
                    consecutive_errors,
                    error = %err,
                    "operation fetch failed, will retry"
                );
            }
        }

        // Do not start a sleep that would overrun the budget.
        if start.elapsed() + interval >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}
