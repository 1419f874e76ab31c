//! "Until succeeds" executor.

use std::future::Future;
use std::time::Duration;

use warden_common::AclInitError;

/// Outcome of a single attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// Done, stop retrying
    Success(T),
    /// Transient failure, try again after the interval
    Retry(anyhow::Error),
    /// Permanent failure, stop and surface this error
    Fatal(AclInitError),
}

impl<T> Attempt<T> {
    /// Maps any error to `Retry`
    pub fn retry_on_err<E>(result: Result<T, E>) -> Self
    where
        E: Into<anyhow::Error>,
    {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Retry(err.into()),
        }
    }
}

/// Retries an operation until it succeeds or reports a fatal failure
#[derive(Debug, Clone)]
pub struct RetryDriver {
    /// Pause between attempts
    interval: Duration,
}

impl RetryDriver {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs `attempt` until it returns `Success` or `Fatal`.
    ///
    /// Transient failures never end the loop; each one is logged with the
    /// operation description so a stuck loop is visible to operators.
    pub async fn until_succeeds<T, F, Fut>(
        &self,
        operation: &str,
        mut attempt: F,
    ) -> Result<T, AclInitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Attempt::Success(value) => {
                    tracing::info!(operation = %operation, attempts, "Success: {}", operation);
                    return Ok(value);
                }
                Attempt::Fatal(err) => {
                    tracing::error!(
                        operation = %operation,
                        attempts,
                        error = %err,
                        "Unrecoverable failure: {}",
                        operation
                    );
                    return Err(err);
                }
                Attempt::Retry(err) => {
                    let message = format!("{:#}", err);
                    tracing::error!(
                        operation = %operation,
                        attempts,
                        error = %message,
                        "Failure: {}",
                        operation
                    );
                    tracing::info!(interval = ?self.interval, "Retrying");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}
