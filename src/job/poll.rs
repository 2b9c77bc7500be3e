//! Status Poller
//!
//! Polls `status` at a fixed interval until the job leaves `PENDING`/`RUNNING`.
//! The wait between polls is the only suspension point; it races a
//! cancellation token and an optional overall timeout.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatcher::JobDispatcher;
use crate::job::OutputLevel;
use crate::models::{JobId, JobStatus};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls until the service reports a terminal status.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
    pub output: OutputLevel,
}

impl PollConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            cancel: CancellationToken::new(),
            output: OutputLevel::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_output(mut self, output: OutputLevel) -> Self {
        self.output = output;
        self
    }
}

/// Final status plus how much work it took to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub status: JobStatus,
    pub polls: u32,
    pub sleeps: u32,
}

pub struct StatusPoller<'a> {
    dispatcher: &'a dyn JobDispatcher,
    config: PollConfig,
}

impl<'a> StatusPoller<'a> {
    pub fn new(dispatcher: &'a dyn JobDispatcher, config: PollConfig) -> Self {
        Self { dispatcher, config }
    }

    pub async fn poll(&self, job_id: &JobId) -> AppResult<PollOutcome> {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);
        let mut polls = 0u32;
        let mut sleeps = 0u32;

        loop {
            if self.config.cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let status = self.dispatcher.get_status(job_id).await?;
            polls += 1;
            debug!(job_id = %job_id, status = %status, polls, "Polled job status");
            if self.config.output.at(1) {
                println!("{}", status);
            }

            if status.is_terminal() {
                info!(job_id = %job_id, status = %status, polls, "Job reached terminal status");
                return Ok(PollOutcome { status, polls, sleeps });
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(AppError::PollTimeout {
                            job_id: job_id.clone(),
                            elapsed: now - started,
                        });
                    }
                    self.config.interval.min(deadline - now)
                }
                None => self.config.interval,
            };

            tokio::select! {
                _ = self.config.cancel.cancelled() => return Err(AppError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
            sleeps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::testing::ScriptedDispatcher;

    fn quiet(interval: Duration) -> PollConfig {
        PollConfig::new(interval).with_output(OutputLevel::new(0))
    }

    #[tokio::test]
    async fn test_pending_running_running_finished() {
        let dispatcher = ScriptedDispatcher::with_statuses(&["PENDING", "RUNNING", "RUNNING", "FINISHED"]);
        let outcome = StatusPoller::new(&dispatcher, quiet(Duration::ZERO))
            .poll(&JobId::new("job"))
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Finished);
        assert_eq!(outcome.polls, 4);
        assert_eq!(outcome.sleeps, 3);
        assert_eq!(dispatcher.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_terminal_first_poll_never_sleeps() {
        for raw in ["FINISHED", "ERROR", "FAILURE", "NOT_FOUND", "SOMETHING_NEW"] {
            let dispatcher = ScriptedDispatcher::with_statuses(&[raw]);
            let outcome = StatusPoller::new(&dispatcher, quiet(Duration::from_secs(3600)))
                .poll(&JobId::new("job"))
                .await
                .unwrap();
            assert_eq!(outcome.status, JobStatus::parse(raw));
            assert_eq!(outcome.polls, 1);
            assert_eq!(outcome.sleeps, 0);
        }
    }

    #[tokio::test]
    async fn test_error_status_stops_polling() {
        let dispatcher = ScriptedDispatcher::with_statuses(&["RUNNING", "ERROR", "RUNNING"]);
        let outcome = StatusPoller::new(&dispatcher, quiet(Duration::ZERO))
            .poll(&JobId::new("job"))
            .await
            .unwrap();
        assert_eq!(outcome.status, JobStatus::Error);
        assert_eq!(dispatcher.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout() {
        // The script repeats its last status forever.
        let dispatcher = ScriptedDispatcher::with_statuses(&["RUNNING"]);
        let config = quiet(Duration::from_millis(5)).with_timeout(Some(Duration::from_millis(30)));
        let err = StatusPoller::new(&dispatcher, config)
            .poll(&JobId::new("slow"))
            .await
            .unwrap_err();
        match err {
            AppError::PollTimeout { job_id, elapsed } => {
                assert_eq!(job_id.as_str(), "slow");
                assert!(elapsed >= Duration::from_millis(30));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_sleep() {
        let dispatcher = ScriptedDispatcher::with_statuses(&["PENDING"]);
        let cancel = CancellationToken::new();
        let config = quiet(Duration::from_secs(3600)).with_cancel(cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = StatusPoller::new(&dispatcher, config)
            .poll(&JobId::new("job"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(dispatcher.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_status_errors_propagate() {
        let dispatcher = ScriptedDispatcher::with_statuses(&[]);
        let err = StatusPoller::new(&dispatcher, quiet(Duration::ZERO))
            .poll(&JobId::new("job"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Service { status: 404, .. }));
    }
}
