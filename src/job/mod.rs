//! Job lifecycle
//!
//! Every tool run goes through the same stages against a [`JobDispatcher`]:
//!
//! ```text
//!  SubmitRequest
//!      │
//!      ▼
//! ┌─────────────┐
//! │   submit    │  → JobId
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │    poll     │  → status every interval until terminal
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │    fetch    │  → {base}.{identifier}.{suffix} per result type
//! └─────────────┘
//! ```
//!
//! Batch input runs the same stages per record, a chunk at a time.

pub mod batch;
pub mod fetch;
pub mod input;
pub mod poll;
pub mod submit;

pub use batch::{run_batch, BatchConfig, BatchInput, BatchJob, BatchRecord};
pub use fetch::{fetch_results, FetchConfig, OutputFilter};
pub use input::InputSource;
pub use poll::{PollConfig, PollOutcome, StatusPoller};
pub use submit::{submit, SubmitRequest};

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::dispatcher::JobDispatcher;
use crate::models::{JobId, JobStatus, ParameterDetails, ResultType};
use crate::types::{AppError, AppResult};

/// How chatty user-facing output is. 0 prints bare values only, 1 adds
/// progress messages, 2 and above add per-request detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputLevel(i8);

impl OutputLevel {
    pub fn new(level: i8) -> Self {
        Self(level)
    }

    /// `--quiet` lowers the default by one, each `--verbose` raises it.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        let verbose = i8::try_from(verbose).unwrap_or(i8::MAX - 1);
        Self(1 - i8::from(quiet)).raised(verbose)
    }

    fn raised(self, by: i8) -> Self {
        Self(self.0.saturating_add(by))
    }

    pub fn at(&self, level: i8) -> bool {
        self.0 >= level
    }
}

impl Default for OutputLevel {
    fn default() -> Self {
        Self(1)
    }
}

fn announce_job_id(job_id: &JobId, output: OutputLevel) {
    if output.at(1) {
        eprintln!("JobId: {}", job_id);
    } else {
        println!("{}", job_id);
    }
}

/// Submit, wait, poll and fetch in one go.
pub async fn run_sync(
    dispatcher: &dyn JobDispatcher,
    request: &SubmitRequest,
    poll: &PollConfig,
    fetch: &FetchConfig,
    initial_delay: Duration,
) -> AppResult<Vec<PathBuf>> {
    let job_id = submit(dispatcher, request).await?;
    announce_job_id(&job_id, fetch.output);

    // First status check comes one interval after submission.
    tokio::select! {
        _ = poll.cancel.cancelled() => return Err(AppError::Cancelled),
        _ = tokio::time::sleep(initial_delay) => {}
    }

    poll_and_fetch(dispatcher, &job_id, poll, fetch).await
}

/// Submit and return straight away.
pub async fn submit_async(
    dispatcher: &dyn JobDispatcher,
    request: &SubmitRequest,
    output: OutputLevel,
) -> AppResult<JobId> {
    let job_id = submit(dispatcher, request).await?;
    println!("{}", job_id);
    if output.at(1) {
        eprintln!(
            "To check status: --status --jobid {id}\nTo get results: --polljob --jobid {id}",
            id = job_id
        );
    }
    Ok(job_id)
}

/// Poll an existing job to completion and fetch its results. Results are
/// fetched for every terminal status; a failed job still carries its error
/// output.
pub async fn poll_and_fetch(
    dispatcher: &dyn JobDispatcher,
    job_id: &JobId,
    poll: &PollConfig,
    fetch: &FetchConfig,
) -> AppResult<Vec<PathBuf>> {
    let outcome = StatusPoller::new(dispatcher, poll.clone()).poll(job_id).await?;
    debug!(job_id = %job_id, polls = outcome.polls, sleeps = outcome.sleeps, "Polling done");
    if !outcome.status.is_finished() {
        warn!(job_id = %job_id, status = %outcome.status, "Job did not finish, fetching what it produced");
    }
    fetch_results(dispatcher, job_id, fetch).await
}

/// Result types of a job, refused while it is still queued or running.
pub async fn finished_result_types(
    dispatcher: &dyn JobDispatcher,
    job_id: &JobId,
) -> AppResult<Vec<ResultType>> {
    let status = dispatcher.get_status(job_id).await?;
    if matches!(status, JobStatus::Pending | JobStatus::Running) {
        return Err(AppError::JobNotFinished(status));
    }
    dispatcher.get_result_types(job_id).await
}

pub fn format_result_types(result_types: &[ResultType]) -> String {
    let mut out = String::new();
    for rt in result_types {
        let _ = writeln!(out, "{}", rt.identifier);
        for field in [&rt.label, &rt.description].into_iter().flatten() {
            let _ = writeln!(out, "\t{}", field);
        }
        let _ = writeln!(out, "\t{}", rt.media_type);
        let _ = writeln!(out, "\t{}", rt.file_suffix);
    }
    out
}

pub fn format_parameter_details(details: &ParameterDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\t{}", details.name, details.kind.as_deref().unwrap_or(""));
    if let Some(description) = &details.description {
        let _ = writeln!(out, "{}", description);
    }
    for value in &details.values {
        let mut line = value.value.clone().unwrap_or_default();
        if value.default_value {
            line.push_str(" default");
        }
        let _ = writeln!(out, "{}", line);
        if let Some(label) = &value.label {
            let _ = writeln!(out, "\t{}", label);
        }
        for (key, val) in &value.properties {
            let _ = writeln!(out, "\t{}\t{}", key, val);
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory dispatcher for exercising the lifecycle without HTTP.

    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::dispatcher::JobDispatcher;
    use crate::models::{JobId, JobStatus, ParameterDetails, ParameterSet, ResultType};
    use crate::types::{AppError, AppResult};

    #[derive(Debug, Clone)]
    pub struct Submission {
        pub email: String,
        pub title: Option<String>,
        pub params: ParameterSet,
    }

    /// Plays back a status script (the last status repeats forever) and
    /// serves fixed result payloads. Records every call it sees.
    #[derive(Default)]
    pub struct ScriptedDispatcher {
        statuses: Mutex<VecDeque<String>>,
        results: Vec<(ResultType, Vec<u8>)>,
        parameters: Vec<String>,
        details: Vec<ParameterDetails>,
        events: Mutex<Vec<&'static str>>,
        status_calls: Mutex<u32>,
        submissions: Mutex<Vec<Submission>>,
        result_calls: Mutex<Vec<String>>,
    }

    impl ScriptedDispatcher {
        pub fn with_statuses(statuses: &[&str]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().map(|s| s.to_string()).collect()),
                ..Self::default()
            }
        }

        pub fn with_result(mut self, result_type: ResultType, payload: Vec<u8>) -> Self {
            self.results.push((result_type, payload));
            self
        }

        pub fn with_parameters(mut self, names: &[&str]) -> Self {
            self.parameters = names.iter().map(|n| n.to_string()).collect();
            self
        }

        pub fn with_details(mut self, details: ParameterDetails) -> Self {
            self.details.push(details);
            self
        }

        pub fn status_calls(&self) -> u32 {
            *self.status_calls.lock().unwrap()
        }

        pub fn submissions(&self) -> Vec<Submission> {
            self.submissions.lock().unwrap().clone()
        }

        pub fn result_calls(&self) -> Vec<String> {
            self.result_calls.lock().unwrap().clone()
        }

        pub fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }

        fn not_found(what: &str) -> AppError {
            AppError::Service {
                status: 404,
                message: format!("{} not found", what),
            }
        }
    }

    #[async_trait]
    impl JobDispatcher for ScriptedDispatcher {
        async fn get_parameters(&self) -> AppResult<Vec<String>> {
            Ok(self.parameters.clone())
        }

        async fn get_parameter_details(&self, parameter_id: &str) -> AppResult<ParameterDetails> {
            self.details
                .iter()
                .find(|d| d.name == parameter_id)
                .cloned()
                .ok_or_else(|| Self::not_found(parameter_id))
        }

        async fn run(
            &self,
            email: &str,
            title: Option<&str>,
            params: &ParameterSet,
        ) -> AppResult<JobId> {
            self.events.lock().unwrap().push("run");
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(Submission {
                email: email.to_string(),
                title: title.map(str::to_string),
                params: params.clone(),
            });
            Ok(JobId::new(format!("job-{}", submissions.len())))
        }

        async fn get_status(&self, job_id: &JobId) -> AppResult<JobStatus> {
            self.events.lock().unwrap().push("status");
            *self.status_calls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let raw = if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            };
            raw.map(|s| JobStatus::parse(&s))
                .ok_or_else(|| Self::not_found(job_id.as_str()))
        }

        async fn get_result_types(&self, _job_id: &JobId) -> AppResult<Vec<ResultType>> {
            Ok(self.results.iter().map(|(rt, _)| rt.clone()).collect())
        }

        async fn get_result(&self, _job_id: &JobId, result_type: &str) -> AppResult<Bytes> {
            self.events.lock().unwrap().push("result");
            self.result_calls.lock().unwrap().push(result_type.to_string());
            self.results
                .iter()
                .find(|(rt, _)| rt.identifier == result_type)
                .map(|(_, payload)| Bytes::from(payload.clone()))
                .ok_or_else(|| Self::not_found(result_type))
        }
    }
}
