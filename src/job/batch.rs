//! Batch submission for multi-FASTA and identifier-list inputs.
//!
//! Records are taken `max_jobs` at a time: every record in the chunk is
//! submitted, then the chunk's jobs are polled and fetched one after the
//! other. Nothing runs concurrently.

use tracing::{info, warn};

use crate::dispatcher::JobDispatcher;
use crate::job::fetch::{fetch_results, FetchConfig};
use crate::job::poll::{PollConfig, StatusPoller};
use crate::job::submit::{submit, SubmitRequest};
use crate::models::{JobId, JobStatus};
use crate::types::AppResult;
use std::path::PathBuf;

/// One unit of batch input: the text sent as `sequence` and a short id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub id: String,
    pub content: String,
}

/// Ordered records to run, one job each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInput {
    records: Vec<BatchRecord>,
}

impl BatchInput {
    /// Split FASTA text into records. Lines before the first header are ignored.
    pub fn from_multifasta(text: &str) -> Self {
        Self {
            records: parse_multifasta(text),
        }
    }

    /// One `DB:ID` identifier per line; other lines are skipped.
    pub fn from_id_list(text: &str) -> Self {
        Self {
            records: parse_id_list(text),
        }
    }

    pub fn records(&self) -> &[BatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_multifasta(text: &str) -> Vec<BatchRecord> {
    let mut records = Vec::new();
    let mut current: Option<BatchRecord> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(header) = line.strip_prefix('>') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            let id = header.split_whitespace().next().unwrap_or("").to_string();
            current = Some(BatchRecord {
                id,
                content: format!("{}\n", line),
            });
        } else if let Some(record) = current.as_mut() {
            if !line.trim().is_empty() {
                record.content.push_str(line);
                record.content.push('\n');
            }
        }
    }
    if let Some(done) = current {
        records.push(done);
    }
    records
}

fn parse_id_list(text: &str) -> Vec<BatchRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.find(':').map(|pos| pos > 0).unwrap_or(false))
        .map(|line| BatchRecord {
            id: line.to_string(),
            content: line.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Jobs submitted before the first of them is polled. At least 1.
    pub max_jobs: usize,
    /// Name result files after the record id instead of the job id.
    pub use_seq_id: bool,
    pub poll: PollConfig,
    pub fetch: FetchConfig,
}

/// Outcome for one record.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub record_id: String,
    pub job_id: JobId,
    pub status: JobStatus,
    pub files: Vec<PathBuf>,
}

/// Submit, poll and fetch every record. `template` supplies e-mail, title
/// and the shared tool parameters; each record replaces `sequence`.
pub async fn run_batch(
    dispatcher: &dyn JobDispatcher,
    template: &SubmitRequest,
    input: &BatchInput,
    config: &BatchConfig,
) -> AppResult<Vec<BatchJob>> {
    let chunk_size = config.max_jobs.max(1);
    let mut outcomes = Vec::with_capacity(input.len());

    for chunk in input.records().chunks(chunk_size) {
        let mut submitted = Vec::with_capacity(chunk.len());
        for record in chunk {
            let mut request = template.clone();
            request.params.insert("sequence", record.content.clone());
            if config.fetch.output.at(1) && config.use_seq_id {
                eprintln!("Submitting job for: {}", record.id);
            }
            let job_id = submit(dispatcher, &request).await?;
            if config.fetch.output.at(1) {
                eprintln!("JobId: {}", job_id);
            } else {
                println!("{}", job_id);
            }
            submitted.push((record, job_id));
        }

        for (record, job_id) in submitted {
            let outcome = StatusPoller::new(dispatcher, config.poll.clone())
                .poll(&job_id)
                .await?;

            if !outcome.status.is_finished() {
                warn!(job_id = %job_id, record = %record.id, status = %outcome.status, "Job did not finish, fetching what it produced");
            }
            let fetch = FetchConfig {
                outfile: config.use_seq_id.then(|| record.id.clone()),
                ..config.fetch.clone()
            };
            let files = fetch_results(dispatcher, &job_id, &fetch).await?;

            outcomes.push(BatchJob {
                record_id: record.id.clone(),
                job_id,
                status: outcome.status,
                files,
            });
        }
    }

    info!(records = input.len(), "Batch complete");
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::testing::ScriptedDispatcher;
    use crate::job::OutputLevel;
    use crate::models::{ParameterSet, ResultType};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_multifasta() {
        let text = "junk before\n>sp|P1|ONE first protein\nMKV\nLLA\n\n>P2\r\nGGG\n";
        let input = BatchInput::from_multifasta(text);
        let records = input.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "sp|P1|ONE");
        assert_eq!(records[0].content, ">sp|P1|ONE first protein\nMKV\nLLA\n");
        assert_eq!(records[1].id, "P2");
        assert_eq!(records[1].content, ">P2\nGGG\n");
        assert!(BatchInput::from_multifasta("no headers here").is_empty());
    }

    #[test]
    fn test_parse_id_list() {
        let text = "UNIPROT:WAP_RAT\n# comment\n:bad\n\n  EMBL:AB000001  \nnocolon\n";
        let ids: Vec<_> = BatchInput::from_id_list(text).records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["UNIPROT:WAP_RAT", "EMBL:AB000001"]);
    }

    fn batch_config(dir: &TempDir, max_jobs: usize, use_seq_id: bool) -> BatchConfig {
        let quiet = OutputLevel::new(0);
        BatchConfig {
            max_jobs,
            use_seq_id,
            poll: PollConfig::new(Duration::ZERO).with_output(quiet),
            fetch: FetchConfig {
                output_dir: dir.path().to_path_buf(),
                output: quiet,
                ..FetchConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn test_batch_submits_in_chunks() {
        let dir = TempDir::new().unwrap();
        let dispatcher = ScriptedDispatcher::with_statuses(&["FINISHED"])
            .with_result(ResultType::new("out", "text/plain", "txt"), b"ok".to_vec());
        let records = BatchInput::from_multifasta(">a\nM\n>b\nK\n>c\nV\n");
        let template = SubmitRequest::new("a@b.org", ParameterSet::new().with("program", "blastp"));

        let jobs = run_batch(&dispatcher, &template, &records, &batch_config(&dir, 2, false))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 3);
        // Both jobs of the first chunk go out before either is polled.
        assert_eq!(
            dispatcher.events(),
            vec!["run", "run", "status", "result", "status", "result", "run", "status", "result"]
        );
        let submissions = dispatcher.submissions();
        assert_eq!(submissions[2].params.get("sequence").unwrap().to_string(), ">c\nV\n");
        assert_eq!(submissions[0].params.get("program").unwrap().to_string(), "blastp");
        assert_eq!(jobs[0].files, vec![dir.path().join("job-1.out.txt")]);
    }

    #[tokio::test]
    async fn test_batch_names_files_by_sequence_id() {
        let dir = TempDir::new().unwrap();
        let dispatcher = ScriptedDispatcher::with_statuses(&["FINISHED"])
            .with_result(ResultType::new("out", "text/plain", "txt"), b"ok".to_vec());
        let records = BatchInput::from_multifasta(">query_one\nM\n");
        let template = SubmitRequest::new("a@b.org", ParameterSet::new());

        let jobs = run_batch(&dispatcher, &template, &records, &batch_config(&dir, 5, true))
            .await
            .unwrap();
        assert_eq!(jobs[0].files, vec![dir.path().join("query_one.out.txt")]);
    }

    #[tokio::test]
    async fn test_failed_job_output_is_still_fetched() {
        let dir = TempDir::new().unwrap();
        let dispatcher = ScriptedDispatcher::with_statuses(&["FAILURE"])
            .with_result(ResultType::new("error", "text/plain", "txt"), b"failed".to_vec());
        let records = BatchInput::from_id_list("UNIPROT:WAP_RAT\n");
        let template = SubmitRequest::new("a@b.org", ParameterSet::new());

        let jobs = run_batch(&dispatcher, &template, &records, &batch_config(&dir, 0, false))
            .await
            .unwrap();
        assert_eq!(jobs[0].status, JobStatus::Failure);
        assert_eq!(jobs[0].files, vec![dir.path().join("job-1.error.txt")]);
        assert_eq!(dispatcher.result_calls(), vec!["error"]);
    }
}
