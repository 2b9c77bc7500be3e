//! Result Fetcher
//!
//! Lists a finished job's result types and writes each selected one to
//! `{base}.{identifier}.{fileSuffix}`, where `base` is the user's outfile or
//! the job id. Image and gzip payloads are written untouched; everything else
//! is written as UTF-8 text.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::dispatcher::JobDispatcher;
use crate::job::OutputLevel;
use crate::models::{JobId, ResultType, WriteMode};
use crate::types::AppResult;

/// The `--outformat` selection: identifiers to keep, empty meaning all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFilter {
    identifiers: Vec<String>,
}

impl OutputFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Comma separated identifiers; spaces, empty items and `None` are dropped.
    pub fn parse(raw: &str) -> Self {
        let identifiers = raw
            .split(',')
            .map(|item| item.replace(' ', ""))
            .filter(|item| !item.is_empty() && item != "None")
            .collect();
        Self { identifiers }
    }

    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn accepts(&self, identifier: &str) -> bool {
        self.identifiers.is_empty() || self.identifiers.iter().any(|i| i == identifier)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub outfile: Option<String>,
    pub outformats: OutputFilter,
    pub output_dir: PathBuf,
    pub output: OutputLevel,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            outfile: None,
            outformats: OutputFilter::all(),
            output_dir: PathBuf::from("."),
            output: OutputLevel::default(),
        }
    }
}

/// `{base}.{identifier}.{fileSuffix}` with `base` = outfile, else the job id.
pub fn result_filename(job_id: &JobId, outfile: Option<&str>, result_type: &ResultType) -> String {
    let base = outfile.unwrap_or_else(|| job_id.as_str());
    format!("{}.{}.{}", base, result_type.identifier, result_type.file_suffix)
}

/// Write one payload in the mode its media type calls for. Returns the mode
/// actually used.
pub async fn write_result(path: &Path, payload: &[u8], mode: WriteMode) -> AppResult<WriteMode> {
    match mode {
        WriteMode::Binary => {
            fs::write(path, payload).await?;
            Ok(WriteMode::Binary)
        }
        WriteMode::Text => match std::str::from_utf8(payload) {
            Ok(text) => {
                fs::write(path, text).await?;
                Ok(WriteMode::Text)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Result is not valid UTF-8, writing raw bytes");
                fs::write(path, payload).await?;
                Ok(WriteMode::Binary)
            }
        },
    }
}

/// Fetch every selected result of a finished job. Returns the written paths
/// in the order the service listed the result types.
pub async fn fetch_results(
    dispatcher: &dyn JobDispatcher,
    job_id: &JobId,
    config: &FetchConfig,
) -> AppResult<Vec<PathBuf>> {
    let result_types = dispatcher.get_result_types(job_id).await?;
    debug!(job_id = %job_id, count = result_types.len(), "Result types available");

    let mut written = Vec::new();
    for result_type in result_types
        .iter()
        .filter(|rt| config.outformats.accepts(&rt.identifier))
    {
        if config.output.at(2) {
            eprintln!("Getting {}", result_type.identifier);
        }
        let payload = dispatcher
            .get_result(job_id, &result_type.identifier)
            .await?;

        let filename = result_filename(job_id, config.outfile.as_deref(), result_type);
        let path = config.output_dir.join(filename);
        let mode = write_result(&path, &payload, result_type.write_mode()).await?;
        info!(path = %path.display(), mode = ?mode, bytes = payload.len(), "Wrote result file");

        if config.output.at(1) {
            println!("Creating result file: {}", path.display());
        } else {
            println!("{}", path.display());
        }
        written.push(path);
    }

    if written.is_empty() {
        warn!(job_id = %job_id, "No result types matched the requested output formats");
    }
    Ok(written)
}
