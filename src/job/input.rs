//! Job input selection.
//!
//! Where the input comes from is always stated explicitly: a literal
//! sequence or identifier, a sequence file (`-` for stdin), or an identifier
//! list file. The filesystem is never probed to guess which one was meant.

use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Sequence text or a `DB:ID` identifier, used verbatim.
    Literal(String),
    /// Sequence file; `-` reads stdin.
    SequenceFile(PathBuf),
    /// One `DB:ID` identifier per line, one job per identifier.
    IdList(PathBuf),
}

impl InputSource {
    /// Pick the single input given on the command line. Giving more than
    /// one is an error; giving none is allowed (e.g. `--params`).
    pub fn resolve(
        positional: Option<String>,
        sequence: Option<String>,
        sequence_file: Option<PathBuf>,
        id_list: Option<PathBuf>,
    ) -> AppResult<Option<Self>> {
        let mut given: Vec<InputSource> = Vec::new();
        if let Some(s) = positional {
            given.push(InputSource::Literal(s));
        }
        if let Some(s) = sequence {
            given.push(InputSource::Literal(s));
        }
        if let Some(p) = sequence_file {
            given.push(InputSource::SequenceFile(p));
        }
        if let Some(p) = id_list {
            given.push(InputSource::IdList(p));
        }

        match given.len() {
            0 => Ok(None),
            1 => Ok(given.pop()),
            _ => Err(AppError::InvalidRequest(
                "give only one of SEQUENCE, --sequence, --sequence-file or --id-list".to_string(),
            )),
        }
    }

    /// Contents of the input. Missing files are an error.
    pub async fn read(&self) -> AppResult<String> {
        match self {
            InputSource::Literal(s) => Ok(s.clone()),
            InputSource::SequenceFile(path) | InputSource::IdList(path) => read_path(path).await,
        }
    }
}

async fn read_path(path: &Path) -> AppResult<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("unable to read {}: {}", path.display(), e),
        ))
    })
}
