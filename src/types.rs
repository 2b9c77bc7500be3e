// Error types shared by every client in the crate

use std::time::Duration;

use crate::models::{JobId, JobStatus};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The service answered with a non-success status (or a SOAP fault).
    /// `message` is the description the server sent back.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parameter \"--{0}\" is missing in your command. It is required!")]
    MissingArgument(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML response: {0}")]
    Xml(String),

    #[error("Malformed JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Job status is {0}. The job must be finished first.")]
    JobNotFinished(JobStatus),

    #[error("Gave up polling job {job_id} after {elapsed:?}")]
    PollTimeout { job_id: JobId, elapsed: Duration },

    #[error("Cancelled")]
    Cancelled,

    #[error("Unknown tool: {0} (pass --baseUrl to use an unlisted service)")]
    UnknownTool(String),
}

impl AppError {
    /// Errors caused by how the command was invoked rather than by the service.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            AppError::MissingArgument(_) | AppError::InvalidRequest(_) | AppError::UnknownTool(_)
        )
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(e: quick_xml::Error) -> Self {
        AppError::Xml(e.to_string())
    }
}

impl From<quick_xml::DeError> for AppError {
    fn from(e: quick_xml::DeError) -> Self {
        AppError::Xml(e.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
