// Job Submitter

use tracing::{debug, info};

use crate::dispatcher::JobDispatcher;
use crate::models::{JobId, ParameterSet};
use crate::types::{AppError, AppResult};

/// Everything needed for one `run` call.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Required by the service for job accounting.
    pub email: String,
    pub title: Option<String>,
    pub params: ParameterSet,
}

impl SubmitRequest {
    pub fn new(email: impl Into<String>, params: ParameterSet) -> Self {
        Self {
            email: email.into(),
            title: None,
            params,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Submit one job. A blank e-mail is rejected before anything is sent; any
/// service error is returned as is, without retrying.
pub async fn submit(dispatcher: &dyn JobDispatcher, request: &SubmitRequest) -> AppResult<JobId> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::MissingArgument("email"));
    }

    debug!(params = request.params.len(), title = ?request.title, "Submitting job");
    let job_id = dispatcher
        .run(email, request.title.as_deref(), &request.params)
        .await?;
    info!(job_id = %job_id, "Submitted");
    Ok(job_id)
}
