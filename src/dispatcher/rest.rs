// REST adapter for the job dispatcher
// Endpoints: {base}/parameters, /parameterdetails/{id}, /run/, /status/{jobId},
// /resulttypes/{jobId}, /result/{jobId}/{type}

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::dispatcher::provider::JobDispatcher;
use crate::dispatcher::xml;
use crate::models::{JobId, JobStatus, ParameterDetails, ParameterSet, ResultType};
use crate::types::AppResult;
use crate::utils::http::{build_client, check_response};

pub struct RestAdapter {
    client: Client,
    base_url: String,
}

impl RestAdapter {
    pub fn new(tool: &str, base_url: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(tool, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_bytes(&self, path: &str) -> AppResult<Bytes> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = check_response(self.client.get(&url).send().await?).await?;
        Ok(response.bytes().await?)
    }

    async fn get_text(&self, path: &str) -> AppResult<String> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = check_response(self.client.get(&url).send().await?).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobDispatcher for RestAdapter {
    async fn get_parameters(&self) -> AppResult<Vec<String>> {
        let body = self.get_text("parameters").await?;
        xml::parse_parameters(&body)
    }

    async fn get_parameter_details(&self, parameter_id: &str) -> AppResult<ParameterDetails> {
        let body = self
            .get_text(&format!("parameterdetails/{}", parameter_id))
            .await?;
        xml::parse_parameter_details(&body)
    }

    async fn run(
        &self,
        email: &str,
        title: Option<&str>,
        params: &ParameterSet,
    ) -> AppResult<JobId> {
        let url = format!("{}/run/", self.base_url);

        let mut form: Vec<(String, String)> = vec![("email".to_string(), email.to_string())];
        if let Some(title) = title {
            form.push(("title".to_string(), title.to_string()));
        }
        form.extend(params.to_form_pairs());

        debug!(url = %url, fields = form.len(), "POST");
        let response = check_response(self.client.post(&url).form(&form).send().await?).await?;
        let job_id = JobId::new(response.text().await?);
        info!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &JobId) -> AppResult<JobStatus> {
        let body = self.get_text(&format!("status/{}", job_id)).await?;
        Ok(JobStatus::parse(&body))
    }

    async fn get_result_types(&self, job_id: &JobId) -> AppResult<Vec<ResultType>> {
        let body = self.get_text(&format!("resulttypes/{}", job_id)).await?;
        xml::parse_result_types(&body)
    }

    async fn get_result(&self, job_id: &JobId, result_type: &str) -> AppResult<Bytes> {
        self.get_bytes(&format!("result/{}/{}", job_id, result_type))
            .await
    }
}
