// SOAP adapter for the job dispatcher
// Document/literal envelopes in the http://soap.jdispatcher.ebi.ac.uk namespace.
// getResult payloads are base64 encoded and are decoded here.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use quick_xml::escape::escape;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::dispatcher::provider::JobDispatcher;
use crate::dispatcher::xml;
use crate::models::{JobId, JobStatus, ParameterDetails, ParameterSet, ResultType};
use crate::types::{AppError, AppResult};
use crate::utils::http::{build_client, check_response, first_element_text};

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const JDISPATCHER_NS: &str = "http://soap.jdispatcher.ebi.ac.uk";

pub struct SoapAdapter {
    client: Client,
    endpoint: String,
}

impl SoapAdapter {
    pub fn new(tool: &str, endpoint: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(tool, timeout)?,
            endpoint: endpoint.to_string(),
        })
    }

    /// Wrap an operation body in a SOAP 1.1 envelope.
    fn envelope(operation: &str, body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <soapenv:Envelope xmlns:soapenv=\"{}\" xmlns:jd=\"{}\">\
             <soapenv:Body><jd:{op}>{}</jd:{op}></soapenv:Body></soapenv:Envelope>",
            SOAP_ENV_NS,
            JDISPATCHER_NS,
            body,
            op = operation
        )
    }

    fn element(name: &str, value: &str) -> String {
        format!("<{0}>{1}</{0}>", name, escape(value))
    }

    fn run_body(email: &str, title: Option<&str>, params: &ParameterSet) -> String {
        let mut body = Self::element("email", email);
        if let Some(title) = title {
            body.push_str(&Self::element("title", title));
        }
        body.push_str("<parameters>");
        for (name, value) in params.iter() {
            body.push_str(&Self::element(name, &value.to_string()));
        }
        body.push_str("</parameters>");
        body
    }

    async fn call(&self, operation: &str, body: &str) -> AppResult<String> {
        let envelope = Self::envelope(operation, body);
        debug!(endpoint = %self.endpoint, operation = %operation, "SOAP call");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(envelope)
            .send()
            .await?;
        let response = check_response(response).await?;
        let text = response.text().await?;

        // Some stacks answer a fault with HTTP 200.
        if let Some(fault) = first_element_text(&text, b"faultstring") {
            return Err(AppError::Service {
                status: 500,
                message: fault,
            });
        }
        Ok(text)
    }

    fn required_text(xml: &str, element: &str) -> AppResult<String> {
        first_element_text(xml, element.as_bytes())
            .ok_or_else(|| AppError::Xml(format!("element <{}> not found", element)))
    }

    /// Result payloads are base64 text, possibly wrapped across lines.
    pub fn decode_output(encoded: &str) -> AppResult<Bytes> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(Bytes::from(BASE64.decode(compact.as_bytes())?))
    }
}

#[async_trait]
impl JobDispatcher for SoapAdapter {
    async fn get_parameters(&self) -> AppResult<Vec<String>> {
        let response = self.call("getParameters", "").await?;
        xml::parse_parameters(&xml::element_fragment(&response, "parameters")?)
    }

    async fn get_parameter_details(&self, parameter_id: &str) -> AppResult<ParameterDetails> {
        let response = self
            .call("getParameterDetails", &Self::element("parameterId", parameter_id))
            .await?;
        xml::parse_parameter_details(&xml::element_fragment(&response, "parameterDetails")?)
    }

    async fn run(
        &self,
        email: &str,
        title: Option<&str>,
        params: &ParameterSet,
    ) -> AppResult<JobId> {
        let response = self
            .call("run", &Self::run_body(email, title, params))
            .await?;
        let job_id = JobId::new(Self::required_text(&response, "jobId")?);
        info!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &JobId) -> AppResult<JobStatus> {
        let response = self
            .call("getStatus", &Self::element("jobId", job_id.as_str()))
            .await?;
        Ok(JobStatus::parse(&Self::required_text(&response, "status")?))
    }

    async fn get_result_types(&self, job_id: &JobId) -> AppResult<Vec<ResultType>> {
        let response = self
            .call("getResultTypes", &Self::element("jobId", job_id.as_str()))
            .await?;
        xml::parse_result_types(&xml::element_fragment(&response, "resultTypes")?)
    }

    async fn get_result(&self, job_id: &JobId, result_type: &str) -> AppResult<Bytes> {
        let body = format!(
            "{}{}",
            Self::element("jobId", job_id.as_str()),
            Self::element("type", result_type)
        );
        let response = self.call("getResult", &body).await?;
        Self::decode_output(&Self::required_text(&response, "output")?)
    }
}
