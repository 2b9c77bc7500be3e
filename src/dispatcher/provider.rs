use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::models::{JobId, JobStatus, ParameterDetails, ParameterSet, ResultType};
use crate::tools;
use crate::types::{AppError, AppResult};

/// The operations every job dispatcher service offers, whatever the wire
/// protocol.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Names of the tool's input parameters.
    async fn get_parameters(&self) -> AppResult<Vec<String>>;

    async fn get_parameter_details(&self, parameter_id: &str) -> AppResult<ParameterDetails>;

    /// Submit a job and return its identifier.
    async fn run(
        &self,
        email: &str,
        title: Option<&str>,
        params: &ParameterSet,
    ) -> AppResult<JobId>;

    async fn get_status(&self, job_id: &JobId) -> AppResult<JobStatus>;

    async fn get_result_types(&self, job_id: &JobId) -> AppResult<Vec<ResultType>>;

    /// Raw (already decoded) payload of one result type.
    async fn get_result(&self, job_id: &JobId, result_type: &str) -> AppResult<Bytes>;
}

/// Wire protocol used to reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Rest,
    Soap,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Rest => write!(f, "rest"),
            Transport::Soap => write!(f, "soap"),
        }
    }
}

impl FromStr for Transport {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Transport::Rest),
            "soap" => Ok(Transport::Soap),
            other => Err(AppError::InvalidRequest(format!(
                "unknown transport '{}', expected 'rest' or 'soap'",
                other
            ))),
        }
    }
}

/// Where and how to reach one tool's dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub tool: String,
    pub endpoint: String,
    pub transport: Transport,
    pub http_timeout: Duration,
}

impl DispatcherConfig {
    /// Resolve the endpoint for `tool`. An explicit `base_url` wins and also
    /// allows tools missing from the registry.
    pub fn for_tool(
        tool: &str,
        transport: Transport,
        base_url: Option<&str>,
        http_timeout: Duration,
    ) -> AppResult<Self> {
        let endpoint = match base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let info = tools::lookup(tool).ok_or_else(|| AppError::UnknownTool(tool.to_string()))?;
                match transport {
                    Transport::Rest => info.rest_url(),
                    Transport::Soap => info.soap_url(),
                }
            }
        };
        Ok(Self {
            tool: tool.to_string(),
            endpoint,
            transport,
            http_timeout,
        })
    }
}

/// A dispatcher client for one tool.
pub struct Dispatcher {
    adapter: Box<dyn JobDispatcher>,
    tool: String,
}

impl Dispatcher {
    pub fn new(config: &DispatcherConfig) -> AppResult<Self> {
        debug!(tool = %config.tool, endpoint = %config.endpoint, transport = %config.transport, "Creating dispatcher");
        let adapter: Box<dyn JobDispatcher> = match config.transport {
            Transport::Rest => Box::new(crate::dispatcher::rest::RestAdapter::new(
                &config.tool,
                &config.endpoint,
                config.http_timeout,
            )?),
            Transport::Soap => Box::new(crate::dispatcher::soap::SoapAdapter::new(
                &config.tool,
                &config.endpoint,
                config.http_timeout,
            )?),
        };

        Ok(Self {
            adapter,
            tool: config.tool.clone(),
        })
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }
}

#[async_trait]
impl JobDispatcher for Dispatcher {
    async fn get_parameters(&self) -> AppResult<Vec<String>> {
        self.adapter.get_parameters().await
    }

    async fn get_parameter_details(&self, parameter_id: &str) -> AppResult<ParameterDetails> {
        self.adapter.get_parameter_details(parameter_id).await
    }

    async fn run(
        &self,
        email: &str,
        title: Option<&str>,
        params: &ParameterSet,
    ) -> AppResult<JobId> {
        self.adapter.run(email, title, params).await
    }

    async fn get_status(&self, job_id: &JobId) -> AppResult<JobStatus> {
        self.adapter.get_status(job_id).await
    }

    async fn get_result_types(&self, job_id: &JobId) -> AppResult<Vec<ResultType>> {
        self.adapter.get_result_types(job_id).await
    }

    async fn get_result(&self, job_id: &JobId, result_type: &str) -> AppResult<Bytes> {
        self.adapter.get_result(job_id, result_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_parsing() {
        assert_eq!("rest".parse::<Transport>().unwrap(), Transport::Rest);
        assert_eq!(" SOAP ".parse::<Transport>().unwrap(), Transport::Soap);
        assert!("grpc".parse::<Transport>().is_err());
    }

    #[test]
    fn test_endpoint_resolution() {
        let timeout = Duration::from_secs(30);
        let rest = DispatcherConfig::for_tool("ncbiblast", Transport::Rest, None, timeout).unwrap();
        assert_eq!(rest.endpoint, "https://www.ebi.ac.uk/Tools/services/rest/ncbiblast");

        let soap = DispatcherConfig::for_tool("ncbiblast", Transport::Soap, None, timeout).unwrap();
        assert_eq!(soap.endpoint, "https://www.ebi.ac.uk/Tools/services/soap/ncbiblast");

        let custom = DispatcherConfig::for_tool(
            "my_tool",
            Transport::Rest,
            Some("http://localhost:8080/rest/my_tool/"),
            timeout,
        )
        .unwrap();
        assert_eq!(custom.endpoint, "http://localhost:8080/rest/my_tool");

        assert!(matches!(
            DispatcherConfig::for_tool("no_such_tool", Transport::Rest, None, timeout),
            Err(AppError::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatcher_routes_to_rest_adapter() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/parameters")
            .with_body("<parameters><id>sequence</id></parameters>")
            .create_async()
            .await;

        let config = DispatcherConfig::for_tool(
            "my_tool",
            Transport::Rest,
            Some(&server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(&config).unwrap();
        assert_eq!(dispatcher.tool(), "my_tool");
        assert_eq!(dispatcher.get_parameters().await.unwrap(), vec!["sequence"]);
    }
}
