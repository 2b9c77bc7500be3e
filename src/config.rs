use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::Transport;

pub const DEFAULT_DBFETCH_URL: &str = "https://www.ebi.ac.uk/Tools/dbfetch/dbfetch";
pub const DEFAULT_SEARCH_URL: &str = "https://www.ebi.ac.uk/ebisearch/ws/rest";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Process-wide defaults, read once from the environment (and `.env`).
/// Command-line flags override these per invocation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub email: Option<String>,
    pub transport: Transport,
    pub poll: PollDefaults,
    pub http: HttpConfig,
    pub dbfetch_url: String,
    pub search_url: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PollDefaults {
    /// `None` leaves the interval to the tool registry.
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl PollDefaults {
    /// Interval for `tool`: the configured value, else the tool's own
    /// default, else 3 seconds.
    pub fn interval_for(&self, tool: &str) -> Duration {
        match self.interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => crate::tools::lookup(tool)
                .map(|t| t.poll_interval())
                .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            email: None,
            transport: Transport::Rest,
            poll: PollDefaults {
                interval_secs: None,
                timeout_secs: None,
            },
            http: HttpConfig {
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            dbfetch_url: DEFAULT_DBFETCH_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            email: env::var("EBI_EMAIL").ok().filter(|e| !e.trim().is_empty()),
            transport: env::var("EBI_TRANSPORT")
                .unwrap_or_else(|_| "rest".to_string())
                .parse()?,
            poll: PollDefaults {
                interval_secs: match env::var("EBI_POLL_INTERVAL") {
                    Ok(v) => Some(v.parse()?),
                    Err(_) => None,
                },
                timeout_secs: match env::var("EBI_POLL_TIMEOUT") {
                    Ok(v) => Some(v.parse()?),
                    Err(_) => None,
                },
            },
            http: HttpConfig {
                timeout_secs: env::var("EBI_HTTP_TIMEOUT")
                    .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                    .parse()?,
            },
            dbfetch_url: env::var("EBI_DBFETCH_URL")
                .unwrap_or_else(|_| DEFAULT_DBFETCH_URL.to_string()),
            search_url: env::var("EBI_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_URL.to_string()),
            output_dir: env::var("EBI_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.transport, Transport::Rest);
        assert!(config.poll.interval_secs.is_none());
        assert!(config.poll.timeout().is_none());
        assert_eq!(config.http.timeout(), Duration::from_secs(300));
        assert_eq!(config.dbfetch_url, DEFAULT_DBFETCH_URL);
    }

    #[test]
    fn test_poll_interval_precedence() {
        let mut poll = ClientConfig::default().poll;
        assert_eq!(poll.interval_for("fastm"), Duration::from_secs(10));
        assert_eq!(poll.interval_for("ncbiblast"), Duration::from_secs(3));
        assert_eq!(poll.interval_for("unlisted"), Duration::from_secs(3));

        poll.interval_secs = Some(7);
        assert_eq!(poll.interval_for("fastm"), Duration::from_secs(7));
    }
}
