// Shared HTTP plumbing: User-Agent, client construction, error bodies

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, Response};
use tracing::debug;

use crate::types::{AppError, AppResult};

const CLIENT_NAME: &str = "EBI-Sample-Client";

/// User-Agent sent with every request, e.g.
/// `EBI-Sample-Client/0.1.0 (ncbiblast; Rust; linux) reqwest`.
pub fn user_agent(tool: &str) -> String {
    format!(
        "{}/{} ({}; Rust; {}) reqwest",
        CLIENT_NAME,
        env!("CARGO_PKG_VERSION"),
        tool,
        std::env::consts::OS
    )
}

/// Build the HTTP client used by one service client.
pub fn build_client(tool: &str, timeout: Duration) -> AppResult<Client> {
    let agent = user_agent(tool);
    debug!(user_agent = %agent, "Building HTTP client");
    Client::builder()
        .user_agent(agent)
        .timeout(timeout)
        .build()
        .map_err(AppError::from)
}

/// Pass successful responses through; turn anything else into
/// `AppError::Service` carrying the server's description.
pub async fn check_response(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read response text".to_string());
    Err(AppError::Service {
        status: status.as_u16(),
        message: error_description(&body),
    })
}

/// The service reports errors as `<error><description>…</description></error>`.
/// Falls back to the trimmed body when it is not shaped like that.
pub fn error_description(body: &str) -> String {
    first_element_text(body, b"description")
        .or_else(|| first_element_text(body, b"faultstring"))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Text content of the first element with the given local name.
pub fn first_element_text(xml: &str, local_name: &[u8]) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut inside = false;
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == local_name => inside = true,
            Ok(Event::Empty(e)) if e.local_name().as_ref() == local_name => {
                return Some(String::new());
            }
            Ok(Event::Text(t)) if inside => text.push_str(&t.unescape().ok()?),
            Ok(Event::CData(c)) if inside => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()))
            }
            Ok(Event::End(e)) if inside && e.local_name().as_ref() == local_name => {
                return Some(text);
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
