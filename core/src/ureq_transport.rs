//! Network transport backed by a `ureq` agent.
//!
//! The agent is configured so that it never interprets the exchange:
//! error statuses come back as responses, and redirects are returned
//! rather than followed. Callers that want a redirect followed issue the
//! next request themselves, through the same `Transport`.
//!
//! Response bodies are read whole. ureq caps a read at 10 MiB unless told
//! otherwise, so the cap comes from `ClientConfig::max_body_bytes` instead
//! and is lifted entirely when that is unset.

use ureq::Agent;

use crate::config::ClientConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: config.max_body_bytes.unwrap_or(u64::MAX),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match request.body {
            Some(body) => builder
                .body(body)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))
                .map(|req| self.agent.run(req)),
            None => builder
                .body(())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))
                .map(|req| self.agent.run(req)),
        }?;
        let mut response = result.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(map_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(io) => TransportError::Io(io),
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connection(err.to_string())
        }
        other => TransportError::Client(other),
    }
}
