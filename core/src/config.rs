//! Client configuration.
//!
//! All fields have defaults so an empty document (or no environment at all)
//! yields a working configuration pointed at the public GitHub API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_URL: &str = "GHRELEASE_API_URL";
pub const ENV_USER_AGENT: &str = "GHRELEASE_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "GHRELEASE_TIMEOUT_SECS";
pub const ENV_MAX_REDIRECTS: &str = "GHRELEASE_MAX_REDIRECTS";
pub const ENV_MAX_BODY_BYTES: &str = "GHRELEASE_MAX_BODY_BYTES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value:?} is not a valid number")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the REST API, e.g. `https://api.github.com`.
    pub api_base_url: String,

    pub user_agent: String,

    /// Whole-request timeout, connect through last body byte.
    pub timeout_secs: u64,

    /// Redirect hops followed per request.
    pub max_redirects: usize,

    /// Largest response body read into memory. `None` reads any size.
    pub max_body_bytes: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: concat!("ghrelease/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            max_redirects: 10,
            max_body_bytes: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Defaults overlaid with the `GHRELEASE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Overlay values returned by `lookup` onto `self`.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            self.user_agent = agent;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_number(ENV_TIMEOUT_SECS, raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_REDIRECTS) {
            self.max_redirects = parse_number(ENV_MAX_REDIRECTS, raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes = Some(parse_number(ENV_MAX_BODY_BYTES, raw)?);
        }
        Ok(self)
    }
}

fn parse_number<N: std::str::FromStr>(name: &'static str, value: String) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}
