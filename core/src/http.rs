//! HTTP transport types and their diagnostic dumps.
//!
//! # Design
//! Requests and responses are plain owned data. The releases client builds
//! `HttpRequest` values and parses `HttpResponse` values; a `Transport`
//! performs the round-trip in between. Bodies are fully buffered `Vec<u8>`,
//! so observing a value never drains it.
//!
//! `dump_request` / `dump_response` render the wire-style head of a message
//! (start line plus headers) and never include the body.

use std::fmt::Write;

use thiserror::Error;
use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. Header order is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A body-less `GET` for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Lossy UTF-8 view of the body, for error messages.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Failure to render a diagnostic dump.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DumpError {
    #[error("invalid request url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid status code {0}")]
    InvalidStatus(u16),
}

/// Render the head of `request`: request line, `Host`, then its headers.
///
/// A `Host` header already present on the request is written in place of
/// the one derived from the URL.
pub fn dump_request(request: &HttpRequest) -> Result<String, DumpError> {
    let url = Url::parse(&request.url).map_err(|e| DumpError::InvalidUrl {
        url: request.url.clone(),
        reason: e.to_string(),
    })?;
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(DumpError::InvalidUrl {
                url: request.url.clone(),
                reason: "missing host".to_string(),
            })
        }
    };
    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };

    let mut out = String::new();
    let _ = write!(out, "{} {target} HTTP/1.1\r\n", request.method.as_str());
    let host = request.header("host").map(str::to_string).unwrap_or(host);
    let _ = write!(out, "Host: {host}\r\n");
    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        let _ = write!(out, "{name}: {value}\r\n");
    }
    out.push_str("\r\n");
    Ok(out)
}

/// Render the head of `response`: status line then headers.
pub fn dump_response(response: &HttpResponse) -> Result<String, DumpError> {
    let status = http::StatusCode::from_u16(response.status)
        .map_err(|_| DumpError::InvalidStatus(response.status))?;

    let mut out = String::new();
    let _ = match status.canonical_reason() {
        Some(reason) => write!(out, "HTTP/1.1 {} {reason}\r\n", status.as_u16()),
        None => write!(out, "HTTP/1.1 {}\r\n", status.as_u16()),
    };
    for (name, value) in &response.headers {
        let _ = write!(out, "{name}: {value}\r\n");
    }
    out.push_str("\r\n");
    Ok(out)
}
