//! Request builder, response parser and executor for the releases API.
//!
//! # Design
//! `ReleasesClient` holds only a base URL and a user agent. Each operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`, so it can be tested
//! without I/O.
//!
//! `ReleasesService` pairs a client with a `Transport` and runs the
//! round-trips. Every operation follows redirects (a renamed repository
//! answers with 301, an asset download with 302 to the storage host). The
//! service follows them itself, one hop per `execute`, so a decorating
//! transport sees every hop.

use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Asset, AssetDownload, ListOptions, Release};

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_OCTET_STREAM: &str = "application/octet-stream";

/// Stateless client for the releases endpoints.
#[derive(Debug, Clone)]
pub struct ReleasesClient {
    base_url: String,
    user_agent: String,
}

impl ReleasesClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_base_url, &config.user_agent)
    }

    fn repo_url(&self, owner: &str, repo: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["repos", owner, repo])
            .extend(tail);
        Ok(url)
    }

    fn request(&self, url: String, accept: &str) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("Accept", accept)
            .with_header("User-Agent", self.user_agent.as_str())
    }

    pub fn build_list_releases(
        &self,
        owner: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.repo_url(owner, repo, &["releases"])?;
        if opts.page.is_some() || opts.per_page.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(page) = opts.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(per_page) = opts.per_page {
                query.append_pair("per_page", &per_page.to_string());
            }
        }
        Ok(self.request(url.into(), ACCEPT_JSON))
    }

    pub fn build_download_asset(
        &self,
        owner: &str,
        repo: &str,
        asset_id: u64,
    ) -> Result<HttpRequest, ApiError> {
        let id = asset_id.to_string();
        let url = self.repo_url(owner, repo, &["releases", "assets", &id])?;
        Ok(self.request(url.into(), ACCEPT_OCTET_STREAM))
    }

    /// Request for the `location` of a redirect answering `previous`.
    /// Relative locations resolve against the previous URL; headers carry
    /// over and the body is dropped.
    pub fn build_follow_redirect(
        &self,
        location: &str,
        previous: &HttpRequest,
    ) -> Result<HttpRequest, ApiError> {
        let base = Url::parse(&previous.url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", previous.url)))?;
        let next = base
            .join(location)
            .map_err(|e| ApiError::InvalidUrl(format!("{location}: {e}")))?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: next.into(),
            headers: previous.headers.clone(),
            body: None,
        })
    }

    pub fn parse_list_releases(&self, response: HttpResponse) -> Result<Vec<Release>, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_download_asset(&self, response: HttpResponse) -> Result<AssetDownload, ApiError> {
        match response.status {
            status if is_redirect(status) => response
                .header("location")
                .map(|loc| AssetDownload::Redirect(loc.to_string()))
                .ok_or(ApiError::MissingLocation),
            _ => {
                check_status(&response, 200)?;
                Ok(AssetDownload::Content(response.body))
            }
        }
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body_text(),
    })
}

/// First asset called `name`, scanning releases in the order given.
pub fn find_asset<'a>(releases: &'a [Release], name: &str) -> Option<&'a Asset> {
    releases
        .iter()
        .flat_map(|release| release.assets.iter())
        .find(|asset| asset.name == name)
}

/// Runs releases API calls through a `Transport`.
#[derive(Debug, Clone)]
pub struct ReleasesService<T> {
    client: ReleasesClient,
    transport: T,
    max_redirects: usize,
}

impl<T: Transport> ReleasesService<T> {
    pub fn new(client: ReleasesClient, transport: T) -> Self {
        Self {
            client,
            transport,
            max_redirects: ClientConfig::default().max_redirects,
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(ReleasesClient::from_config(config), transport)
            .with_max_redirects(config.max_redirects)
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Execute `req`, following redirects through the transport until a
    /// non-redirect response or one without a `Location` comes back.
    pub fn execute_following(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut req = req;
        let mut hops = 0;
        loop {
            let response = self.transport.execute(req.clone())?;
            if !is_redirect(response.status) {
                return Ok(response);
            }
            let Some(location) = response.header("location") else {
                return Ok(response);
            };
            if hops == self.max_redirects {
                return Err(ApiError::TooManyRedirects(hops));
            }
            hops += 1;
            tracing::debug!(%location, hops, status = response.status, "following redirect");
            req = self.client.build_follow_redirect(location, &req)?;
        }
    }

    pub fn list_releases(
        &self,
        owner: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Release>, ApiError> {
        let req = self.client.build_list_releases(owner, repo, opts)?;
        let response = self.execute_following(req)?;
        self.client.parse_list_releases(response)
    }

    /// Download the bytes of asset `asset_id`, following redirects.
    pub fn download_release_asset(
        &self,
        owner: &str,
        repo: &str,
        asset_id: u64,
    ) -> Result<Vec<u8>, ApiError> {
        let req = self.client.build_download_asset(owner, repo, asset_id)?;
        let response = self.execute_following(req)?;
        match self.client.parse_download_asset(response)? {
            AssetDownload::Content(bytes) => Ok(bytes),
            // not produced: execute_following stops on a redirect only when it lacks a location
            AssetDownload::Redirect(_) => Err(ApiError::TooManyRedirects(self.max_redirects)),
        }
    }

    /// List releases and download the first asset named `name`.
    pub fn fetch_asset_by_name(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<(Asset, Vec<u8>), ApiError> {
        let releases = self.list_releases(owner, repo, &ListOptions::default())?;
        let asset = find_asset(&releases, name).cloned().ok_or(ApiError::NotFound)?;
        let bytes = self.download_release_asset(owner, repo, asset.id)?;
        Ok((asset, bytes))
    }
}
