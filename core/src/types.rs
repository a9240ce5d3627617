//! Release and asset DTOs.
//!
//! # Design
//! Only the fields the fetcher reads are modeled. Serde ignores everything
//! else GitHub returns, and optional fields default so sparse fixtures parse.

use serde::{Deserialize, Serialize};

/// A published (or draft) release of a repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

/// Page selection for list endpoints. Unset fields are left to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Outcome of the asset download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetDownload {
    /// The endpoint served the bytes directly.
    Content(Vec<u8>),
    /// The bytes live elsewhere; `Location` of the redirect.
    Redirect(String),
}
