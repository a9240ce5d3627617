use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEMO_OWNER: &str = "mterwill";
/// Current name of the demo repository.
pub const DEMO_REPO: &str = "go-github-issue-demo-1";
/// Name the demo repository had before it was renamed.
pub const DEMO_OLD_REPO: &str = "go-github-issue-demo";
pub const DEMO_ASSET_NAME: &str = "foo.txt";
pub const DEMO_ASSET_ID: u64 = 1;
pub const DEMO_ASSET_CONTENT: &[u8] = b"Hello, world!\n";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub browser_download_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub assets: Vec<Asset>,
}

#[derive(Clone, Debug)]
pub struct StoredAsset {
    pub id: u64,
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct StoredRelease {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub assets: Vec<StoredAsset>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// In-memory releases plus the renames a repository has gone through.
#[derive(Debug, Default)]
pub struct Store {
    /// Releases keyed by `(owner, repo)`, newest first.
    releases: HashMap<(String, String), Vec<StoredRelease>>,
    /// Old `(owner, repo)` to the name it now answers to.
    moved: HashMap<(String, String), (String, String)>,
}

pub type Db = Arc<RwLock<Store>>;

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// One repository with one release carrying `foo.txt`. The repository
    /// was renamed, so its old name answers with `301 Moved Permanently`.
    pub fn demo() -> Self {
        let mut store = Self::new();
        store.push_release(
            DEMO_OWNER,
            DEMO_REPO,
            StoredRelease {
                id: 1,
                tag_name: "v0.0.1".to_string(),
                name: Some("v0.0.1".to_string()),
                assets: vec![StoredAsset {
                    id: DEMO_ASSET_ID,
                    name: DEMO_ASSET_NAME.to_string(),
                    content_type: "text/plain".to_string(),
                    content: DEMO_ASSET_CONTENT.to_vec(),
                }],
            },
        );
        store.rename(DEMO_OWNER, DEMO_OLD_REPO, DEMO_REPO);
        store
    }

    /// Add a release after the existing ones.
    pub fn push_release(&mut self, owner: &str, repo: &str, release: StoredRelease) {
        self.releases
            .entry((owner.to_string(), repo.to_string()))
            .or_default()
            .push(release);
    }

    /// Make `owner/from` redirect to `owner/to`.
    pub fn rename(&mut self, owner: &str, from: &str, to: &str) {
        self.moved.insert(
            (owner.to_string(), from.to_string()),
            (owner.to_string(), to.to_string()),
        );
    }

    pub fn shared(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    fn releases(&self, owner: &str, repo: &str) -> Option<&[StoredRelease]> {
        self.releases
            .get(&(owner.to_string(), repo.to_string()))
            .map(Vec::as_slice)
    }

    fn moved_to(&self, owner: &str, repo: &str) -> Option<&(String, String)> {
        self.moved.get(&(owner.to_string(), repo.to_string()))
    }

    fn find_asset(&self, owner: &str, repo: &str, id: u64) -> Option<&StoredAsset> {
        self.releases(owner, repo)?
            .iter()
            .flat_map(|r| r.assets.iter())
            .find(|a| a.id == id)
    }
}

pub fn app() -> Router {
    app_with(Store::demo().shared())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/repos/{owner}/{repo}/releases", get(list_releases))
        .route("/repos/{owner}/{repo}/releases/assets/{id}", get(get_asset))
        .route("/downloads/{owner}/{repo}/{id}/{name}", get(download_asset))
        .with_state(db)
}

/// Answers every request with `301 Moved Permanently` to the same path and
/// query under `target_base`, e.g. `http://127.0.0.1:3000`.
pub fn redirect_app(target_base: impl Into<String>) -> Router {
    let target: Arc<str> = target_base.into().trim_end_matches('/').into();
    Router::new().fallback(redirect_elsewhere).with_state(target)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

fn request_host(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
}

fn moved_permanently(location: String) -> Response {
    tracing::debug!(%location, "repository moved");
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Redirect for a renamed repository. `rest` is the path after
/// `/repos/{owner}/{repo}`; the query string is carried over.
fn moved_repo(
    store: &Store,
    headers: &HeaderMap,
    uri: &Uri,
    owner: &str,
    repo: &str,
    rest: &str,
) -> Option<Response> {
    let (new_owner, new_repo) = store.moved_to(owner, repo)?;
    let query = uri.query().map(|q| format!("?{q}")).unwrap_or_default();
    let host = request_host(headers);
    Some(moved_permanently(format!(
        "http://{host}/repos/{new_owner}/{new_repo}{rest}{query}"
    )))
}

fn download_path(owner: &str, repo: &str, asset: &StoredAsset) -> String {
    format!("/downloads/{owner}/{repo}/{}/{}", asset.id, asset.name)
}

fn to_asset(headers: &HeaderMap, owner: &str, repo: &str, asset: &StoredAsset) -> Asset {
    let host = request_host(headers);
    Asset {
        id: asset.id,
        name: asset.name.clone(),
        content_type: asset.content_type.clone(),
        size: asset.content.len() as u64,
        browser_download_url: format!("http://{host}{}", download_path(owner, repo, asset)),
    }
}

async fn list_releases(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, StatusCode> {
    let store = db.read().await;
    if let Some(moved) = moved_repo(&store, &headers, &uri, &owner, &repo, "/releases") {
        return Ok(moved);
    }
    let releases = store.releases(&owner, &repo).ok_or(StatusCode::NOT_FOUND)?;

    let per_page = params.per_page.unwrap_or(30).clamp(1, 100);
    let page = params.page.unwrap_or(1).max(1);
    let page_items = releases.iter().skip((page - 1) * per_page).take(per_page);

    let body: Vec<Release> = page_items
        .map(|r| Release {
            id: r.id,
            tag_name: r.tag_name.clone(),
            name: r.name.clone(),
            draft: false,
            prerelease: false,
            assets: r
                .assets
                .iter()
                .map(|a| to_asset(&headers, &owner, &repo, a))
                .collect(),
        })
        .collect();
    Ok(Json(body).into_response())
}

/// Metadata as JSON, or a redirect to the bytes when the client asks for
/// `application/octet-stream`.
async fn get_asset(
    State(db): State<Db>,
    Path((owner, repo, id)): Path<(String, String, u64)>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, StatusCode> {
    let store = db.read().await;
    let rest = format!("/releases/assets/{id}");
    if let Some(moved) = moved_repo(&store, &headers, &uri, &owner, &repo, &rest) {
        return Ok(moved);
    }
    let asset = store
        .find_asset(&owner, &repo, id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let wants_bytes = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|accept| accept.contains("application/octet-stream"));
    if wants_bytes {
        let location = download_path(&owner, &repo, asset);
        tracing::debug!(%location, "redirecting asset download");
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }
    Ok(Json(to_asset(&headers, &owner, &repo, asset)).into_response())
}

async fn download_asset(
    State(db): State<Db>,
    Path((owner, repo, id, name)): Path<(String, String, u64, String)>,
) -> Result<Response, StatusCode> {
    let content = {
        let store = db.read().await;
        store
            .find_asset(&owner, &repo, id)
            .filter(|a| a.name == name)
            .ok_or(StatusCode::NOT_FOUND)?
            .content
            .clone()
    };
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(content),
    )
        .into_response())
}

async fn redirect_elsewhere(State(target): State<Arc<str>>, uri: Uri) -> Response {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    moved_permanently(format!("{target}{path_and_query}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_serializes_to_github_shape() {
        let release = Release {
            id: 7,
            tag_name: "v1".to_string(),
            name: None,
            draft: false,
            prerelease: true,
            assets: Vec::new(),
        };
        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["tag_name"], "v1");
        assert_eq!(json["name"], serde_json::Value::Null);
        assert_eq!(json["prerelease"], true);
        assert!(json["assets"].as_array().unwrap().is_empty());
    }

    #[test]
    fn download_path_includes_id_and_name() {
        let asset = StoredAsset {
            id: 3,
            name: "a.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
            content: Vec::new(),
        };
        assert_eq!(download_path("o", "r", &asset), "/downloads/o/r/3/a.bin");
    }

    #[test]
    fn to_asset_uses_request_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:4000".parse().unwrap());
        let stored = StoredAsset {
            id: 1,
            name: "foo.txt".to_string(),
            content_type: "text/plain".to_string(),
            content: DEMO_ASSET_CONTENT.to_vec(),
        };
        let asset = to_asset(&headers, "o", "r", &stored);
        assert_eq!(asset.size, 14);
        assert_eq!(
            asset.browser_download_url,
            "http://127.0.0.1:4000/downloads/o/r/1/foo.txt"
        );
    }

    #[test]
    fn demo_store_holds_foo_txt() {
        let store = Store::demo();
        let asset = store.find_asset(DEMO_OWNER, DEMO_REPO, DEMO_ASSET_ID).unwrap();
        assert_eq!(asset.name, "foo.txt");
        assert_eq!(asset.content, b"Hello, world!\n");
        assert!(store.find_asset(DEMO_OWNER, DEMO_REPO, 99).is_none());
    }

    #[test]
    fn demo_store_old_name_is_moved_not_stored() {
        let store = Store::demo();
        assert!(store.releases(DEMO_OWNER, DEMO_OLD_REPO).is_none());
        assert_eq!(
            store.moved_to(DEMO_OWNER, DEMO_OLD_REPO),
            Some(&(DEMO_OWNER.to_string(), DEMO_REPO.to_string()))
        );
    }

    #[test]
    fn moved_repo_keeps_query_and_uses_host() {
        let store = Store::demo();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:4000".parse().unwrap());
        let uri: Uri = "/repos/mterwill/go-github-issue-demo/releases?page=2"
            .parse()
            .unwrap();

        let resp = moved_repo(&store, &headers, &uri, DEMO_OWNER, DEMO_OLD_REPO, "/releases")
            .unwrap();
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "http://127.0.0.1:4000/repos/mterwill/go-github-issue-demo-1/releases?page=2"
        );
        assert!(moved_repo(&store, &headers, &uri, DEMO_OWNER, DEMO_REPO, "/releases").is_none());
    }

    #[test]
    fn push_release_appends_in_order() {
        let mut store = Store::new();
        for (id, tag) in [(2, "v2"), (1, "v1")] {
            store.push_release(
                "o",
                "r",
                StoredRelease {
                    id,
                    tag_name: tag.to_string(),
                    name: None,
                    assets: Vec::new(),
                },
            );
        }
        let tags: Vec<_> = store
            .releases("o", "r")
            .unwrap()
            .iter()
            .map(|r| r.tag_name.as_str())
            .collect();
        assert_eq!(tags, ["v2", "v1"]);
    }
}
