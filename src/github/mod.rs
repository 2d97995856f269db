//! # GitHub Backend
//!
//! Fetches files from a GitHub repository through the REST API, without
//! cloning. One copy runs in four steps:
//!
//! 1.  **Access check**: the repository must be readable with the configured
//!     credentials (`GITHUB_TOKEN`), otherwise the dependency is skipped with
//!     a hint.
//! 2.  **Ref resolution** ([`resolve`]): the `ref` option becomes a commit SHA.
//! 3.  **Fetch** ([`fetch`]): the tree at that commit is listed, filtered, and
//!     the kept blobs are downloaded into the staging directory on a shared,
//!     bounded worker pool.
//! 4.  **Provenance**: the commit's metadata becomes the [`SourceInfo`].

use std::sync::Arc;

use log::info;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::backend::{Backend, CopyConfig};
use crate::error::{Error, Result};
use crate::provenance::SourceInfo;
use crate::settings::Settings;

pub mod api;
pub mod fetch;
pub mod resolve;

pub use api::{GitHubApi, HttpGitHubApi};

const EXPECTED_URL_SHAPE: &str = "must be of shape github.com/<owner>/<repo>/";

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parses `github.com/<owner>/<repo>` with an optional scheme, `www.`
    /// prefix, trailing slash or `.git` suffix.
    pub fn parse(url: &str) -> Result<Self> {
        let malformed = || Error::MalformedUrl {
            url: url.to_string(),
            expected: EXPECTED_URL_SHAPE.to_string(),
        };

        let parsed = parse_lenient(url).ok_or_else(malformed)?;
        if !is_github_host(parsed.host_str()) {
            return Err(malformed());
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();
        let [owner, name] = segments.as_slice() else {
            return Err(malformed());
        };
        let name = name.strip_suffix(".git").unwrap_or(name);

        if !is_valid_component(owner) || !is_valid_component(name) {
            return Err(malformed());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn parse_lenient(url: &str) -> Option<Url> {
    let url = url.trim();
    if url.contains("://") {
        Url::parse(url).ok()
    } else {
        Url::parse(&format!("https://{}", url)).ok()
    }
}

fn is_github_host(host: Option<&str>) -> bool {
    matches!(host, Some("github.com") | Some("www.github.com"))
}

fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// The built-in backend for `github.com` URLs.
pub struct GitHubBackend {
    api: Arc<dyn GitHubApi>,
    downloads: Arc<ThreadPool>,
}

impl GitHubBackend {
    /// A backend talking to the API configured in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let api = HttpGitHubApi::new(settings)?;
        Self::with_api(Arc::new(api), settings.download_concurrency)
    }

    /// A backend over any [`GitHubApi`], downloading at most `concurrency`
    /// blobs at once.
    pub fn with_api(api: Arc<dyn GitHubApi>, concurrency: usize) -> Result<Self> {
        let downloads = ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .thread_name(|i| format!("pasta-download-{}", i))
            .build()
            .map_err(|e| Error::Filesystem {
                message: format!("failed to start download workers: {}", e),
            })?;

        Ok(Self {
            api,
            downloads: Arc::new(downloads),
        })
    }

    fn check_access(&self, repo: &RepoId, url: &str) -> Result<()> {
        match self.api.repository(repo) {
            Ok(_) => Ok(()),
            Err(err) if api::is_not_found(&err) => Err(Error::RepoInaccessible {
                url: url.to_string(),
                message: err.to_string(),
                hint: Some(
                    "do you have correct access rights & is GITHUB_TOKEN set up?".to_string(),
                ),
            }),
            Err(err) => Err(err),
        }
    }
}

impl Backend for GitHubBackend {
    fn name(&self) -> &str {
        "github"
    }

    fn matches(&self, url: &str) -> bool {
        parse_lenient(url).is_some_and(|u| is_github_host(u.host_str()))
    }

    fn copy(&self, cancel: &CancellationToken, config: &CopyConfig) -> Result<SourceInfo> {
        let repo = RepoId::parse(&config.url)?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.check_access(&repo, &config.url)?;

        let sha = resolve::resolve(self.api.as_ref(), cancel, &repo, config.option("ref"))?;
        info!("{}: resolved '{}' to {}", repo, config.option("ref"), sha);

        fetch::fetch(self.api.as_ref(), &self.downloads, cancel, &repo, &sha, config)
    }
}
