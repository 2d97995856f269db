//! Access to the GitHub REST API.
//!
//! [`GitHubApi`] is the narrow set of calls the resolver and fetcher need.
//! [`HttpGitHubApi`] implements it with a blocking `reqwest` client that is
//! shared by every worker thread.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::RepoId;
use crate::defaults;
use crate::error::{Error, Result};
use crate::settings::Settings;

const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub default_branch: String,
}

/// The object a ref or annotated tag points to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Debug, Clone, Deserialize)]
struct TagResponse {
    object: GitObject,
}

/// Name, email and date of a commit's author or committer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// `GET /repos/{owner}/{repo}/git/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub committer: Signature,
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
}

/// `GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    #[serde(rename = "tree")]
    pub entries: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// Calls the GitHub backend depends on.
pub trait GitHubApi: Send + Sync {
    fn repository(&self, repo: &RepoId) -> Result<Repository>;

    /// Looks up a ref such as `heads/main` or `tags/v1.0.0`.
    fn git_ref(&self, repo: &RepoId, name: &str) -> Result<GitObject>;

    /// Looks up an annotated tag object.
    fn tag(&self, repo: &RepoId, sha: &str) -> Result<GitObject>;

    fn commit(&self, repo: &RepoId, sha: &str) -> Result<Commit>;

    fn tree(&self, repo: &RepoId, sha: &str) -> Result<Tree>;

    /// Raw content of a blob.
    fn blob(&self, repo: &RepoId, sha: &str) -> Result<Vec<u8>>;
}

/// [`GitHubApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpGitHubApi {
    client: Client,
    base_url: String,
}

impl HttpGitHubApi {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &settings.github_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                Error::ConfigParse {
                    message: "GitHub token contains invalid characters".to_string(),
                    hint: Some("check the value of GITHUB_TOKEN".to_string()),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(defaults::user_agent())
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network {
                url: settings.github_api_url.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: settings.github_api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, repo: &RepoId, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.base_url, repo.owner, repo.name, path)
    }

    fn send(&self, url: &str, accept: Option<&'static str>) -> Result<Response> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request.send().map_err(|e| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(Error::Api {
            url: url.to_string(),
            status: status.as_u16(),
            message: api_message(status, &body),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send(url, None)?.json().map_err(|e| Error::Network {
            url: url.to_string(),
            message: format!("invalid response body: {}", e),
        })
    }
}

impl GitHubApi for HttpGitHubApi {
    fn repository(&self, repo: &RepoId) -> Result<Repository> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);
        self.get_json(&url)
    }

    fn git_ref(&self, repo: &RepoId, name: &str) -> Result<GitObject> {
        let name = name.trim_start_matches("refs/");
        let response: RefResponse = self.get_json(&self.url(repo, &format!("git/ref/{}", name)))?;
        Ok(response.object)
    }

    fn tag(&self, repo: &RepoId, sha: &str) -> Result<GitObject> {
        let response: TagResponse = self.get_json(&self.url(repo, &format!("git/tags/{}", sha)))?;
        Ok(response.object)
    }

    fn commit(&self, repo: &RepoId, sha: &str) -> Result<Commit> {
        self.get_json(&self.url(repo, &format!("git/commits/{}", sha)))
    }

    fn tree(&self, repo: &RepoId, sha: &str) -> Result<Tree> {
        self.get_json(&self.url(repo, &format!("git/trees/{}?recursive=1", sha)))
    }

    fn blob(&self, repo: &RepoId, sha: &str) -> Result<Vec<u8>> {
        let url = self.url(repo, &format!("git/blobs/{}", sha));
        let bytes = self
            .send(&url, Some(RAW_MEDIA_TYPE))?
            .bytes()
            .map_err(|e| Error::Network {
                url: url.clone(),
                message: format!("failed to read blob: {}", e),
            })?;
        Ok(bytes.to_vec())
    }
}

/// Whether an error is a 404 from the API.
pub fn is_not_found(err: &Error) -> bool {
    matches!(err, Error::Api { status: 404, .. })
}

/// Extracts GitHub's `message` field from an error body, falling back to the
/// status line.
fn api_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => format!("{} ({})", status, parsed.message),
        Err(_) => status.to_string(),
    }
}
