//! Runtime settings that are not part of the manifest.
//!
//! The CLI fills these from flags, with environment fallbacks handled by
//! `clap`. Library users start from [`Settings::default`] and override what
//! they need.

use std::fmt;
use std::time::Duration;

use crate::defaults;

/// Settings shared by every backend for one run.
#[derive(Clone)]
pub struct Settings {
    /// Bearer token for the GitHub API. Unauthenticated when `None`.
    pub github_token: Option<String>,
    /// Base URL of the GitHub REST API, without a trailing slash.
    pub github_api_url: String,
    /// Maximum number of blob downloads in flight.
    pub download_concurrency: usize,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Settings {
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: defaults::GITHUB_API_URL.to_string(),
            download_concurrency: defaults::DOWNLOAD_CONCURRENCY,
            request_timeout: Duration::from_secs(defaults::HTTP_TIMEOUT_SECS),
        }
    }
}

// The token must never end up in logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_url", &self.github_api_url)
            .field("download_concurrency", &self.download_concurrency)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
