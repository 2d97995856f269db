//! Default values for pasta.
//!
//! This module provides centralized default values used across the library
//! and the CLI, ensuring consistency and avoiding duplication.

/// File name of the manifest, looked up in the working directory and its parents.
pub const MANIFEST_FILE_NAME: &str = "pasta.yaml";

/// File name of the result record, written next to the manifest.
pub const RESULT_FILE_NAME: &str = "pasta.result.yaml";

/// Prefix of the per-dependency staging directories.
pub const STAGING_PREFIX: &str = "pasta";

/// Base URL of the public GitHub REST API.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Upper bound on blob downloads in flight at once, across all dependencies.
pub const DOWNLOAD_CONCURRENCY: usize = 20;

/// Per-request timeout, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Value of the `User-Agent` header sent to remote APIs.
pub fn user_agent() -> String {
    format!("pasta/{}", env!("CARGO_PKG_VERSION"))
}
