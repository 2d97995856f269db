//! # Remote Backends
//!
//! A backend knows how to fetch files from one kind of remote source. The
//! pipeline never talks to a remote directly: it asks the [`Registry`] for
//! the backend that claims a dependency's URL and hands it a [`CopyConfig`].
//!
//! ## Contract
//!
//! - [`Backend::matches`] must be cheap and side-effect free.
//! - [`Backend::copy`] writes every kept file into `config.staging_dir`, at
//!   its path relative to `config.from`, and returns the provenance of what
//!   it wrote. An error fails only the dependency being copied.
//! - Implementations observe the cancellation token before every remote call.
//!
//! Adding a backend means implementing [`Backend`] and registering it; the
//! staging coordinator does not change.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::filter::PathFilter;
use crate::provenance::SourceInfo;

pub mod registry;

pub use registry::Registry;

/// Everything a backend needs to copy one dependency.
#[derive(Debug, Clone)]
pub struct CopyConfig {
    /// URL of the dependency
    pub url: String,
    /// Directory inside the source to copy from. Empty means the root,
    /// otherwise it ends with `/`.
    pub from: String,
    /// Selects files by their path relative to `from`
    pub filter: PathFilter,
    /// Backend specific options from the manifest (e.g. `ref`)
    pub options: BTreeMap<String, String>,
    /// Private directory that receives the fetched files
    pub staging_dir: PathBuf,
    /// Whether the target directory may be wiped before copying
    pub clear_target: bool,
}

impl CopyConfig {
    /// A config that keeps every file below `from`.
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            from: from.into(),
            filter: PathFilter::all(),
            options: BTreeMap::new(),
            staging_dir: PathBuf::new(),
            clear_target: true,
        }
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_clear_target(mut self, clear_target: bool) -> Self {
        self.clear_target = clear_target;
        self
    }

    /// Returns an option value, or `""` when unset.
    pub fn option(&self, key: &str) -> &str {
        self.options.get(key).map(String::as_str).unwrap_or_default()
    }
}

/// A source of files, such as a GitHub repository.
pub trait Backend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether this backend handles `url`.
    fn matches(&self, url: &str) -> bool;

    /// Fetches the selected files into `config.staging_dir`.
    fn copy(&self, cancel: &CancellationToken, config: &CopyConfig) -> Result<SourceInfo>;
}
