//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, manifest snippets and a fake GitHub
//! API built on `httpmock`, to reduce duplication across test files.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let server = MockServer::start();
//!     mount_repo(&server, "audiotool", "manual", &[("a.md", "A")]);
//!     let fixture = TestFixture::new().with_manifest(manifests::DOCS);
//!     fixture.command(&server).assert().success();
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use httpmock::prelude::*;
use serde_json::json;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use httpmock::prelude::*;
    pub use predicates::prelude::*;

    pub use super::manifests;
    pub use super::mount_repo;
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
    pub use super::HEAD_SHA;
}

/// Commit every mounted repository's `main` branch points to.
pub const HEAD_SHA: &str = "b66b28518c9b5519d6da1b5bf601e665b2aacc63";

/// Manifest snippets for testing.
pub mod manifests {
    /// Markdown files of `audiotool/manual` into `docs/`.
    pub const DOCS: &str = r#"
deps:
  - url: https://github.com/audiotool/manual
    from: /
    to: docs/
    include: .*\.md
"#;

    /// Two sources that both provide `a.md`.
    pub const COLLIDING: &str = r#"
deps:
  - url: https://github.com/audiotool/manual
    to: docs/
    include: .*\.md
  - url: https://github.com/audiotool/handbook
    to: docs/
"#;

    /// A single source that does not exist.
    pub const MISSING_REPO: &str = r#"
deps:
  - url: https://github.com/audiotool/does-not-exist
    to: vendor/
"#;

    /// `url` is missing.
    pub const INVALID: &str = r#"
deps:
  - from: docs/
    to: docs/
"#;

    /// Not YAML at all.
    pub const MALFORMED: &str = "deps: [ {url: ";

    /// No dependencies.
    pub const EMPTY: &str = "keep_dirs: true\n";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// Serves `owner/name` from `server` the way the GitHub API would: a default
/// branch `main` at [`HEAD_SHA`], its recursive tree, the blobs and the
/// commit.
pub fn mount_repo(server: &MockServer, owner: &str, name: &str, files: &[(&str, &str)]) {
    let base = format!("/repos/{}/{}", owner, name);

    server.mock(|when, then| {
        when.method(GET).path(base.clone());
        then.status(200)
            .json_body(json!({ "default_branch": "main", "full_name": format!("{owner}/{name}") }));
    });

    server.mock(|when, then| {
        when.method(GET).path(format!("{}/git/ref/heads/main", base));
        then.status(200).json_body(json!({
            "ref": "refs/heads/main",
            "object": { "sha": HEAD_SHA, "type": "commit" }
        }));
    });

    server.mock(|when, then| {
        when.method(GET).path(format!("{}/git/commits/{}", base, HEAD_SHA));
        then.status(200).json_body(json!({
            "sha": HEAD_SHA,
            "message": "Update images",
            "committer": {
                "name": "Jane Doe",
                "email": "jane@example.com",
                "date": "2024-05-01T10:00:00Z"
            }
        }));
    });

    let entries: Vec<_> = files
        .iter()
        .enumerate()
        .map(|(i, (path, _))| {
            json!({ "path": path, "type": "blob", "sha": format!("{}-blob-{}", name, i), "mode": "100644" })
        })
        .collect();
    server.mock(|when, then| {
        when.method(GET).path(format!("{}/git/trees/{}", base, HEAD_SHA));
        then.status(200)
            .json_body(json!({ "sha": HEAD_SHA, "truncated": false, "tree": entries }));
    });

    for (i, (_, content)) in files.iter().enumerate() {
        let path = format!("{}/git/blobs/{}-blob-{}", base, name, i);
        let content = content.to_string();
        server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200).body(content);
        });
    }
}

/// A temporary project directory with an optional `pasta.yaml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `pasta.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child("pasta.yaml")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.path().join("pasta.yaml")
    }

    pub fn result_path(&self) -> PathBuf {
        self.temp_dir.path().join("pasta.result.yaml")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `pasta` command running in this directory against `server`, with no
    /// settings inherited from the environment.
    pub fn command(&self, server: &MockServer) -> assert_cmd::Command {
        let mut cmd = self.bare_command();
        cmd.env("PASTA_GITHUB_API_URL", server.base_url());
        cmd
    }

    /// A `pasta` command running in this directory, without a fake API.
    pub fn bare_command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pasta");
        cmd.current_dir(self.path())
            .env_remove("GITHUB_TOKEN")
            .env_remove("PASTA_CONFIG")
            .env_remove("PASTA_GITHUB_API_URL")
            .env_remove("PASTA_CONCURRENCY")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_manifest() {
        let fixture = TestFixture::new().with_manifest(manifests::EMPTY);
        assert!(fixture.manifest_path().exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        for manifest in [
            manifests::DOCS,
            manifests::COLLIDING,
            manifests::MISSING_REPO,
            manifests::INVALID,
            manifests::EMPTY,
        ] {
            let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(manifest);
            assert!(parsed.is_ok(), "invalid YAML: {}", manifest);
        }
    }
}
