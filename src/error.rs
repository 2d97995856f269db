//! # Error Handling
//!
//! This module defines the centralized error type for `pasta`. It uses the
//! `thiserror` library to describe every failure the pipeline can hit, with
//! enough context (dependency index, URL, reference) to act on the message.
//!
//! ## Failure Classes
//!
//! Errors fall into classes that decide how far they reach:
//!
//! - **Configuration** (`ConfigParse`, `InvalidDependency`, `InvalidPattern`,
//!   `Yaml`): fatal before any network call is made.
//! - **Resolution** (`RefLookupFailed`, `RefUnresolvable`, `RepoInaccessible`,
//!   `MalformedUrl`, `NoBackend`, `AmbiguousBackend`, `Api`, `Network`): fatal
//!   to a single dependency only. The dependency is recorded as skipped.
//! - **Collision** (`TargetPathCollision`): fatal to the whole run, raised
//!   before anything on disk is touched.
//! - **Cleanup** (`Cleanup`): staging directories could not be released.
//!
//! Each class maps to a distinct process exit status through
//! [`Error::exit_code`].

use thiserror::Error;

use crate::exit_codes;

/// Main error type for pasta operations
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// No manifest was found while walking up from the start directory.
    #[error("can't find '{name}' in {start} or any parent directory")]
    ManifestNotFound { name: String, start: String },

    /// A single dependency entry failed validation.
    #[error("dependency {index}: {message}")]
    InvalidDependency { index: usize, message: String },

    /// An include or exclude pattern is not a valid regular expression.
    #[error("failed to compile {kind} pattern '{pattern}': {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The URL is claimed by a backend but does not have the expected shape.
    #[error("url '{url}' is malformed, {expected}")]
    MalformedUrl { url: String, expected: String },

    /// No backend understands the URL.
    #[error("no backend found for url '{url}'")]
    NoBackend { url: String },

    /// More than one backend claims the URL.
    #[error("url '{url}' is claimed by more than one backend: {backends}")]
    AmbiguousBackend { url: String, backends: String },

    /// The remote repository does not exist or is not readable with the
    /// current credentials.
    #[error("can't access repo {url}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    RepoInaccessible {
        url: String,
        message: String,
        hint: Option<String>,
    },

    /// An explicit `heads/` or `tags/` reference does not exist.
    #[error("failed getting ref '{reference}': {message}")]
    RefLookupFailed { reference: String, message: String },

    /// A bare reference matched no branch, tag, commit or raw ref.
    #[error("unable to resolve ref '{reference}'; must be branch, tag, or sha")]
    RefUnresolvable { reference: String },

    /// The remote API answered with a non-success status.
    #[error("remote API returned {status} for {url}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// A request could not be sent or its response could not be read.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// Two dependencies would write the same file.
    #[error("two dependencies would copy to same file '{path}'")]
    TargetPathCollision { path: String },

    /// A filesystem operation on a target or staging directory failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// Staging directories could not be removed.
    #[error("Cleanup error: {message}")]
    Cleanup { message: String },

    /// The run was cancelled before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// Every dependency failed to fetch.
    #[error("all {count} dependencies failed, see the log or result file for details")]
    AllSourcesFailed { count: usize },

    /// A failure outside any single dependency ended the run before anything
    /// was copied. Every failed dependency is listed as `<url>: <error>`.
    #[error("run aborted, {} dependencies failed:{}", failures.len(), failures.iter().map(|f| format!("\n  - {}", f)).collect::<String>())]
    RunAborted { failures: Vec<String> },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns the process exit status for this error's failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ManifestNotFound { .. } => exit_codes::MANIFEST_NOT_FOUND,
            Error::ConfigParse { .. }
            | Error::InvalidDependency { .. }
            | Error::InvalidPattern { .. }
            | Error::Yaml(_) => exit_codes::CONFIG,
            Error::TargetPathCollision { .. } => exit_codes::COLLISION,
            Error::AllSourcesFailed { .. } => exit_codes::ALL_SOURCES_FAILED,
            Error::Cleanup { .. } => exit_codes::CLEANUP,
            Error::Cancelled => exit_codes::CANCELLED,
            _ => exit_codes::FAILURE,
        }
    }

    /// Whether the error only concerns one dependency and leaves the rest of
    /// the run intact.
    pub fn is_source_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedUrl { .. }
                | Error::NoBackend { .. }
                | Error::AmbiguousBackend { .. }
                | Error::RepoInaccessible { .. }
                | Error::RefLookupFailed { .. }
                | Error::RefUnresolvable { .. }
                | Error::Api { .. }
                | Error::Network { .. }
                | Error::Cancelled
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_run_aborted_lists_every_failure() {
        let error = Error::RunAborted {
            failures: vec![
                "mem://one: Filesystem operation error: disk full".to_string(),
                "mem://two: Filesystem operation error: disk full".to_string(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "run aborted, 2 dependencies failed:\n  - mem://one: Filesystem operation error: disk full\n  - mem://two: Filesystem operation error: disk full"
        );
        assert_eq!(error.exit_code(), exit_codes::FAILURE);
        assert!(!error.is_source_local());
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "couldn't parse file".to_string(),
            hint: Some("check the indentation of 'deps'".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("indentation"));
    }

    #[test]
    fn test_error_display_invalid_dependency() {
        let error = Error::InvalidDependency {
            index: 2,
            message: "'to' must end with '/'".to_string(),
        };
        assert_eq!(error.to_string(), "dependency 2: 'to' must end with '/'");
    }

    #[test]
    fn test_error_display_invalid_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let error = Error::InvalidPattern {
            kind: "include",
            pattern: "(".to_string(),
            source,
        };
        let display = error.to_string();
        assert!(display.contains("include pattern '('"));
    }

    #[test]
    fn test_error_display_ref_errors() {
        let lookup = Error::RefLookupFailed {
            reference: "heads/nope".to_string(),
            message: "404 Not Found".to_string(),
        };
        assert!(lookup.to_string().contains("heads/nope"));

        let unresolvable = Error::RefUnresolvable {
            reference: "marshmallow".to_string(),
        };
        assert!(unresolvable
            .to_string()
            .contains("must be branch, tag, or sha"));
    }

    #[test]
    fn test_error_display_repo_inaccessible_with_hint() {
        let error = Error::RepoInaccessible {
            url: "https://github.com/foo/bar".to_string(),
            message: "404 Not Found".to_string(),
            hint: Some("set GITHUB_TOKEN".to_string()),
        };
        let display = error.to_string();
        assert!(display.contains("can't access repo https://github.com/foo/bar"));
        assert!(display.contains("hint: set GITHUB_TOKEN"));
    }

    #[test]
    fn test_error_display_collision() {
        let error = Error::TargetPathCollision {
            path: "x/y.txt".to_string(),
        };
        assert!(error.to_string().contains("'x/y.txt'"));
    }

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let config = Error::InvalidDependency {
            index: 0,
            message: "'url' is required".to_string(),
        };
        let not_found = Error::ManifestNotFound {
            name: "pasta.yaml".to_string(),
            start: "/tmp".to_string(),
        };
        let collision = Error::TargetPathCollision {
            path: "a".to_string(),
        };
        let all_failed = Error::AllSourcesFailed { count: 2 };
        let cleanup = Error::Cleanup {
            message: "busy".to_string(),
        };

        let codes = [
            config.exit_code(),
            not_found.exit_code(),
            collision.exit_code(),
            all_failed.exit_code(),
            cleanup.exit_code(),
            Error::Cancelled.exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, exit_codes::SUCCESS);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_source_local_classification() {
        assert!(Error::RefUnresolvable {
            reference: "x".to_string()
        }
        .is_source_local());
        assert!(Error::NoBackend {
            url: "https://gitlab.com/a/b".to_string()
        }
        .is_source_local());
        assert!(!Error::TargetPathCollision {
            path: "a".to_string()
        }
        .is_source_local());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(error.to_string().contains("I/O error"));
        assert_eq!(error.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML parsing error"));
        assert_eq!(error.exit_code(), exit_codes::CONFIG);
    }
}
