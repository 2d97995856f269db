//! # Manifest
//!
//! Parsing and validation of `pasta.yaml`.
//!
//! ```yaml
//! keep_dirs: false
//! deps:
//!   - url: https://github.com/audiotool/manual
//!     from: images/
//!     to: assets/manual/
//!     include: pulverisateur.*\.png
//!     options:
//!       ref: tags/v1.0.0
//!   - url: https://github.com/audiotool/pasta
//!     from: /
//!     to: .
//!     files: [LICENSE]
//! ```
//!
//! ## Rules
//!
//! - `url` is required.
//! - `from` is empty or `/` for the repository root, otherwise a clean
//!   relative path ending in `/`.
//! - `to` is a clean relative path ending in `/`, or `.` when `files` is used.
//! - `files` and `include`/`exclude` are mutually exclusive.
//! - `include` and `exclude` are regular expressions matched against the
//!   whole path relative to `from`.
//!
//! Validation happens before any network call, so a broken manifest never
//! leaves a half-finished run behind.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::CopyConfig;
use crate::defaults::MANIFEST_FILE_NAME;
use crate::error::{Error, Result};
use crate::filter::PathFilter;
use crate::staging::Dependency;

/// Top level of `pasta.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Keep existing files in target directories instead of replacing them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keep_dirs: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deps: Vec<DependencySpec>,
}

/// One entry of `deps`, as written in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude: String,
    /// Backend options such as `ref`.
    #[serde(default, deserialize_with = "scalar_map")]
    pub options: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<String>,
}

impl DependencySpec {
    /// Compiles the selection policy of this entry.
    pub fn filter(&self) -> Result<PathFilter> {
        PathFilter::new(&self.include, &self.exclude, &self.files)
    }

    fn validate(&mut self, index: usize) -> Result<()> {
        let invalid = |message: &str| Error::InvalidDependency {
            index,
            message: message.to_string(),
        };

        if self.url.trim().is_empty() {
            return Err(invalid("'url' is required"));
        }

        if self.from == "/" {
            self.from.clear();
        }
        if !self.from.is_empty() {
            if self.from == "." || self.from == "./" {
                return Err(invalid("'from' cannot be '.'"));
            }
            if self.from.starts_with('/') {
                return Err(invalid("'from' must not start with '/'"));
            }
            if !self.from.ends_with('/') {
                return Err(invalid("'from' must end with '/'"));
            }
            if !is_clean(&self.from) {
                return Err(invalid("'from' must contain a clean path"));
            }
            if self.from.split('/').any(|segment| segment == "..") {
                return Err(invalid("'from' must not contain '..'"));
            }
        }

        if self.to == "." {
            if self.files.is_empty() {
                return Err(invalid("'to' is set to '.' so 'files' must be used"));
            }
        } else {
            if self.to.is_empty() {
                return Err(invalid("'to' is required"));
            }
            if self.to.starts_with('/') {
                return Err(invalid("'to' must not start with '/' or must be '.'"));
            }
            if !self.to.ends_with('/') {
                return Err(invalid("'to' must end with '/'"));
            }
            if !is_clean(&self.to) {
                return Err(invalid("'to' must contain a clean path"));
            }
            if is_parent_only(&self.to) {
                return Err(invalid("'to' must not be a parent of the manifest directory"));
            }
            if self.to.starts_with("../") && self.files.is_empty() {
                warn!(
                    "dependency {}: 'to' ({}) is outside the manifest directory and is removed before copying unless keep_dirs is set",
                    index, self.to
                );
            }
        }

        if !self.files.is_empty() && (!self.include.is_empty() || !self.exclude.is_empty()) {
            return Err(invalid("files and include/exclude are mutually exclusive"));
        }

        self.filter().map_err(|e| Error::InvalidDependency {
            index,
            message: e.to_string(),
        })?;

        Ok(())
    }
}

impl Manifest {
    /// Parses and validates a manifest.
    pub fn parse(content: &str) -> Result<Self> {
        let mut manifest = if is_blank(content) {
            Manifest::default()
        } else {
            serde_yaml::from_str::<Manifest>(content).map_err(|e| Error::ConfigParse {
                message: format!("couldn't parse manifest: {}", e),
                hint: Some(
                    "expected 'keep_dirs' and a 'deps' list of entries with 'url', 'from' and 'to'"
                        .to_string(),
                ),
            })?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates every dependency and normalizes `from: /` to the root.
    pub fn validate(&mut self) -> Result<()> {
        for (index, dep) in self.deps.iter_mut().enumerate() {
            dep.validate(index)?;
        }
        Ok(())
    }

    /// Turns the validated entries into dependencies ready to be fetched.
    ///
    /// Targets are resolved against the directory containing the manifest.
    /// Each dependency gets its own staging directory.
    pub fn prepare(&self, manifest_path: &Path) -> Result<Vec<Dependency>> {
        let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));

        self.deps
            .iter()
            .map(|spec| {
                let config = CopyConfig::new(spec.url.trim(), spec.from.clone())
                    .with_filter(spec.filter()?)
                    .with_options(spec.options.clone())
                    .with_clear_target(spec.files.is_empty());
                let target = if spec.to == "." {
                    base.to_path_buf()
                } else {
                    base.join(&spec.to)
                };
                Dependency::new(config, target)
            })
            .collect()
    }
}

/// Reads, parses and validates the manifest at `path`.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    debug!("reading manifest {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("couldn't read file {}: {}", path.display(), e),
        hint: None,
    })?;
    Manifest::parse(&content)
}

/// Looks for `pasta.yaml` in `start` and each of its parents.
pub fn discover(start: &Path) -> Result<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(MANIFEST_FILE_NAME);
        match fs::metadata(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Err(Error::ManifestNotFound {
        name: MANIFEST_FILE_NAME.to_string(),
        start: start.display().to_string(),
    })
}

/// Whether `path` (ending in `/`) is already in its shortest form: no empty
/// or `.` segments, and `..` only at the start.
fn is_clean(path: &str) -> bool {
    let Some(inner) = path.strip_suffix('/') else {
        return false;
    };
    let mut leading_parents = true;
    for segment in inner.split('/') {
        match segment {
            "" | "." => return false,
            ".." if leading_parents => {}
            ".." => return false,
            _ => leading_parents = false,
        }
    }
    true
}

/// Whether a clean `path` is made only of `..` segments, such as `../../`.
fn is_parent_only(path: &str) -> bool {
    path.trim_end_matches('/').split('/').all(|segment| segment == "..")
}

/// True for input made only of whitespace and comments.
fn is_blank(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `ref: 1.0` as well as `ref: "1.0"`.
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_yaml::Value;

    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::String(s) => s,
                _ => {
                    return Err(D::Error::custom(format!(
                        "option '{}' must be a string",
                        key
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(url: &str, from: &str, to: &str) -> DependencySpec {
        DependencySpec {
            url: url.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            ..Default::default()
        }
    }

    fn validate_one(dep: DependencySpec) -> Result<Manifest> {
        let mut manifest = Manifest {
            keep_dirs: false,
            deps: vec![dep],
        };
        manifest.validate().map(|_| manifest)
    }

    fn message(result: Result<Manifest>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
keep_dirs: true
deps:
  - url: https://github.com/audiotool/manual
    from: images/
    to: assets/manual/
    include: pulverisateur.*\.png
    exclude:
    options:
      ref: tags/v1.0.0
  - url: https://github.com/audiotool/pasta
    from: /
    to: .
    files: [LICENSE, README.md]
"#;
        let manifest = Manifest::parse(yaml).unwrap();

        assert!(manifest.keep_dirs);
        assert_eq!(manifest.deps.len(), 2);
        assert_eq!(manifest.deps[0].include, r"pulverisateur.*\.png");
        assert_eq!(manifest.deps[0].exclude, "");
        assert_eq!(manifest.deps[0].options["ref"], "tags/v1.0.0");
        assert_eq!(manifest.deps[1].from, "");
        assert_eq!(manifest.deps[1].files, vec!["LICENSE", "README.md"]);
    }

    #[test]
    fn test_parse_numeric_ref() {
        let yaml = "deps:\n  - url: github.com/foo/bar\n    to: out/\n    options:\n      ref: 1.5\n";
        let manifest = Manifest::parse(yaml).unwrap();
        assert_eq!(manifest.deps[0].options["ref"], "1.5");
    }

    #[test]
    fn test_parse_blank_and_commented() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
        assert_eq!(Manifest::parse("# nothing\n\n").unwrap(), Manifest::default());
        let manifest = Manifest::parse("keep_dirs: true\n#deps:\n").unwrap();
        assert!(manifest.keep_dirs);
        assert!(manifest.deps.is_empty());
    }

    #[test]
    fn test_parse_malformed_yaml() {
        let err = Manifest::parse("deps: [ {url: ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_validate_accepts() {
        let ok = [
            spec("https://example.com", "path/to/source/", "path/to/destination/"),
            spec("https://example.com", "", "out/"),
            spec("https://example.com", "/", "out/"),
            spec("https://example.com", "src/", "../shared/"),
        ];
        for dep in ok {
            assert!(validate_one(dep.clone()).is_ok(), "{:?}", dep);
        }

        let mut dot = spec("https://example.com", "path/to/source/", ".");
        dot.files = vec!["file1.txt".to_string(), "file2.txt".to_string()];
        assert!(validate_one(dot).is_ok());
    }

    #[test]
    fn test_validate_from_slash_means_root() {
        let manifest = validate_one(spec("https://example.com", "/", "out/")).unwrap();
        assert_eq!(manifest.deps[0].from, "");
    }

    #[test]
    fn test_validate_rejects() {
        let cases = [
            (spec("", "src/", "out/"), "dependency 0: 'url' is required"),
            (spec("u", "/src/", "out/"), "'from' must not start with '/'"),
            (spec("u", "src", "out/"), "'from' must end with '/'"),
            (spec("u", ".", "out/"), "'from' cannot be '.'"),
            (spec("u", "a//b/", "out/"), "'from' must contain a clean path"),
            (spec("u", "a/./b/", "out/"), "'from' must contain a clean path"),
            (spec("u", "src/", ""), "'to' is required"),
            (spec("u", "src/", "out"), "'to' must end with '/'"),
            (spec("u", "src/", "/out/"), "'to' must not start with '/'"),
            (spec("u", "src/", "/."), "'to' must not start with '/'"),
            (spec("u", "src/", "."), "'to' is set to '.' so 'files' must be used"),
            (spec("u", "src/", "a/../b/"), "'to' must contain a clean path"),
            (spec("u", "src/", "../"), "'to' must not be a parent of the manifest directory"),
            (spec("u", "src/", "../../"), "'to' must not be a parent of the manifest directory"),
            (spec("u", "../src/", "out/"), "'from' must not contain '..'"),
        ];
        for (dep, expected) in cases {
            let text = message(validate_one(dep.clone()));
            assert!(text.contains(expected), "{:?}: got '{}'", dep, text);
        }
    }

    #[test]
    fn test_validate_files_exclusive_with_patterns() {
        let mut dep = spec("u", "src/", "out/");
        dep.include = ".*\\.go".to_string();
        dep.exclude = ".*\\.txt".to_string();
        dep.files = vec!["file1.txt".to_string()];

        let text = message(validate_one(dep));

        assert!(text.contains("files and include/exclude are mutually exclusive"));
    }

    #[test]
    fn test_validate_bad_pattern_names_dependency() {
        let mut manifest = Manifest {
            keep_dirs: false,
            deps: vec![spec("u", "", "a/"), spec("u", "", "b/")],
        };
        manifest.deps[1].include = "(".to_string();

        let err = manifest.validate().unwrap_err();

        assert!(matches!(err, Error::InvalidDependency { index: 1, .. }));
        assert!(err.to_string().contains("include pattern"));
    }

    #[test]
    fn test_prepare_resolves_targets() {
        let temp_dir = TempDir::new().unwrap();
        let manifest_path = temp_dir.path().join("pasta.yaml");
        let mut files = spec("https://github.com/foo/bar", "", ".");
        files.files = vec!["LICENSE".to_string()];
        let mut manifest = Manifest {
            keep_dirs: false,
            deps: vec![spec("https://github.com/foo/docs", "docs/", "vendor/docs/"), files],
        };
        manifest.deps[0].options.insert("ref".to_string(), "main".to_string());
        manifest.validate().unwrap();

        let deps = manifest.prepare(&manifest_path).unwrap();

        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].target, temp_dir.path().join("vendor/docs/"));
        assert_eq!(deps[0].config.from, "docs/");
        assert_eq!(deps[0].config.option("ref"), "main");
        assert!(deps[0].config.clear_target);
        assert_eq!(deps[1].target, temp_dir.path());
        assert!(!deps[1].config.clear_target);
        assert!(deps[1].config.filter.keep("LICENSE"));
        assert!(!deps[1].config.filter.keep("README.md"));
        assert_ne!(deps[0].staging_dir(), deps[1].staging_dir());
    }

    #[test]
    fn test_from_file_and_discover() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let manifest_path = temp_dir.path().join("a/pasta.yaml");
        fs::write(
            &manifest_path,
            "deps:\n  - url: github.com/foo/bar\n    from: docs/\n    to: docs/\n",
        )
        .unwrap();

        let found = discover(&nested).unwrap();
        assert_eq!(found, manifest_path);

        let manifest = from_file(&found).unwrap();
        assert_eq!(manifest.deps[0].url, "github.com/foo/bar");
    }

    #[test]
    fn test_discover_not_found() {
        let temp_dir = TempDir::new().unwrap();
        // Only meaningful when no ancestor of the temp dir has a manifest.
        if temp_dir.path().ancestors().any(|d| d.join(MANIFEST_FILE_NAME).exists()) {
            return;
        }

        let err = discover(temp_dir.path()).unwrap_err();

        assert!(matches!(err, Error::ManifestNotFound { .. }));
        assert!(err.to_string().contains("pasta.yaml"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/nonexistent/pasta.yaml").unwrap_err();
        assert!(err.to_string().contains("couldn't read file"));
    }

    #[test]
    fn test_is_clean() {
        assert!(is_clean("a/"));
        assert!(is_clean("a/b/"));
        assert!(is_clean("../a/"));
        assert!(!is_clean("a"));
        assert!(!is_clean("a//"));
        assert!(!is_clean("./a/"));
        assert!(!is_clean("a/../"));
    }

    #[test]
    fn test_is_parent_only() {
        assert!(is_parent_only("../"));
        assert!(is_parent_only("../../"));
        assert!(!is_parent_only("../shared/"));
        assert!(!is_parent_only("out/"));
    }

    #[test]
    fn test_parent_target_is_rejected_before_anything_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).unwrap();
        let manifest_path = project.join("pasta.yaml");
        fs::write(
            &manifest_path,
            "deps:\n  - url: https://github.com/foo/bar\n    to: ../\n",
        )
        .unwrap();

        let err = from_file(&manifest_path).unwrap_err();

        assert_eq!(err.exit_code(), crate::exit_codes::CONFIG);
        assert!(err.to_string().contains("'to' must not be a parent"));
        assert!(manifest_path.exists());
    }
}
