//! Lookup of the backend responsible for a URL.

use log::debug;

use super::Backend;
use crate::error::{Error, Result};
use crate::github::GitHubBackend;
use crate::settings::Settings;

/// The set of backends available to a run.
///
/// The registry is an explicit value built at startup and passed to the
/// staging coordinator, so tests can register fakes.
#[derive(Default)]
pub struct Registry {
    backends: Vec<Box<dyn Backend>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by the CLI: the GitHub backend only.
    pub fn with_defaults(settings: &Settings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(GitHubBackend::new(settings)?));
        Ok(registry)
    }

    pub fn register(&mut self, backend: Box<dyn Backend>) {
        debug!("registering backend '{}'", backend.name());
        self.backends.push(backend);
    }

    /// Builder-style [`Registry::register`].
    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.register(backend);
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Returns the single backend that claims `url`.
    pub fn find(&self, url: &str) -> Result<&dyn Backend> {
        let mut claims = self.backends.iter().filter(|b| b.matches(url));

        let Some(first) = claims.next() else {
            return Err(Error::NoBackend {
                url: url.to_string(),
            });
        };

        let others: Vec<&str> = claims.map(|b| b.name()).collect();
        if !others.is_empty() {
            let mut names = vec![first.name()];
            names.extend(others);
            return Err(Error::AmbiguousBackend {
                url: url.to_string(),
                backends: names.join(", "),
            });
        }

        Ok(first.as_ref())
    }
}
