//! Resolution of a user supplied `ref` to a commit SHA.
//!
//! Accepted forms:
//!
//! | ref                | lookup                                             |
//! |--------------------|----------------------------------------------------|
//! | `""`               | `heads/<default branch>`                           |
//! | `heads/<branch>`   | that ref, failure is final                         |
//! | `tags/<tag>`       | that ref, failure is final                         |
//! | `commit/<sha>`     | `<sha>` verbatim, no request                       |
//! | anything else      | branch, then tag, then commit, then raw ref        |

use log::debug;
use tokio_util::sync::CancellationToken;

use super::api::{GitHubApi, GitObject};
use super::RepoId;
use crate::error::{Error, Result};

const COMMIT_PREFIX: &str = "commit/";

/// Resolves `reference` to the SHA of a commit in `repo`.
pub fn resolve(
    api: &dyn GitHubApi,
    cancel: &CancellationToken,
    repo: &RepoId,
    reference: &str,
) -> Result<String> {
    let reference = reference.trim();

    if reference.is_empty() {
        check_cancelled(cancel)?;
        let branch = api.repository(repo)?.default_branch;
        debug!("{}: using default branch '{}'", repo, branch);
        return lookup_explicit(api, cancel, repo, &format!("heads/{}", branch));
    }

    if reference.starts_with("heads/") || reference.starts_with("tags/") {
        return lookup_explicit(api, cancel, repo, reference);
    }

    if let Some(sha) = reference.strip_prefix(COMMIT_PREFIX) {
        return Ok(sha.to_string());
    }

    resolve_bare(api, cancel, repo, reference)
}

fn lookup_explicit(
    api: &dyn GitHubApi,
    cancel: &CancellationToken,
    repo: &RepoId,
    reference: &str,
) -> Result<String> {
    check_cancelled(cancel)?;
    let object = api
        .git_ref(repo, reference)
        .map_err(|e| Error::RefLookupFailed {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;
    peel(api, cancel, repo, object).map_err(|e| match e {
        Error::Cancelled => e,
        other => Error::RefLookupFailed {
            reference: reference.to_string(),
            message: other.to_string(),
        },
    })
}

/// Tries a name of unknown kind against every form in turn.
fn resolve_bare(
    api: &dyn GitHubApi,
    cancel: &CancellationToken,
    repo: &RepoId,
    reference: &str,
) -> Result<String> {
    for candidate in [format!("heads/{}", reference), format!("tags/{}", reference)] {
        check_cancelled(cancel)?;
        if let Ok(object) = api.git_ref(repo, &candidate) {
            debug!("{}: '{}' resolved as {}", repo, reference, candidate);
            return peel(api, cancel, repo, object);
        }
    }

    check_cancelled(cancel)?;
    if let Ok(commit) = api.commit(repo, reference) {
        debug!("{}: '{}' resolved as a commit", repo, reference);
        return Ok(commit.sha);
    }

    check_cancelled(cancel)?;
    if let Ok(object) = api.git_ref(repo, reference) {
        debug!("{}: '{}' resolved as a raw ref", repo, reference);
        return peel(api, cancel, repo, object);
    }

    Err(Error::RefUnresolvable {
        reference: reference.to_string(),
    })
}

/// Follows annotated tags down to the commit they point at.
fn peel(
    api: &dyn GitHubApi,
    cancel: &CancellationToken,
    repo: &RepoId,
    mut object: GitObject,
) -> Result<String> {
    // Tags of tags are legal, but a cycle is not.
    for _ in 0..8 {
        if object.kind != "tag" {
            return Ok(object.sha);
        }
        check_cancelled(cancel)?;
        object = api.tag(repo, &object.sha)?;
    }
    Err(Error::RefUnresolvable {
        reference: object.sha,
    })
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
