//! Small filesystem helpers shared by the fetcher and the materializer.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Writes `content` to `path`, creating parent directories as needed.
pub fn save_file(path: &Path, content: &[u8]) -> Result<()> {
    create_parent(path)?;
    fs::write(path, content).map_err(|e| Error::Filesystem {
        message: format!("Failed to write file '{}': {}", path.display(), e),
    })
}

/// Copies `from` to `to`, creating parent directories of `to` as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    create_parent(to)?;
    fs::copy(from, to).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy '{}' to '{}': {}",
            from.display(),
            to.display(),
            e
        ),
    })?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }
    Ok(())
}
