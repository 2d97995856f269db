//! Detection of files that two dependencies would both write.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Checks that no two dependencies stage a file for the same destination.
///
/// `staged[i]` holds the destination paths of dependency `i`'s files. The
/// first path claimed twice is reported.
pub fn check<P: AsRef<Path>>(staged: &[Vec<P>]) -> Result<()> {
    let mut owners: HashMap<&Path, usize> = HashMap::new();

    for (index, paths) in staged.iter().enumerate() {
        for path in paths {
            let path = path.as_ref();
            if let Some(&owner) = owners.get(path) {
                if owner != index {
                    return Err(Error::TargetPathCollision {
                        path: path.display().to_string(),
                    });
                }
            } else {
                owners.insert(path, index);
            }
        }
    }

    Ok(())
}
