//! Process exit statuses.
//!
//! Usage errors (unknown flags, missing arguments) are reported by `clap`
//! with [`USAGE`]. Every other failure class has its own status so scripts
//! can tell a bad manifest from a collision or a run where nothing could be
//! fetched.

/// The run completed. Individual dependencies may still have been skipped.
pub const SUCCESS: i32 = 0;

/// Unclassified failure (I/O, network outside a dependency, ...).
pub const FAILURE: i32 = 1;

/// Invalid command-line usage.
pub const USAGE: i32 = 2;

/// No `pasta.yaml` in the current directory or any parent.
pub const MANIFEST_NOT_FOUND: i32 = 3;

/// The manifest is malformed or fails validation.
pub const CONFIG: i32 = 4;

/// Two dependencies would write the same file.
pub const COLLISION: i32 = 5;

/// Every dependency failed to fetch.
pub const ALL_SOURCES_FAILED: i32 = 6;

/// Staging directories could not be removed.
pub const CLEANUP: i32 = 7;

/// The run was interrupted.
pub const CANCELLED: i32 = 130;
