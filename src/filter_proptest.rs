//! Property-based tests for path selection.
//!
//! These tests use proptest to generate random paths and patterns and verify
//! that the filter's invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::filter::{anchor, PathFilter};
    use proptest::prelude::*;
    use regex::Regex;

    fn path_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.-]{1,8}(/[a-zA-Z0-9_.-]{1,8}){0,4}"
    }

    // ============================================================================
    // Defaults
    // ============================================================================

    proptest! {
        /// Property: an empty include keeps every path
        #[test]
        fn empty_patterns_keep_everything(path in path_strategy()) {
            let filter = PathFilter::new("", "", &[]).unwrap();
            prop_assert!(filter.keep(&path));
        }

        /// Property: whitespace-only patterns behave like empty ones
        #[test]
        fn blank_patterns_keep_everything(path in path_strategy(), blank in "[ \t]{0,3}") {
            let filter = PathFilter::new(&blank, &blank, &[]).unwrap();
            prop_assert!(filter.keep(&path));
        }

        /// Property: excluding everything keeps nothing, whatever is included
        #[test]
        fn exclude_all_keeps_nothing(path in path_strategy()) {
            let filter = PathFilter::new(".*", ".*", &[]).unwrap();
            prop_assert!(!filter.keep(&path));
        }
    }

    // ============================================================================
    // Determinism and anchoring
    // ============================================================================

    proptest! {
        /// Property: keep is deterministic
        #[test]
        fn keep_is_deterministic(path in path_strategy()) {
            let filter = PathFilter::new(r".*\.md", "docs/.*", &[]).unwrap();
            prop_assert_eq!(filter.keep(&path), filter.keep(&path));
        }

        /// Property: a literal pattern only matches the identical path
        #[test]
        fn literal_pattern_matches_whole_path(path in path_strategy(), other in path_strategy()) {
            let filter = PathFilter::new(&regex::escape(&path), "", &[]).unwrap();
            prop_assert!(filter.keep(&path));
            prop_assert_eq!(filter.keep(&other), other == path);
        }

        /// Property: anchoring is idempotent
        #[test]
        fn anchor_is_idempotent(pattern in "[a-z.]{0,6}") {
            let once = anchor(&pattern);
            prop_assert_eq!(anchor(&once), once.clone());
            prop_assert!(Regex::new(&once).is_ok());
        }
    }

    // ============================================================================
    // Explicit file lists
    // ============================================================================

    proptest! {
        /// Property: a file list keeps exactly its members
        #[test]
        fn file_list_keeps_exact_members(
            files in prop::collection::vec(path_strategy(), 1..5),
            candidate in path_strategy(),
        ) {
            let filter = PathFilter::new("", "", &files).unwrap();
            for file in &files {
                prop_assert!(filter.keep(file));
            }
            prop_assert_eq!(filter.keep(&candidate), files.contains(&candidate));
        }
    }
}
