//! Index-name canonicalization.
//!
//! Users may refer to an index by its bare name (`posts`); the index server
//! knows it by its suffixed name (`posts_idx`). Every name that crosses into
//! index-server-facing form goes through [`canonicalize_with`].

use crate::settings;

/// Append `suffix` to `name` unless it already ends with it.
///
/// Idempotent: applying it twice yields the same name.
pub fn canonicalize_with(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Canonicalize with the current process-wide suffix.
pub fn canonicalize(name: &str) -> String {
    canonicalize_with(name, &settings::current().index_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_appends_suffix() {
        assert_eq!(canonicalize_with("butter", "_index"), "butter_index");
    }

    #[test]
    fn test_leaves_suffixed_names_alone() {
        assert_eq!(canonicalize_with("butter_index", "_index"), "butter_index");
    }

    #[test]
    fn test_suffix_only_counts_at_the_end() {
        assert_eq!(canonicalize_with("idx_things", "_idx"), "idx_things_idx");
    }

    proptest! {
        #[test]
        fn test_canonicalize_idempotent(name in "[a-z_]{0,16}", suffix in "_[a-z]{1,6}") {
            let once = canonicalize_with(&name, &suffix);
            prop_assert!(once.ends_with(&suffix));
            prop_assert_eq!(canonicalize_with(&once, &suffix), once);
        }
    }
}
