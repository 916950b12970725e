//! Canonical path parsing and validation.
//!
//! A canonical path is `"/"` (the root) or `"/c1/c2/.../cn/"`, where each
//! `ci` is one to [`MAX_FOLDER_NAME_LENGTH`] lowercase ASCII letters, and
//! the whole string is at most [`MAX_PATH_LENGTH`] bytes. Paths always
//! begin and end with `/`.

/// Longest a single folder name may be.
pub const MAX_FOLDER_NAME_LENGTH: usize = 255;

/// Longest a full canonical path may be.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Returns whether `path` is a canonical path.
pub fn is_path_valid(path: &str) -> bool {
    if path.is_empty() || path.len() > MAX_PATH_LENGTH {
        return false;
    }
    if path == "/" {
        return true;
    }
    if !path.starts_with('/') || !path.ends_with('/') {
        return false;
    }
    path[1..path.len() - 1].split('/').all(|component| {
        !component.is_empty()
            && component.len() <= MAX_FOLDER_NAME_LENGTH
            && component.bytes().all(|b| b.is_ascii_lowercase())
    })
}

/// Splits the first component off a canonical path.
///
/// Given `"/a/b/c/"` returns `Some(("a", "/b/c/"))`; given `"/"` (the
/// root, with nothing left to split) returns `None`. `path` must already
/// be known canonical.
pub(crate) fn split_first_component(path: &str) -> Option<(&str, &str)> {
    debug_assert!(path.starts_with('/'), "path must be canonical: {path:?}");
    let rest = &path[1..];
    if rest.is_empty() {
        return None;
    }
    let end = rest
        .find('/')
        .expect("canonical path components are slash-terminated");
    Some(rest.split_at(end))
}

/// Splits a canonical non-root path into its parent directory path and
/// terminal component name.
///
/// Given `"/a/b/c/"` returns `Some(("/a/b/", "c"))`; given `"/"` returns
/// `None`. `path` must already be known canonical.
pub(crate) fn split_parent(path: &str) -> Option<(String, String)> {
    if path == "/" {
        return None;
    }
    debug_assert!(path.starts_with('/') && path.ends_with('/'));
    let without_trailing_slash = &path[..path.len() - 1];
    let last_slash = without_trailing_slash
        .rfind('/')
        .expect("canonical path must start with '/'");
    let parent = path[..last_slash + 1].to_string();
    let component = path[last_slash + 1..path.len() - 1].to_string();
    Some((parent, component))
}

/// Whether `path` strictly starts with `prefix` (i.e. is a proper,
/// longer descendant of it as a string).
pub(crate) fn starts_with_strict(path: &str, prefix: &str) -> bool {
    path.len() > prefix.len() && path.starts_with(prefix)
}

/// The longest common ancestor directory of two canonical directory
/// paths, computed as the longest common string prefix of `a` and `b`
/// truncated back to the last `/` (inclusive).
///
/// Both paths must already be canonical directory paths (ending in
/// `/`); the result is always itself a canonical directory path, since
/// canonical components never contain `/`.
pub(crate) fn longest_common_ancestor(a: &str, b: &str) -> String {
    let common_len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    let prefix = &a[..common_len];
    let last_slash = prefix
        .rfind('/')
        .expect("canonical paths always start with '/'");
    a[..=last_slash].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_canonical_paths() {
        assert!(is_path_valid("/"));
        assert!(is_path_valid("/a/"));
        assert!(is_path_valid("/a/bcd/ef/"));
        assert!(!is_path_valid(""));
        assert!(!is_path_valid("a/"));
        assert!(!is_path_valid("/a"));
        assert!(!is_path_valid("//"));
        assert!(!is_path_valid("/A/"));
        assert!(!is_path_valid("/a1/"));
        assert!(!is_path_valid("/a//b/"));
        assert!(!is_path_valid(&format!(
            "/{}/",
            "a".repeat(MAX_FOLDER_NAME_LENGTH + 1)
        )));
    }

    #[test]
    fn splits_first_component() {
        assert_eq!(split_first_component("/"), None);
        assert_eq!(split_first_component("/a/"), Some(("a", "/")));
        assert_eq!(split_first_component("/a/b/c/"), Some(("a", "/b/c/")));
    }

    #[test]
    fn splits_parent() {
        assert_eq!(split_parent("/"), None);
        assert_eq!(
            split_parent("/a/"),
            Some(("/".to_string(), "a".to_string()))
        );
        assert_eq!(
            split_parent("/a/b/c/"),
            Some(("/a/b/".to_string(), "c".to_string()))
        );
    }

    #[test]
    fn strict_prefix_check() {
        assert!(starts_with_strict("/a/b/", "/a/"));
        assert!(!starts_with_strict("/a/", "/a/"));
        assert!(!starts_with_strict("/a/", "/a/b/"));
        assert!(!starts_with_strict("/b/", "/a/"));
    }

    #[test]
    fn lca_is_longest_common_ancestor_dir() {
        assert_eq!(longest_common_ancestor("/a/b/", "/a/c/"), "/a/");
        assert_eq!(longest_common_ancestor("/a/", "/b/"), "/");
        assert_eq!(longest_common_ancestor("/a/b/c/", "/a/b/d/e/"), "/a/b/");
        assert_eq!(longest_common_ancestor("/a/", "/a/"), "/a/");
    }
}
