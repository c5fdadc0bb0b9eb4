//! Root containment checks for paths received over the network
//!
//! This is a lexical check: `.` and `..` are resolved textually and
//! symlinks are not followed, so it is not a hard security boundary.

use crate::{FsError, Result};
use std::path::{Component, Path, PathBuf};

/// Unify separators, restore a bare drive spec and resolve `.`/`..`
pub fn normalize_lexically(path: &str) -> PathBuf {
    let mut unified = path.replace('\\', "/");

    // "E:" and "E:foo" become "E:/" and "E:/foo"
    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.get(2) != Some(&b'/') {
            unified.insert(2, '/');
        }
    }

    #[cfg(windows)]
    let unified = unified.replace('/', "\\");

    let mut normalized = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized
}

/// Case-folded components used for comparison
fn comparison_key(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect()
}

/// Resolve `requested` against `root` and check containment
///
/// Relative requests are taken relative to `root`. Returns the normalized
/// path on success.
pub fn resolve_within_root(requested: &str, root: &Path) -> Result<PathBuf> {
    if requested.contains('\0') {
        return Err(FsError::InvalidPath(requested.replace('\0', "\\0")));
    }

    let root_str = root.to_string_lossy();
    let root_norm = normalize_lexically(&root_str);
    let requested_norm = normalize_lexically(requested);

    // Join before resolving so leading ".." cannot be swallowed
    let candidate = if requested_norm.has_root() {
        requested_norm
    } else {
        normalize_lexically(&format!("{}/{}", root_str, requested))
    };

    let root_key = comparison_key(&root_norm);
    if !root_key.is_empty() && comparison_key(&candidate).starts_with(&root_key) {
        Ok(candidate)
    } else {
        tracing::warn!(
            "Rejected path {} outside root {}",
            requested,
            root_norm.display()
        );
        Err(FsError::Forbidden(requested.to_string()))
    }
}

/// Whether `requested` stays inside `root` after normalization
pub fn is_within_root(requested: &str, root: &Path) -> bool {
    resolve_within_root(requested, root).is_ok()
}
