//! Path containment checks.
//!
//! Every filesystem mutation driven by a user-supplied path goes through
//! [`resolve_within_root`] or [`resolve_strictly_within_root`] first. The
//! check is lexical (like `abspath`): `.` and `..` segments are folded
//! before comparing against the root, and nothing is cached between calls.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{ArquivistaError, Result};

/// Make `path` absolute against the working directory and fold `.`/`..`.
fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

/// Lexically normalize an absolute path.
///
/// `..` never climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if normalized.parent().is_some() {
                    normalized.pop();
                }
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve `relative` against `root`, accepting `root` itself or any descendant.
///
/// Absolute `relative` paths replace the root when joined and are therefore
/// rejected unless they happen to point inside it.
pub fn resolve_within_root(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let root_abs = absolutize(root)?;
    let target = absolutize(&root_abs.join(relative))?;

    if target.starts_with(&root_abs) {
        Ok(target)
    } else {
        Err(ArquivistaError::PathTraversal(
            relative.to_string_lossy().into_owned(),
        ))
    }
}

/// Like [`resolve_within_root`] but also rejects the root itself.
///
/// Used for deletion: removing an account root is never valid.
pub fn resolve_strictly_within_root(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let target = resolve_within_root(root, relative)?;
    if target == absolutize(root)? {
        return Err(ArquivistaError::PathTraversal(
            relative.to_string_lossy().into_owned(),
        ));
    }
    Ok(target)
}
