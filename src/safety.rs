//! Extraction path validation.
//!
//! Entry names are validated by [`ArchivePath`] first; this module then
//! checks that the resolved on-disk location stays inside the workspace.

use std::path::{Path, PathBuf};

use crate::{ArchivePath, Error, Result};

/// Validates where an archive entry will be written inside `dest_root`.
///
/// Returns the full path to extract to. The deepest existing ancestor of
/// that path is canonicalized and must remain under the canonical
/// `dest_root`, so a directory that resolves elsewhere cannot redirect the
/// write.
///
/// # Errors
///
/// Returns [`Error::PathTraversal`] if the path escapes `dest_root`, or
/// [`Error::Io`] if `dest_root` cannot be canonicalized.
pub fn validate_extract_path(
    archive_path: &ArchivePath,
    dest_root: &Path,
    entry_index: usize,
) -> Result<PathBuf> {
    let traversal = || Error::PathTraversal {
        entry_index,
        path: archive_path.as_str().to_string(),
    };

    let canonical_dest = dest_root.canonicalize()?;
    let full_path = dest_root.join(archive_path.to_relative_path());

    let mut ancestor = full_path.as_path();
    let mut missing = Vec::new();
    while !ancestor.exists() {
        let Some(name) = ancestor.file_name() else {
            return Err(traversal());
        };
        missing.push(name.to_os_string());
        ancestor = match ancestor.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return Err(traversal()),
        };
    }

    let mut resolved = ancestor.canonicalize()?;
    for name in missing.into_iter().rev() {
        resolved.push(name);
    }

    if !resolved.starts_with(&canonical_dest) {
        return Err(traversal());
    }

    Ok(full_path)
}
