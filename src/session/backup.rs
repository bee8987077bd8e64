//! Backup naming and the rename that sets the original package aside.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Returns where the original package is moved before repacking.
///
/// The marker goes between the file stem and the extension:
///
/// ```rust
/// use std::path::Path;
/// use zipsession::session::backup_path;
///
/// let backup = backup_path(Path::new("decks/deck.apkg"), " (old)").unwrap();
/// assert_eq!(backup, Path::new("decks/deck (old).apkg"));
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `archive` has no file name.
pub fn backup_path(archive: &Path, marker: &str) -> Result<PathBuf> {
    let stem = archive.file_stem().ok_or_else(|| {
        Error::InvalidConfig(format!("{} has no file name", archive.display()))
    })?;

    let mut name = stem.to_os_string();
    name.push(marker);
    if let Some(ext) = archive.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(archive.with_file_name(name))
}

/// Renames `archive` to `backup`, refusing to replace an existing file.
pub(crate) fn move_to_backup(archive: &Path, backup: &Path) -> Result<()> {
    match fs::symlink_metadata(backup) {
        Ok(_) => {
            return Err(Error::BackupExists {
                path: backup.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    fs::rename(archive, backup)?;
    log::debug!(
        "Moved {} to {}",
        archive.display(),
        backup.display()
    );
    Ok(())
}

/// Moves a backup back into place after a failed repack.
pub(crate) fn restore_backup(backup: &Path, archive: &Path) {
    if let Err(e) = fs::rename(backup, archive) {
        log::warn!(
            "Failed to restore {} from {}: {}",
            archive.display(),
            backup.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_with_extension() {
        assert_eq!(
            backup_path(Path::new("deck.apkg"), " (old)").unwrap(),
            PathBuf::from("deck (old).apkg")
        );
        assert_eq!(
            backup_path(Path::new("/data/my deck.colpkg"), ".bak").unwrap(),
            PathBuf::from("/data/my deck.bak.colpkg")
        );
    }

    #[test]
    fn test_backup_path_multiple_dots() {
        // Only the last extension is kept after the marker
        assert_eq!(
            backup_path(Path::new("archive.tar.zip"), " (old)").unwrap(),
            PathBuf::from("archive.tar (old).zip")
        );
    }

    #[test]
    fn test_backup_path_without_extension() {
        assert_eq!(
            backup_path(Path::new("package"), " (old)").unwrap(),
            PathBuf::from("package (old)")
        );
        assert_eq!(
            backup_path(Path::new(".apkg"), " (old)").unwrap(),
            PathBuf::from(".apkg (old)")
        );
    }

    #[test]
    fn test_backup_path_no_file_name() {
        assert!(matches!(
            backup_path(Path::new("/"), " (old)"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_move_to_backup() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("deck.apkg");
        let backup = dir.path().join("deck (old).apkg");
        fs::write(&archive, b"zip").unwrap();

        move_to_backup(&archive, &backup).unwrap();
        assert!(!archive.exists());
        assert_eq!(fs::read(&backup).unwrap(), b"zip");
    }

    #[test]
    fn test_move_to_backup_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("deck.apkg");
        let backup = dir.path().join("deck (old).apkg");
        fs::write(&archive, b"new").unwrap();
        fs::write(&backup, b"previous").unwrap();

        let err = move_to_backup(&archive, &backup).unwrap_err();
        assert!(matches!(err, Error::BackupExists { ref path } if path == &backup));
        assert_eq!(fs::read(&archive).unwrap(), b"new");
        assert_eq!(fs::read(&backup).unwrap(), b"previous");
    }

    #[test]
    fn test_restore_backup() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("deck.apkg");
        let backup = dir.path().join("deck (old).apkg");
        fs::write(&backup, b"zip").unwrap();

        restore_backup(&backup, &archive);
        assert_eq!(fs::read(&archive).unwrap(), b"zip");
        assert!(!backup.exists());
    }
}
