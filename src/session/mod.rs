//! Scoped editing sessions over a zip package.
//!
//! A [`Session`] extracts a package into a private scratch workspace and
//! exposes one entry, the *target*, for editing in place. Closing the
//! session decides what happens next:
//!
//! - If the target was not modified, the original package is left untouched.
//! - If it was, the original is renamed to a backup (`deck.apkg` becomes
//!   `deck (old).apkg`) and a new package is built from the workspace at the
//!   original path.
//!
//! Either way the workspace is removed.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipsession::{Configuration, Session, SessionOutcome};
//!
//! let config = Configuration::new("deck.apkg", "anki21")?;
//! let mut session = Session::open(&config)?;
//!
//! std::fs::write(session.target_path(), b"edited database")?;
//!
//! if let SessionOutcome::Repacked { backup_path, .. } = session.close()? {
//!     println!("original kept at {}", backup_path.display());
//! }
//! # Ok::<(), zipsession::Error>(())
//! ```

mod backup;
mod extract;

pub use backup::backup_path;
pub use extract::{ExtractedEntry, TargetEntry};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::TempDir;

use crate::{ArchivePath, Compression, Configuration, Error, RepackResult, Repacker, Result};

/// Prefix of scratch workspace directory names.
const SCRATCH_PREFIX: &str = "zipsession-";

/// What [`Session::close`] did.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The target was not modified; the package was left as it was.
    Unchanged,
    /// The package was rebuilt from the workspace.
    Repacked {
        /// Where the original package now lives.
        backup_path: PathBuf,
        /// Summary of the new package.
        result: RepackResult,
    },
    /// The session had already been closed or discarded.
    AlreadyClosed,
}

impl SessionOutcome {
    /// Returns `true` if a new package was written.
    pub fn is_repacked(&self) -> bool {
        matches!(self, Self::Repacked { .. })
    }

    /// Returns the backup location if a new package was written.
    pub fn backup_path(&self) -> Option<&Path> {
        match self {
            Self::Repacked { backup_path, .. } => Some(backup_path),
            _ => None,
        }
    }
}

/// An open editing session.
///
/// Dropping a session without calling [`close`](Self::close) discards the
/// workspace and any edits made in it.
#[derive(Debug)]
pub struct Session {
    workspace: Option<TempDir>,
    workspace_path: PathBuf,
    archive_path: PathBuf,
    backup_marker: String,
    target: TargetEntry,
    entries: Vec<ExtractedEntry>,
}

impl Session {
    /// Extracts the configured package and locates its target entry.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveNotFound`] or [`Error::InvalidConfig`] if the
    ///   configuration does not validate
    /// - [`Error::InvalidFormat`] if the package is not a readable zip
    /// - [`Error::PathTraversal`] if an entry would land outside the workspace
    /// - [`Error::TargetNotFound`] if no file entry ends with the suffix
    ///
    /// No scratch directory is left behind on any error.
    pub fn open(config: &Configuration) -> Result<Self> {
        config.validate()?;

        let workspace = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(config.scratch_parent())?;
        log::debug!(
            "Extracting {} into {}",
            config.archive_path.display(),
            workspace.path().display()
        );

        let extraction = match extract::extract_archive(
            &config.archive_path,
            workspace.path(),
            &config.target_suffix,
        ) {
            Ok(extraction) => extraction,
            Err(err) => {
                remove_workspace(workspace);
                return Err(err);
            }
        };

        let Some(target) = extraction.target else {
            remove_workspace(workspace);
            return Err(Error::TargetNotFound {
                suffix: config.target_suffix.to_string(),
                archive: config.archive_path.clone(),
            });
        };

        Ok(Self {
            workspace_path: workspace.path().to_path_buf(),
            workspace: Some(workspace),
            archive_path: config.archive_path.clone(),
            backup_marker: config.backup_marker.clone(),
            target,
            entries: extraction.entries,
        })
    }

    /// Opens a session, runs `f` on it, and closes it.
    ///
    /// If `f` fails the session is discarded instead and the package is left
    /// untouched.
    ///
    /// ```rust,no_run
    /// use zipsession::{Configuration, Session};
    ///
    /// let config = Configuration::new("deck.apkg", "anki21")?;
    /// let (_, outcome) = Session::run(&config, |session| {
    ///     std::fs::write(session.target_path(), b"edited")?;
    ///     Ok(())
    /// })?;
    /// assert!(outcome.is_repacked());
    /// # Ok::<(), zipsession::Error>(())
    /// ```
    pub fn run<T, F>(config: &Configuration, f: F) -> Result<(T, SessionOutcome)>
    where
        F: FnOnce(&Session) -> Result<T>,
    {
        let mut session = Self::open(config)?;
        match f(&session) {
            Ok(value) => {
                let outcome = session.close()?;
                Ok((value, outcome))
            }
            Err(err) => {
                if let Err(discard_err) = session.discard() {
                    log::warn!("Failed to discard session: {}", discard_err);
                }
                Err(err)
            }
        }
    }

    /// Path of the extracted target file inside the workspace.
    pub fn target_path(&self) -> &Path {
        &self.target.path
    }

    /// Archive-relative name of the target entry.
    pub fn target_name(&self) -> &ArchivePath {
        &self.target.name
    }

    /// The target entry.
    pub fn target(&self) -> &TargetEntry {
        &self.target
    }

    /// The scratch workspace directory.
    pub fn workspace(&self) -> &Path {
        &self.workspace_path
    }

    /// The package this session edits.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Compression used for every entry when repacking.
    pub fn compression(&self) -> Compression {
        self.target.compression
    }

    /// Modification time of the target right after extraction.
    pub fn created_at(&self) -> SystemTime {
        self.target.created_at
    }

    /// Every entry of the original package, in archive order.
    pub fn entries(&self) -> &[ExtractedEntry] {
        &self.entries
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.workspace.is_none()
    }

    /// Returns `true` if the target was modified since extraction.
    ///
    /// Only the target's modification time is compared. Changes to other
    /// workspace files are written out on repack, but never cause one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the target can no longer be read, for
    /// instance after the session was closed.
    pub fn is_dirty(&self) -> Result<bool> {
        let modified = fs::metadata(&self.target.path)?.modified()?;
        Ok(modified > self.target.created_at)
    }

    /// Ends the session.
    ///
    /// Repacks the package if the target was modified, then removes the
    /// workspace. Calling `close` again returns
    /// [`SessionOutcome::AlreadyClosed`].
    ///
    /// # Errors
    ///
    /// - [`Error::BackupExists`] if the backup location is taken; the
    ///   package is left untouched
    /// - any repack error; the original package is moved back into place
    /// - [`Error::Cleanup`] if only the workspace removal failed
    ///
    /// The workspace is removed in every case.
    pub fn close(&mut self) -> Result<SessionOutcome> {
        let Some(workspace) = self.workspace.take() else {
            return Ok(SessionOutcome::AlreadyClosed);
        };

        let outcome = self.finish(workspace.path());
        match (outcome, workspace.close()) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(source)) => Err(Error::Cleanup {
                path: self.workspace_path.clone(),
                source,
            }),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => {
                log::warn!(
                    "Failed to remove scratch directory {}: {}",
                    self.workspace_path.display(),
                    cleanup
                );
                Err(err)
            }
        }
    }

    /// Ends the session without writing anything back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cleanup`] if the workspace could not be removed.
    pub fn discard(mut self) -> Result<()> {
        match self.workspace.take() {
            Some(workspace) => workspace.close().map_err(|source| Error::Cleanup {
                path: self.workspace_path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    fn finish(&self, workspace: &Path) -> Result<SessionOutcome> {
        if !self.is_dirty()? {
            log::debug!(
                "{} unchanged, leaving {} as it was",
                self.target.name,
                self.archive_path.display()
            );
            return Ok(SessionOutcome::Unchanged);
        }

        let backup_path = backup::backup_path(&self.archive_path, &self.backup_marker)?;
        backup::move_to_backup(&self.archive_path, &backup_path)?;

        let order = self
            .entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| entry.path.clone());
        let repacker = Repacker::new(self.compression()).entry_order(order);

        match repacker.repack(workspace, &self.archive_path) {
            Ok(result) => {
                copy_permissions(&backup_path, &self.archive_path);
                Ok(SessionOutcome::Repacked {
                    backup_path,
                    result,
                })
            }
            Err(err) => {
                backup::restore_backup(&backup_path, &self.archive_path);
                Err(err)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            log::warn!(
                "Session for {} dropped without close, discarding edits",
                self.archive_path.display()
            );
            remove_workspace(workspace);
        }
    }
}

fn remove_workspace(workspace: TempDir) {
    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        log::warn!("Failed to remove scratch directory {}: {}", path.display(), e);
    }
}

/// Gives the new package the permissions the original had.
fn copy_permissions(from: &Path, to: &Path) {
    let result = fs::metadata(from).and_then(|meta| fs::set_permissions(to, meta.permissions()));
    if let Err(e) = result {
        log::warn!("Failed to copy permissions to {}: {}", to.display(), e);
    }
}
