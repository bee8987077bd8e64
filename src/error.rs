//! Error types for package editing sessions.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when opening, closing, or repacking a session, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use zipsession::{Configuration, Error, Session};
//!
//! fn open(path: &str) -> zipsession::Result<Session> {
//!     let config = Configuration::new(path, "anki21")?;
//!     match Session::open(&config) {
//!         Err(Error::TargetNotFound { suffix, .. }) => {
//!             eprintln!("package has no {} entry", suffix);
//!             Err(Error::TargetNotFound {
//!                 suffix,
//!                 archive: path.into(),
//!             })
//!         }
//!         other => other,
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// The main error type for session operations.
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`Cleanup`][Self::Cleanup] | File system operations |
/// | Archive | [`InvalidFormat`][Self::InvalidFormat], [`ArchiveNotFound`][Self::ArchiveNotFound] | Unreadable source package |
/// | Content | [`TargetNotFound`][Self::TargetNotFound], [`PathTraversal`][Self::PathTraversal] | Package contents |
/// | Repack | [`BackupExists`][Self::BackupExists], [`EntryExists`][Self::EntryExists] | Writing the new package |
/// | Config | [`InvalidConfig`][Self::InvalidConfig], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel] | Caller input |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source file is not a readable zip container.
    #[error("Invalid zip format: {0}")]
    InvalidFormat(String),

    /// The source archive does not exist or is not a regular file.
    #[error("Archive not found: {}", path.display())]
    ArchiveNotFound {
        /// The configured archive path.
        path: PathBuf,
    },

    /// No entry in the archive ends with the configured suffix.
    ///
    /// Usually a misconfigured suffix, or a package missing the expected
    /// content. The scratch directory has already been removed.
    #[error("No {suffix} entry found in {}", archive.display())]
    TargetNotFound {
        /// The normalized target suffix.
        suffix: String,
        /// The archive that was searched.
        archive: PathBuf,
    },

    /// A backup already exists where the original archive would be moved.
    ///
    /// The original archive is left in place and no new archive is
    /// written, so an earlier backup is never overwritten.
    #[error("Backup already exists: {}", path.display())]
    BackupExists {
        /// The derived backup path.
        path: PathBuf,
    },

    /// Two workspace files map to the same archive entry name.
    #[error("Entry already exists: {path}")]
    EntryExists {
        /// The archive-relative name that collided.
        path: String,
    },

    /// An archive path is invalid.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// An archive entry would be extracted outside the workspace.
    #[error("Path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// The entry index with path traversal.
        entry_index: usize,
        /// The path that contains traversal.
        path: String,
    },

    /// An invalid deflate level was requested.
    #[error("invalid compression level {level}: must be 1-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The configuration failed validation or could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The scratch directory could not be removed.
    ///
    /// Only returned when the rest of the operation succeeded; if the
    /// session was dirty the new archive and its backup are already in
    /// place.
    #[error("Failed to remove scratch directory {}: {source}", path.display())]
    Cleanup {
        /// The scratch directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Returns `true` if the source package itself could not be used.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::ArchiveNotFound { .. }
                | Error::TargetNotFound { .. }
                | Error::PathTraversal { .. }
        )
    }

    /// Returns `true` if the error was caused by caller-supplied settings.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_) | Error::InvalidCompressionLevel { .. }
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::InvalidFormat(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.into())
        } else {
            Error::InvalidConfig(err.to_string())
        }
    }
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TargetNotFound {
            suffix: ".anki21".into(),
            archive: PathBuf::from("deck.apkg"),
        };
        assert_eq!(err.to_string(), "No .anki21 entry found in deck.apkg");

        let err = Error::BackupExists {
            path: PathBuf::from("deck (old).apkg"),
        };
        assert!(err.to_string().contains("deck (old).apkg"));

        let err = Error::InvalidCompressionLevel { level: 12 };
        assert_eq!(err.to_string(), "invalid compression level 12: must be 1-9");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: Error =
            zip::result::ZipError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                .into();
        assert!(matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::PermissionDenied));

        let err: Error = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, Error::InvalidFormat(_)));
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_classification() {
        assert!(Error::InvalidConfig("empty suffix".into()).is_config_error());
        assert!(Error::InvalidCompressionLevel { level: 0 }.is_config_error());
        assert!(!Error::InvalidConfig("x".into()).is_archive_error());

        let err = Error::ArchiveNotFound {
            path: PathBuf::from("missing.apkg"),
        };
        assert!(err.is_archive_error());
        assert!(!err.is_config_error());

        let err = Error::BackupExists {
            path: PathBuf::from("deck (old).apkg"),
        };
        assert!(!err.is_archive_error());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_cleanup_error_source() {
        use std::error::Error as _;

        let err = Error::Cleanup {
            path: PathBuf::from("/tmp/zipsession-abc"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
