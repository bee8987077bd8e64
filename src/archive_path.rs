//! Archive-relative entry names with validation.
//!
//! Every name that crosses the boundary between a zip archive and the
//! workspace goes through [`ArchivePath`]: entry names read during
//! extraction, and file paths collected by the repacker.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Maximum length for archive paths (in bytes).
///
/// The zip format stores names with a 16-bit length field.
const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// A validated archive-relative path.
///
/// `ArchivePath` always uses forward slashes and guarantees that:
/// - No NUL bytes or backslashes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use zipsession::ArchivePath;
///
/// let path = ArchivePath::new("media/0.jpg").unwrap();
/// assert_eq!(path.file_name(), "0.jpg");
///
/// assert!(ArchivePath::new("../collection.anki21").is_err());
/// assert!(ArchivePath::new("/etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path is empty, absolute,
    /// or contains NUL bytes, backslashes, empty segments, `.` or `..`.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates an `ArchivePath` from a zip entry name.
    ///
    /// Directory entries carry a trailing `/` in the zip format, which is
    /// stripped before validation.
    pub fn from_entry_name(name: &str) -> Result<Self> {
        Self::new(name.strip_suffix('/').unwrap_or(name))
    }

    /// Creates an `ArchivePath` from a path relative to a workspace root.
    ///
    /// Each component must be valid UTF-8; `.`, `..`, roots and prefixes
    /// are rejected.
    pub fn from_relative_path(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::InvalidArchivePath(format!(
                            "non UTF-8 file name: {}",
                            path.display()
                        ))
                    })?;
                    segments.push(name);
                }
                _ => {
                    return Err(Error::InvalidArchivePath(format!(
                        "not a plain relative path: {}",
                        path.display()
                    )));
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.contains('\\') {
            return Err(Error::InvalidArchivePath(format!(
                "backslash separator not allowed: {}",
                s
            )));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(format!(
                "absolute path not allowed: {}",
                s
            )));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => return Err(Error::InvalidArchivePath("'.' segment not allowed".into())),
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Converts to a platform path relative to some root.
    pub fn to_relative_path(&self) -> PathBuf {
        self.components().collect()
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
