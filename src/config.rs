//! Session configuration.
//!
//! A [`Configuration`] names the package to edit and the suffix of the entry
//! to expose. It is built in code or, with the `json` feature, loaded from a
//! JSON document:
//!
//! ```json
//! {
//!     "archive_path": "decks/Lëtzebuergesch.apkg",
//!     "target_suffix": "anki21",
//!     "backup_marker": " (old)"
//! }
//! ```
//!
//! The field names `zip_path` and `deck_suffix` are accepted as aliases.

#[cfg(feature = "json")]
use std::path::Path;
use std::path::PathBuf;

use crate::{Error, Result};

/// Default marker appended to the archive stem when a backup is created.
pub const DEFAULT_BACKUP_MARKER: &str = " (old)";

/// A normalized entry-name suffix, always starting with a single `.`.
///
/// # Example
///
/// ```rust
/// use zipsession::TargetSuffix;
///
/// assert_eq!(TargetSuffix::new("anki21").unwrap().as_str(), ".anki21");
/// assert_eq!(TargetSuffix::new(".anki21").unwrap().as_str(), ".anki21");
/// assert!(TargetSuffix::new(".").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Deserialize))]
#[cfg_attr(feature = "json", serde(try_from = "String"))]
pub struct TargetSuffix(String);

impl TargetSuffix {
    /// Normalizes and validates a suffix.
    ///
    /// Leading dots are collapsed into one; inner dots are kept, so
    /// `"tar.gz"` becomes `".tar.gz"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if nothing remains after the leading
    /// dots, or if the suffix contains a path separator or NUL byte.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "target suffix {:?} is empty",
                raw
            )));
        }
        if trimmed.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidConfig(format!(
                "target suffix {:?} must not contain path separators",
                raw
            )));
        }
        Ok(Self(format!(".{}", trimmed)))
    }

    /// Returns the suffix including its leading dot.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if an entry name ends with this suffix.
    pub fn matches(&self, name: &str) -> bool {
        name.ends_with(&self.0)
    }
}

impl TryFrom<String> for TargetSuffix {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(&raw)
    }
}

impl std::fmt::Display for TargetSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings for one editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Deserialize))]
#[cfg_attr(feature = "json", serde(deny_unknown_fields))]
pub struct Configuration {
    /// Path to the source zip package.
    #[cfg_attr(feature = "json", serde(alias = "zip_path"))]
    pub archive_path: PathBuf,

    /// Suffix identifying the editable entry.
    #[cfg_attr(feature = "json", serde(alias = "deck_suffix"))]
    pub target_suffix: TargetSuffix,

    /// Parent directory for scratch workspaces.
    ///
    /// Default: the system temporary directory.
    #[cfg_attr(feature = "json", serde(default))]
    pub scratch_root: Option<PathBuf>,

    /// Text appended to the archive stem to name the backup.
    ///
    /// Default: `" (old)"`, so `deck.apkg` is backed up as `deck (old).apkg`.
    #[cfg_attr(feature = "json", serde(default = "default_backup_marker"))]
    pub backup_marker: String,
}

#[cfg(feature = "json")]
fn default_backup_marker() -> String {
    DEFAULT_BACKUP_MARKER.to_string()
}

impl Configuration {
    /// Creates a configuration with default scratch root and backup marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the suffix is invalid.
    pub fn new(archive_path: impl Into<PathBuf>, target_suffix: &str) -> Result<Self> {
        Ok(Self {
            archive_path: archive_path.into(),
            target_suffix: TargetSuffix::new(target_suffix)?,
            scratch_root: None,
            backup_marker: DEFAULT_BACKUP_MARKER.to_string(),
        })
    }

    /// Sets the parent directory for scratch workspaces.
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Sets the backup marker.
    pub fn backup_marker(mut self, marker: impl Into<String>) -> Self {
        self.backup_marker = marker.into();
        self
    }

    /// Returns the directory scratch workspaces are created in.
    pub fn scratch_parent(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Checks the settings that can only be checked against the file system.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveNotFound`] if `archive_path` is not an existing file
    /// - [`Error::InvalidConfig`] if the backup marker is empty or contains a
    ///   path separator, or the scratch root is not a directory
    pub fn validate(&self) -> Result<()> {
        if !self.archive_path.is_file() {
            return Err(Error::ArchiveNotFound {
                path: self.archive_path.clone(),
            });
        }

        if self.backup_marker.is_empty() || self.backup_marker.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidConfig(format!(
                "backup marker {:?} must be non-empty and free of path separators",
                self.backup_marker
            )));
        }

        if let Some(root) = &self.scratch_root {
            if !root.is_dir() {
                return Err(Error::InvalidConfig(format!(
                    "scratch root {} is not a directory",
                    root.display()
                )));
            }
        }

        Ok(())
    }

    /// Parses a configuration from a JSON string.
    #[cfg(feature = "json")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// A relative `archive_path` or `scratch_root` is resolved against the
    /// directory containing the file.
    #[cfg(feature = "json")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;

        if let Some(base) = path.parent() {
            config.archive_path = resolve(base, &config.archive_path);
            config.scratch_root = config.scratch_root.map(|root| resolve(base, &root));
        }
        Ok(config)
    }
}

#[cfg(feature = "json")]
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_normalization() {
        assert_eq!(TargetSuffix::new("anki21").unwrap().as_str(), ".anki21");
        assert_eq!(TargetSuffix::new(".anki21").unwrap().as_str(), ".anki21");
        assert_eq!(TargetSuffix::new("..anki21").unwrap().as_str(), ".anki21");
        assert_eq!(TargetSuffix::new(" anki2 ").unwrap().as_str(), ".anki2");
        assert_eq!(TargetSuffix::new("tar.gz").unwrap().as_str(), ".tar.gz");
    }

    #[test]
    fn test_suffix_rejects_empty_and_separators() {
        for bad in ["", ".", "...", "  "] {
            assert!(
                matches!(TargetSuffix::new(bad), Err(Error::InvalidConfig(_))),
                "{:?}",
                bad
            );
        }
        assert!(TargetSuffix::new("a/b").is_err());
        assert!(TargetSuffix::new("a\\b").is_err());
    }

    #[test]
    fn test_suffix_matches() {
        let suffix = TargetSuffix::new("anki21").unwrap();
        assert!(suffix.matches("collection.anki21"));
        assert!(suffix.matches("nested/collection.anki21"));
        assert!(!suffix.matches("collection.anki2"));
        assert!(!suffix.matches("collectionanki21"));
        assert!(!suffix.matches("collection.anki21.bak"));
    }

    #[test]
    fn test_configuration_defaults() {
        let config = Configuration::new("deck.apkg", "anki21").unwrap();
        assert_eq!(config.archive_path, PathBuf::from("deck.apkg"));
        assert_eq!(config.backup_marker, DEFAULT_BACKUP_MARKER);
        assert_eq!(config.scratch_root, None);
        assert_eq!(config.scratch_parent(), std::env::temp_dir());
    }

    #[test]
    fn test_validate_missing_archive() {
        let config = Configuration::new("/definitely/not/here.apkg", "anki21").unwrap();
        assert!(matches!(
            config.validate(),
            Err(Error::ArchiveNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_marker_and_scratch_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = dir.path().join("deck.apkg");
        std::fs::write(&archive, b"PK").unwrap();

        let config = Configuration::new(&archive, "anki21").unwrap();
        assert!(config.validate().is_ok());

        let bad_marker = config.clone().backup_marker("");
        assert!(matches!(bad_marker.validate(), Err(Error::InvalidConfig(_))));

        let bad_marker = config.clone().backup_marker("old/");
        assert!(matches!(bad_marker.validate(), Err(Error::InvalidConfig(_))));

        let bad_root = config.scratch_root(dir.path().join("missing"));
        assert!(matches!(bad_root.validate(), Err(Error::InvalidConfig(_))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_str() {
        let config = Configuration::from_json_str(
            r#"{"archive_path": "deck.apkg", "target_suffix": "anki21"}"#,
        )
        .unwrap();
        assert_eq!(config.target_suffix.as_str(), ".anki21");
        assert_eq!(config.backup_marker, DEFAULT_BACKUP_MARKER);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_str_aliases() {
        let config = Configuration::from_json_str(
            r#"{"zip_path": "random_path.apkg", "deck_suffix": ".anki21", "backup_marker": ".bak"}"#,
        )
        .unwrap();
        assert_eq!(config.archive_path, PathBuf::from("random_path.apkg"));
        assert_eq!(config.target_suffix.as_str(), ".anki21");
        assert_eq!(config.backup_marker, ".bak");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_str_rejects_bad_input() {
        let err = Configuration::from_json_str(r#"{"archive_path": "deck.apkg", "target_suffix": "."}"#)
            .unwrap_err();
        assert!(err.is_config_error());

        let err = Configuration::from_json_str(
            r#"{"archive_path": "deck.apkg", "target_suffix": "anki21", "colour": "red"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Configuration::from_json_str("{").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_path_resolves_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"archive_path": "decks/deck.apkg", "target_suffix": "anki21", "scratch_root": "scratch"}"#,
        )
        .unwrap();

        let config = Configuration::from_json_path(&config_path).unwrap();
        assert_eq!(config.archive_path, dir.path().join("decks/deck.apkg"));
        assert_eq!(config.scratch_root, Some(dir.path().join("scratch")));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_path_missing_file() {
        let err = Configuration::from_json_path("/no/such/config.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
