//! Compression settings captured from, and applied to, zip entries.
//!
//! Zip records the compression *method* per entry but not the level. For
//! deflate, bits 1 and 2 of the general purpose flag carry a coarse hint of
//! the level the writer used; [`Compression::from_entry`] reads that hint so
//! a repacked package is compressed the way the original was.

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::{Error, Result};

/// Deflate level used when an entry carries no usable level hint.
pub const DEFAULT_DEFLATE_LEVEL: u32 = 8;

/// Deflate level written by "maximum" compressors (flag bits `01`).
const MAXIMUM_DEFLATE_LEVEL: u32 = 9;

/// Deflate level written by "fast" compressors (flag bits `10`).
const FAST_DEFLATE_LEVEL: u32 = 2;

/// Deflate level written by "super fast" compressors (flag bits `11`).
const SUPER_FAST_DEFLATE_LEVEL: u32 = 1;

/// How entries are compressed when a package is repacked.
///
/// # Example
///
/// ```rust
/// use zipsession::Compression;
///
/// assert_eq!(Compression::default(), Compression::Deflated { level: 8 });
/// assert!(Compression::deflated(9).is_ok());
/// assert!(Compression::deflated(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Entries are stored without compression.
    Stored,
    /// Entries are deflated with the given level (1-9).
    Deflated {
        /// Deflate level.
        level: u32,
    },
}

impl Default for Compression {
    fn default() -> Self {
        Self::Deflated {
            level: DEFAULT_DEFLATE_LEVEL,
        }
    }
}

impl Compression {
    /// Creates a deflate setting, validating the level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] unless `level` is in `1..=9`.
    /// Use [`Compression::Stored`] for uncompressed entries.
    pub fn deflated(level: u32) -> Result<Self> {
        if (1..=9).contains(&level) {
            Ok(Self::Deflated { level })
        } else {
            Err(Error::InvalidCompressionLevel { level })
        }
    }

    /// Derives the setting from an entry's method and general purpose flags.
    ///
    /// Methods other than stored and deflated fall back to the default
    /// deflate level, since deflate is the family the package format uses.
    pub fn from_entry(method: CompressionMethod, flags: u16) -> Self {
        match method {
            CompressionMethod::Stored => Self::Stored,
            CompressionMethod::Deflated => {
                let level = match (flags >> 1) & 0b11 {
                    0b01 => MAXIMUM_DEFLATE_LEVEL,
                    0b10 => FAST_DEFLATE_LEVEL,
                    0b11 => SUPER_FAST_DEFLATE_LEVEL,
                    _ => DEFAULT_DEFLATE_LEVEL,
                };
                Self::Deflated { level }
            }
            other => {
                log::debug!(
                    "Entry uses {:?}, repacking with deflate level {}",
                    other,
                    DEFAULT_DEFLATE_LEVEL
                );
                Self::default()
            }
        }
    }

    /// Returns the deflate level, or 0 for stored entries.
    pub fn level(&self) -> u32 {
        match self {
            Self::Stored => 0,
            Self::Deflated { level } => *level,
        }
    }

    /// Returns the zip compression method for this setting.
    pub fn method(&self) -> CompressionMethod {
        match self {
            Self::Stored => CompressionMethod::Stored,
            Self::Deflated { .. } => CompressionMethod::Deflated,
        }
    }

    /// Builds zip writer options for this setting.
    pub fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().compression_method(self.method());
        match self {
            Self::Stored => options.compression_level(None),
            Self::Deflated { level } => options.compression_level(Some(i64::from(*level))),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored => write!(f, "stored"),
            Self::Deflated { level } => write!(f, "deflate (level {})", level),
        }
    }
}
