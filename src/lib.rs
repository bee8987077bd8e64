//! # zipsession
//!
//! Scoped, in-place editing of one file inside a zip package.
//!
//! Formats such as Anki's `.apkg` are plain zip archives that carry a single
//! interesting file (`collection.anki21`) next to media and metadata. This
//! crate extracts such a package into a private scratch directory, hands
//! out the path of that file, and on close rebuilds the package if, and only
//! if, the file was modified. The original is kept as a backup.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zipsession::{Configuration, Result, Session, SessionOutcome};
//!
//! fn main() -> Result<()> {
//!     let config = Configuration::new("deck.apkg", "anki21")?;
//!     let mut session = Session::open(&config)?;
//!
//!     // Edit the extracted file with any tool
//!     println!("editing {}", session.target_path().display());
//!     std::fs::write(session.target_path(), b"new database")?;
//!
//!     match session.close()? {
//!         SessionOutcome::Repacked { backup_path, result } => {
//!             println!(
//!                 "wrote {} entries, original at {}",
//!                 result.entries_written,
//!                 backup_path.display()
//!             );
//!         }
//!         SessionOutcome::Unchanged => println!("nothing to do"),
//!         SessionOutcome::AlreadyClosed => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Scoped Sessions
//!
//! [`Session::run`] closes the session when the closure succeeds and
//! discards it when the closure fails:
//!
//! ```rust,no_run
//! use zipsession::{Configuration, Session};
//!
//! let config = Configuration::new("deck.apkg", "anki21")?
//!     .backup_marker(".bak");
//! let (len, outcome) = Session::run(&config, |session| {
//!     Ok(std::fs::metadata(session.target_path())?.len())
//! })?;
//! println!("{} bytes, repacked: {}", len, outcome.is_repacked());
//! # Ok::<(), zipsession::Error>(())
//! ```
//!
//! ## Change Detection
//!
//! A session counts as modified when the target's modification time is
//! newer than it was right after extraction. Other files in the workspace
//! are repacked as they are, but changing only them does not trigger a
//! repack.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `json` | Yes | Load a [`Configuration`] from JSON |
//! | `cli` | No | The `zipsession` command-line tool |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod compression;
pub mod config;
pub mod error;
pub mod repack;
pub mod safety;
pub mod session;
pub mod timestamp;

pub use archive_path::ArchivePath;
pub use compression::{Compression, DEFAULT_DEFLATE_LEVEL};
pub use config::{Configuration, DEFAULT_BACKUP_MARKER, TargetSuffix};
pub use error::{Error, Result};
pub use repack::{RepackResult, Repacker, WorkspaceFile};
pub use safety::validate_extract_path;
pub use session::{ExtractedEntry, Session, SessionOutcome, TargetEntry};
