//! Exit codes for the CLI tool.

use zipsession::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Package is missing or not a valid zip
pub const BAD_ARCHIVE: i32 = 3;
/// Package has no entry with the requested suffix
pub const TARGET_NOT_FOUND: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Backup location already taken
pub const BACKUP_EXISTS: i32 = 6;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    TargetNotFound,
    IoError,
    BackupExists,
    UserInterrupt,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::TargetNotFound => TARGET_NOT_FOUND,
            Self::IoError => IO_ERROR,
            Self::BackupExists => BACKUP_EXISTS,
            Self::UserInterrupt => USER_INTERRUPT,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a zipsession error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) | Error::Cleanup { .. } => ExitCode::IoError,
        Error::InvalidFormat(_) | Error::ArchiveNotFound { .. } => ExitCode::BadArchive,
        Error::TargetNotFound { .. } => ExitCode::TargetNotFound,
        Error::BackupExists { .. } => ExitCode::BackupExists,
        Error::PathTraversal { .. } | Error::EntryExists { .. } => ExitCode::FatalError,
        Error::InvalidArchivePath(_) => ExitCode::FatalError,
        Error::InvalidConfig(_) | Error::InvalidCompressionLevel { .. } => ExitCode::BadArgs,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
