//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;
use std::time::UNIX_EPOCH;
use zipsession::{Session, SessionOutcome, timestamp};

/// One row of `zipsession list`.
pub struct ListedEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub method: String,
    pub modified: Option<zip::DateTime>,
    pub is_directory: bool,
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[ListedEntry]) -> String;

    /// Formats the state of a freshly opened session
    fn format_opened(&self, session: &Session) -> String;

    /// Formats the result of closing a session
    fn format_outcome(&self, archive: &Path, outcome: &SessionOutcome) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[ListedEntry]) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{:>12} {:>12} {:>10} {:>19} {}\n",
            "Size", "Packed", "Method", "Modified", "Name"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let (size_str, packed_str) = if entry.is_directory {
                dir_count += 1;
                (String::new(), String::new())
            } else {
                file_count += 1;
                total_size += entry.size;
                (
                    humanize_bytes(entry.size),
                    humanize_bytes(entry.compressed_size),
                )
            };

            let mtime_str = entry
                .modified
                .map(format_datetime)
                .unwrap_or_else(|| "-".to_string());

            output.push_str(&format!(
                "{:>12} {:>12} {:>10} {:>19} {}{}\n",
                size_str,
                packed_str,
                entry.method,
                mtime_str,
                entry.name,
                if entry.is_directory { "/" } else { "" }
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_opened(&self, session: &Session) -> String {
        format!(
            "Editing {} from {}\n  file:        {}\n  compression: {}\n",
            session.target_name(),
            session.archive_path().display(),
            session.target_path().display(),
            session.compression()
        )
    }

    fn format_outcome(&self, archive: &Path, outcome: &SessionOutcome) -> String {
        match outcome {
            SessionOutcome::Unchanged => {
                format!("No changes, {} left untouched\n", archive.display())
            }
            SessionOutcome::Repacked {
                backup_path,
                result,
            } => format!(
                "Repacked {} ({} entries, {})\n  backup: {}\n",
                archive.display(),
                result.entries_written,
                humanize_bytes(result.compressed_size),
                backup_path.display()
            ),
            SessionOutcome::AlreadyClosed => String::new(),
        }
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[ListedEntry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "size": e.size,
                    "compressed_size": e.compressed_size,
                    "method": e.method,
                    "modified": e.modified.and_then(unix_seconds),
                    "is_directory": e.is_directory,
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_opened(&self, session: &Session) -> String {
        let obj = json!({
            "archive": session.archive_path().display().to_string(),
            "target": session.target_name().as_str(),
            "path": session.target_path().display().to_string(),
            "workspace": session.workspace().display().to_string(),
            "compression": session.compression().to_string(),
            "entries": session.entries().len(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_outcome(&self, archive: &Path, outcome: &SessionOutcome) -> String {
        let obj = match outcome {
            SessionOutcome::Repacked {
                backup_path,
                result,
            } => json!({
                "archive": archive.display().to_string(),
                "repacked": true,
                "backup": backup_path.display().to_string(),
                "entries_written": result.entries_written,
                "total_bytes": result.total_bytes,
                "compressed_size": result.compressed_size,
            }),
            _ => json!({
                "archive": archive.display().to_string(),
                "repacked": false,
            }),
        };

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Formats a zip timestamp as `YYYY-MM-DD HH:MM:SS`
pub fn format_datetime(dt: zip::DateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

fn unix_seconds(dt: zip::DateTime) -> Option<u64> {
    timestamp::from_zip_datetime(dt)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}
