//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use zip::ZipArchive;
use zipsession::{Configuration, Error, Session};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{ListedEntry, create_formatter};
use crate::{INTERRUPTED, OutputFormat};

/// How often a pending Enter prompt checks for Ctrl+C.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the edit command.
pub struct EditConfig<'a> {
    pub archive: Option<&'a Path>,
    pub suffix: Option<&'a str>,
    pub config_file: Option<&'a Path>,
    pub editor: Option<String>,
    pub scratch_dir: Option<&'a Path>,
    pub marker: Option<&'a str>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Edit command implementation
pub fn edit(config: &EditConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let settings = match build_configuration(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let mut session = match Session::open(&settings) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening {}: {}", settings.archive_path.display(), e);
            return error_to_exit_code(&e);
        }
    };

    if !config.quiet {
        print!("{}", formatter.format_opened(&session));
    }

    let finished = match resolve_editor(config.editor.clone()) {
        Some(editor) => run_editor(&editor, session.target_path()),
        None => wait_for_enter(config.quiet),
    };

    if let Err(message) = finished {
        eprintln!("Error: {}", message);
        return discard(session, ExitCode::FatalError);
    }
    if INTERRUPTED.load(Ordering::SeqCst) {
        eprintln!("Interrupted, discarding edits");
        return discard(session, ExitCode::UserInterrupt);
    }

    match session.close() {
        Ok(outcome) => {
            if !config.quiet || config.format == OutputFormat::Json {
                print!("{}", formatter.format_outcome(&settings.archive_path, &outcome));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error closing session: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// List command implementation
pub fn list(archive_path: &Path, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    let entries = match read_entries(archive_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error opening archive: {}", e);
            return error_to_exit_code(&e);
        }
    };

    // Quiet human output is one name per line, without header or totals
    if quiet && format == OutputFormat::Human {
        for entry in entries.iter().filter(|e| !e.is_directory) {
            println!("{}", entry.name);
        }
    } else {
        print!("{}", formatter.format_list(&entries));
    }
    ExitCode::Success
}

fn build_configuration(config: &EditConfig<'_>) -> zipsession::Result<Configuration> {
    let mut settings = match (config.config_file, config.archive, config.suffix) {
        (Some(file), _, _) => Configuration::from_json_path(file)?,
        (None, Some(archive), Some(suffix)) => Configuration::new(archive, suffix)?,
        _ => {
            return Err(Error::InvalidConfig(
                "either --config or an archive with --suffix is required".to_string(),
            ));
        }
    };

    if let Some(dir) = config.scratch_dir {
        settings = settings.scratch_root(dir);
    }
    if let Some(marker) = config.marker {
        settings = settings.backup_marker(marker);
    }
    Ok(settings)
}

fn read_entries(archive_path: &Path) -> zipsession::Result<Vec<ListedEntry>> {
    if !archive_path.is_file() {
        return Err(Error::ArchiveNotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index)?;
        entries.push(ListedEntry {
            name: file.name().trim_end_matches('/').to_string(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            method: format!("{:?}", file.compression()),
            modified: file.last_modified(),
            is_directory: file.is_dir(),
        });
    }
    Ok(entries)
}

/// Picks the editor from the flag, then `$VISUAL`, then `$EDITOR`.
fn resolve_editor(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|cmd| !cmd.trim().is_empty())
}

fn run_editor(editor: &str, target: &Path) -> Result<(), String> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| "editor command is empty".to_string())?;

    let status = Command::new(program)
        .args(parts)
        .arg(target)
        .status()
        .map_err(|e| format!("failed to start editor '{}': {}", program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("editor exited with {}, discarding edits", status))
    }
}

fn wait_for_enter(quiet: bool) -> Result<(), String> {
    if !quiet {
        eprint!("Edit the file, then press Enter to finish (Ctrl+C discards)...");
        io::stderr().flush().ok();
    }

    // The handler does not interrupt a blocking read, so stdin is read on
    // its own thread while this one watches the flag
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line).map(|_| ());
        tx.send(read).ok();
    });

    loop {
        if INTERRUPTED.load(Ordering::SeqCst) {
            eprintln!();
            return Ok(());
        }
        match rx.recv_timeout(INTERRUPT_POLL_INTERVAL) {
            Ok(read) => return read.map_err(|e| format!("failed to read from stdin: {}", e)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err("stdin reader stopped unexpectedly".to_string());
            }
        }
    }
}

fn discard(session: Session, code: ExitCode) -> ExitCode {
    let workspace: PathBuf = session.workspace().to_path_buf();
    match session.discard() {
        Ok(()) => code,
        Err(e) => {
            eprintln!("Error removing {}: {}", workspace.display(), e);
            error_to_exit_code(&e)
        }
    }
}
