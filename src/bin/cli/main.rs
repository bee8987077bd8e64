//! CLI tool for editing a single file inside a zip package.

mod commands;
mod exit_codes;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use exit_codes::ExitCode;

/// Set by the Ctrl+C handler; an interrupted edit is discarded.
pub static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Edit one file inside a zip package and repack it only if it changed
#[derive(Parser)]
#[command(name = "zipsession")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress informational output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a package, edit its target file, and repack on change (alias: e)
    #[command(alias = "e")]
    Edit {
        /// Package to edit
        #[arg(required_unless_present = "config", conflicts_with = "config")]
        archive: Option<PathBuf>,

        /// Suffix of the entry to edit (e.g. anki21)
        #[arg(short = 's', long, required_unless_present = "config", conflicts_with = "config")]
        suffix: Option<String>,

        /// JSON configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Editor command (defaults to $VISUAL, then $EDITOR)
        #[arg(long)]
        editor: Option<String>,

        /// Directory to create the scratch workspace in
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Text inserted before the extension to name the backup
        #[arg(long)]
        marker: Option<String>,
    },

    /// List package contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Package to list
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    // An editor child receives the same SIGINT; the session is discarded
    // once it returns
    ctrlc::set_handler(move || {
        INTERRUPTED.store(true, Ordering::SeqCst);
    })
    .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::BadArgs
            } else {
                ExitCode::Success
            };
            e.print().ok();
            std::process::exit(code.code());
        }
    };

    let exit_code = match cli.command {
        Commands::Edit {
            archive,
            suffix,
            config,
            editor,
            scratch_dir,
            marker,
        } => commands::edit(&commands::EditConfig {
            archive: archive.as_deref(),
            suffix: suffix.as_deref(),
            config_file: config.as_deref(),
            editor,
            scratch_dir: scratch_dir.as_deref(),
            marker: marker.as_deref(),
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::List { archive } => commands::list(&archive, cli.format, cli.quiet),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
