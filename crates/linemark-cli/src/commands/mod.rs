//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod blame;
pub mod body;
pub mod completions;
pub mod moved;
pub mod show;
pub mod status;
pub mod utils;
pub mod version;

/// linemark - file state, history and per-line blame from your version control.
#[derive(Debug, Parser)]
#[command(name = "linemark", version, about)]
pub struct Cli {
    /// Path to the config file (defaults to <config dir>/linemark/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug diagnostics.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show repository root, branch, user and modified files.
    Status {
        /// Directory inside the repository (defaults to the current one).
        path: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a file's content at a revision.
    Show {
        file: PathBuf,

        /// Revision to read from; `:0` is the index.
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Encoding the file is stored in (defaults to the configured one).
        #[arg(long)]
        encoding: Option<String>,
    },

    /// Show who last changed a line.
    Blame {
        file: PathBuf,

        /// Line number (1-indexed).
        line: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report whether a file has a staged rename.
    Moved { file: PathBuf },

    /// Print a commit message without its file list.
    Body {
        /// Any file inside the repository.
        file: PathBuf,

        commit: String,
    },

    /// Print the backend program's version.
    Version,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
