//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Directory scanned by `ingest-dir` when none is given.
pub const DEFAULT_SAMPLE_DIR: &str = "Data_Engineering/Bronze_Raw";

/// Write letters in the style of your own past writing.
#[derive(Debug, Parser)]
#[command(name = "inkwell", version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Store a single writing sample.
    IngestText {
        /// The sample text.
        text: String,

        /// Value of the sample's `source` tag.
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// Store every .txt/.jpg/.jpeg/.png file in a directory.
    IngestDir {
        /// Directory holding the samples.
        #[arg(default_value = DEFAULT_SAMPLE_DIR)]
        dir: PathBuf,
    },

    /// Write a letter for a request.
    Generate {
        /// What the letter should say.
        prompt: String,

        /// Do not store the generated letter as a new sample.
        #[arg(long)]
        no_learn: bool,
    },

    /// Show the store size and active backends.
    Stats,
}

impl Command {
    /// Whether the command calls the generation backend.
    pub fn needs_provider(&self) -> bool {
        !matches!(self, Self::Stats)
    }
}
