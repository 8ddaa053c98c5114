//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for fsmc-cli.

use clap::Parser;
use std::path::PathBuf;

/// fsmc - compile procedural manuals into finite-state machines
#[derive(Parser, Debug, Clone)]
#[command(name = "fsmc-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Compile this manual text and exit
    #[arg(short = 't', long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Compile this manual file (.txt) and exit
    #[arg(short = 'f', long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Compiler service base URL (overrides settings and $FSMC_BACKEND_URL)
    #[arg(short = 'b', long)]
    pub backend_url: Option<String>,

    /// Request timeout in seconds, 0 to wait indefinitely (overrides settings)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the DOT source of a successful compile to this file
    #[arg(short = 'o', long)]
    pub dot_out: Option<PathBuf>,

    /// Check that the compiler service is reachable and exit
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub check: bool,

    /// Settings file (default: ~/.fsmc/settings.toml)
    #[arg(long, env = "FSMC_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Output events and views as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Only output the DOT source (errors still go to stderr)
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Whether a manual was given on the command line (one-shot mode).
    pub fn is_one_shot(&self) -> bool {
        self.text.is_some() || self.file.is_some()
    }
}
