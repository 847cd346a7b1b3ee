//! Command-line argument parsing for the quarry importer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Quarry command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "quarry", about = "Import a .construction file")]
pub struct CliArgs {
    /// Construction file to import.
    pub path: String,

    /// Dimension to import (defaults to the first one in the file).
    #[arg(long)]
    pub dimension: Option<String>,

    /// Print every block type found after the import.
    #[arg(long)]
    pub list_blocks: bool,

    /// Do not draw the progress line.
    #[arg(long)]
    pub no_progress: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dimension) = args.dimension {
            self.import.dimension = Some(dimension.clone());
        }
        if args.no_progress {
            self.import.show_progress = false;
        }
        if let Some(ref level) = args.log_level {
            self.log.level = level.clone();
        }
    }
}
