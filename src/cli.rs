//! Command-line interface for the Bagel checker.

use std::path::PathBuf;

use bagel::driver::OutputFormat;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bagel")]
#[command(about = "Static checker for the Bagel language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Typecheck source files and report diagnostics
    Check {
        /// Files to check; their imports are loaded as needed
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
}
