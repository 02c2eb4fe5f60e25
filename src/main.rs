//! Bagel checker CLI entry point.

mod cli;

use std::io::IsTerminal;

use bagel::BagelDatabaseImpl;
use bagel::driver::check_paths;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BAGEL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { files, format } => {
            let db = BagelDatabaseImpl::default();
            let mut stdout = std::io::stdout().lock();
            let color = std::io::stdout().is_terminal();
            match check_paths(&db, &files, format, color, &mut stdout) {
                Ok(summary) if summary.errors == 0 => {
                    tracing::info!(files = summary.files, "no errors");
                }
                Ok(summary) => {
                    eprintln!(
                        "{} error(s) in {} file(s)",
                        summary.errors, summary.files
                    );
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error writing diagnostics: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
