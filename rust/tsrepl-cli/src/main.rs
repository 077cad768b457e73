//! `ts-repl`: open a TypeScript file in a REPL with every top-level binding in scope.

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;
use tsrepl_cli::cli::{run, Cli};

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "TS_REPL_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    std::process::exit(run(cli));
}
