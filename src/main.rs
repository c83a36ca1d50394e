use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{dispatch, Cli};

/// Environment variable holding the log filter, e.g. `SRCBUILD_LOG=srcbuild=debug`
const LOG_ENV: &str = "SRCBUILD_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Build output goes to stdout; keep diagnostics on stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    dispatch(cli.command)
}
