//! ssstash CLI - KMS-encrypted secrets in S3
//!
//! This is the main entry point for the ssstash command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.store.to_config();

    match cli.command {
        Commands::List => commands::list::run(&config).await,
        Commands::Put(args) => commands::put::run(args, &config).await,
        Commands::Get(args) => commands::get::run(args, &config).await,
        Commands::Delete(args) => commands::delete::run(args, &config).await,
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Logs go to stderr so `get` output on stdout stays byte-exact.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
