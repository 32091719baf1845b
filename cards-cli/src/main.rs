//! Binary crate for the `cards` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and selection
//! - Human-friendly output of card view-state

use clap::Parser;

mod cli;
mod display;
mod log;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    log::init_logging(cmd.verbose);

    let result = cmd.run().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "cards failed");
    }
    result
}
