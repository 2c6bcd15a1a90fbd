//! Binary crate for the `cityweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly table output
//! - Printing AI condition summaries and advisories

use clap::Parser;

mod advice;
mod cli;
mod logger;
mod table;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logger::init(cmd.verbose)?;
    cmd.run().await
}
