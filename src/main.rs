mod cli;
mod config;
mod error;
mod output;
mod query;
mod recipes;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting cistat - CI triage & duration statistics");
    cli.execute().await?;

    Ok(())
}
