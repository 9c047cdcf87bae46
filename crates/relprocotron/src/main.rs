use anyhow::Result;
use clap::Parser;
use relprocotron::cli::{self, Cli};
use relprocotron::startup;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    startup::init_tracing(cli.log_level.as_deref());
    info!(version = %startup::version_string(), "Release Process-O-Tron starting");

    cli::execute(cli).await
}
