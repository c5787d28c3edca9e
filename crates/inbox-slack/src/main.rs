mod cli;

use clap::Parser;

use crate::cli::{Cli, run_cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared::env::load_optional_env_files();
    shared::logging::configure_logging()?;

    let cli = Cli::parse();

    run_cli(cli).await
}
