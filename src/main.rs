use anyhow::Result;
use clap::Parser;

use quote_gate::app;
use quote_gate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let status = app::run(cli).await?;
    if status != 0 {
        std::process::exit(status);
    }

    Ok(())
}
