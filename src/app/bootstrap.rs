use crate::app::controller::{AppController, Command};
use crate::cli::{Cli, Commands};
use crate::config::load_config;
use crate::error::Result;
use crate::services::MarketService;

/// Entry point used by `main`. Returns the process exit status.
pub async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    log::info!(
        "cache ttl {}s, {} calls/minute, {} calls/month, counter at {}",
        config.cache_ttl_secs,
        config.rate_per_minute,
        config.monthly_cap,
        config.counter_path.display()
    );

    let service = MarketService::from_config(&config)?;
    let controller = AppController::new(service);

    let command = match cli.command {
        Commands::Indices => Command::Indices,
        Commands::History { symbols } => Command::History(symbols),
        Commands::Quota => Command::Quota,
        Commands::Interactive => {
            controller.run_interactive().await?;
            return Ok(0);
        }
    };

    let mut status = 0;
    for reply in controller.execute(command).await {
        println!("{}", reply.render());
        if !reply.is_ok() {
            status = 1;
        }
    }
    Ok(status)
}
