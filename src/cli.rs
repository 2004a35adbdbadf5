use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quote-gate")]
#[command(about = "Cached, rate-limited and quota-capped access to a market-data vendor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON file overriding the builtin settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Latest quotes for the configured index symbols
    Indices,

    /// 30-day price history for one or more symbols
    History {
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Upstream calls used this month
    Quota,

    /// Read commands from stdin, sharing one cache and limiter across them
    Interactive,
}
