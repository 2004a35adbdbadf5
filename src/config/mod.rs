use std::path::PathBuf;

mod loader;
mod validator;

pub use loader::{apply_env_overrides, load_config, load_config_file};
pub use validator::validate_config;

pub const DEFAULT_VENDOR_URL: &str = "https://financialmodelingprep.com/api/v3";
pub const DEFAULT_COUNTER_FILE: &str = "monthlyCounter.json";
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Connection details for the upstream market-data vendor.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Lookback window requested for price history.
    pub history_days: u32,
}

/// Immutable settings consumed by the admission gate and the vendor client.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_ttl_secs: u64,
    pub rate_per_minute: u32,
    pub monthly_cap: u32,
    pub counter_path: PathBuf,
    pub symbols: Vec<String>,
    pub vendor: VendorConfig,
}

impl Config {
    pub fn builtin() -> Self {
        let symbols = ["^GSPC", "^IXIC", "BTCUSD", "ETHUSD"]
            .into_iter()
            .map(String::from)
            .collect();

        Config {
            cache_ttl_secs: 90,
            rate_per_minute: 20,
            monthly_cap: 500,
            counter_path: PathBuf::from(DEFAULT_COUNTER_FILE),
            symbols,
            vendor: VendorConfig {
                base_url: DEFAULT_VENDOR_URL.to_string(),
                api_key: "demo".to_string(),
                timeout_secs: 10,
                history_days: 30,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}
