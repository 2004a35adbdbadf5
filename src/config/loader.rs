use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::{AppError, Context, Result};

use super::{validator, Config};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    cache_ttl_seconds: Option<u64>,
    rate_limit_per_minute: Option<u32>,
    monthly_quota_cap: Option<u32>,
    counter_path: Option<PathBuf>,
    symbols: Option<Vec<String>>,
    #[serde(default)]
    vendor: RawVendorConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVendorConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
    history_days: Option<u32>,
}

impl RawConfig {
    fn apply(self, config: &mut Config) {
        if let Some(ttl) = self.cache_ttl_seconds {
            config.cache_ttl_secs = ttl;
        }
        if let Some(rate) = self.rate_limit_per_minute {
            config.rate_per_minute = rate;
        }
        if let Some(cap) = self.monthly_quota_cap {
            config.monthly_cap = cap;
        }
        if let Some(path) = self.counter_path {
            config.counter_path = path;
        }
        if let Some(symbols) = self.symbols {
            config.symbols = symbols;
        }

        let vendor = self.vendor;
        if let Some(url) = vendor.base_url {
            config.vendor.base_url = url;
        }
        if let Some(key) = vendor.api_key {
            config.vendor.api_key = key;
        }
        if let Some(timeout) = vendor.timeout_seconds {
            config.vendor.timeout_secs = timeout;
        }
        if let Some(days) = vendor.history_days {
            config.vendor.history_days = days;
        }
    }
}

/// Build the effective configuration: builtin defaults, then the optional JSON file,
/// then environment variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => Config::builtin(),
    };

    apply_env_overrides(&mut config)?;
    validator::validate_config(&config)?;
    Ok(config)
}

/// Overlay the fields present in a JSON file on top of the builtin defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    let raw: RawConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;

    let mut config = Config::builtin();
    raw.apply(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ttl) = parse_var(&lookup, "CACHE_TTL_SECONDS")? {
        config.cache_ttl_secs = ttl;
    }
    if let Some(rate) = parse_var(&lookup, "RATE_LIMIT_PER_MINUTE")? {
        config.rate_per_minute = rate;
    }
    if let Some(cap) = parse_var(&lookup, "MONTHLY_QUOTA_CAP")? {
        config.monthly_cap = cap;
    }
    if let Some(path) = lookup("MONTHLY_COUNTER_PATH") {
        config.counter_path = PathBuf::from(path);
    }
    if let Some(url) = lookup("VENDOR_API_URL") {
        config.vendor.base_url = url;
    }
    if let Some(key) = lookup("VENDOR_API_KEY") {
        config.vendor.api_key = key;
    }
    if let Some(timeout) = parse_var(&lookup, "VENDOR_TIMEOUT_SECONDS")? {
        config.vendor.timeout_secs = timeout;
    }
    if let Some(list) = lookup("INDICES_SYMBOLS") {
        config.symbols = list
            .split(',')
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(String::from)
            .collect();
    }
    Ok(())
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::message(format!("{name} must be a whole number, got `{raw}`"))),
        None => Ok(None),
    }
}
