use reqwest::Url;

use crate::error::{AppError, Result};

use super::{Config, MAX_CACHE_TTL_SECS};

/// Check every setting and report all problems at once.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    if config.cache_ttl_secs == 0 {
        issues.push("cache_ttl_seconds must be greater than zero".to_string());
    } else if config.cache_ttl_secs > MAX_CACHE_TTL_SECS {
        issues.push(format!(
            "cache_ttl_seconds must be at most {MAX_CACHE_TTL_SECS}"
        ));
    }
    if config.rate_per_minute == 0 {
        issues.push("rate_limit_per_minute must be greater than zero".to_string());
    }
    if config.monthly_cap == 0 {
        issues.push("monthly_quota_cap must be greater than zero".to_string());
    }
    if config.counter_path.as_os_str().is_empty() {
        issues.push("counter_path must not be empty".to_string());
    }

    validate_symbols(&config.symbols, &mut issues);

    let vendor = &config.vendor;
    if vendor.base_url.trim().is_empty() {
        issues.push("vendor.base_url must not be empty".to_string());
    } else if let Err(err) = Url::parse(&vendor.base_url) {
        issues.push(format!(
            "vendor.base_url `{}` is not a valid URL: {}",
            vendor.base_url, err
        ));
    }
    if vendor.timeout_secs == 0 {
        issues.push("vendor.timeout_seconds must be greater than zero".to_string());
    }
    if vendor.history_days == 0 {
        issues.push("vendor.history_days must be greater than zero".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "invalid configuration: {}",
            issues.join("; ")
        )))
    }
}

fn validate_symbols(symbols: &[String], issues: &mut Vec<String>) {
    if symbols.is_empty() {
        issues.push("symbols must list at least one entry".to_string());
        return;
    }

    if symbols.iter().any(|symbol| symbol.trim().is_empty()) {
        issues.push("symbols must not contain blank entries".to_string());
    }
}
