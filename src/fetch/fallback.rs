//! Synthetic payloads served when the vendor cannot be reached.

use chrono::{Duration, NaiveDate};
use rand::Rng;

use super::{PriceHistory, PricePoint, Quote};

const FALLBACK_CLOSE_BASE: f64 = 5000.0;
const FALLBACK_CLOSE_SPREAD: f64 = 100.0;

/// Fixed snapshot of the default index symbols.
pub fn indices() -> Vec<Quote> {
    [
        ("^GSPC", "S&P 500", 5230.54, 0.45),
        ("^IXIC", "NASDAQ", 16840.21, -0.21),
        ("BTCUSD", "Bitcoin", 68400.55, 1.2),
        ("ETHUSD", "Ethereum", 3850.87, -0.8),
    ]
    .into_iter()
    .map(|(symbol, name, price, change)| Quote {
        symbol: symbol.to_string(),
        name: Some(name.to_string()),
        price,
        changes_percentage: Some(change),
    })
    .collect()
}

/// `days` daily points ending on `today`, newest first, with random closes.
pub fn history(symbol: &str, today: NaiveDate, days: u32) -> PriceHistory {
    let mut rng = rand::rng();
    let historical = (0..days)
        .map(|offset| PricePoint {
            date: today - Duration::days(i64::from(offset)),
            close: FALLBACK_CLOSE_BASE + rng.random_range(0.0..FALLBACK_CLOSE_SPREAD),
        })
        .collect();

    PriceHistory {
        symbol: symbol.to_string(),
        historical,
    }
}
