use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Context};

use super::FetchResult;

/// One row of the vendor's quote array. Fields the gate does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub changes_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    pub symbol: String,
    pub historical: Vec<PricePoint>,
}

/// The quote endpoint must answer with a JSON array of quote records.
pub fn parse_quotes(body: &str) -> FetchResult<Vec<Quote>> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Failed to parse quote JSON")?;

    if !value.is_array() {
        return Err(AppError::message("Quote payload is not an array"));
    }

    Ok(serde_json::from_value(value).context("Quote payload has malformed records")?)
}

/// The history endpoint must answer with an object holding a `historical` array.
pub fn parse_history(body: &str, symbol: &str) -> FetchResult<PriceHistory> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Failed to parse history JSON")?;

    if !value.get("historical").is_some_and(|h| h.is_array()) {
        return Err(AppError::message(format!(
            "History payload for {symbol} has no `historical` array"
        )));
    }

    let mut history: PriceHistory = serde_json::from_value(value)
        .with_context(|| format!("History payload for {symbol} has malformed points"))?;

    if history.symbol.is_empty() {
        history.symbol = symbol.to_string();
    }
    Ok(history)
}
