use reqwest::Url;

use crate::error::{AppError, Context};

use super::FetchResult;

/// `{base}/quote/{SYM1,SYM2,...}?apikey=KEY`, each symbol percent-encoded on its own.
pub fn quote_url(base: &str, symbols: &[String], api_key: &str) -> FetchResult<Url> {
    if symbols.is_empty() {
        return Err(AppError::message("At least one symbol is required for a quote request"));
    }

    let joined = symbols
        .iter()
        .map(|symbol| urlencoding::encode(symbol))
        .collect::<Vec<_>>()
        .join(",");
    let mut url = endpoint(base, &["quote", joined.as_str()])?;
    url.query_pairs_mut().append_pair("apikey", api_key);
    Ok(url)
}

/// `{base}/historical-price-full/{SYM}?timeseries=DAYS&apikey=KEY`
pub fn history_url(base: &str, symbol: &str, days: u32, api_key: &str) -> FetchResult<Url> {
    let encoded = urlencoding::encode(symbol);
    let mut url = endpoint(base, &["historical-price-full", &*encoded])?;
    url.query_pairs_mut()
        .append_pair("timeseries", &days.to_string())
        .append_pair("apikey", api_key);
    Ok(url)
}

/// Append already-encoded `segments` to the path of `base`.
fn endpoint(base: &str, segments: &[&str]) -> FetchResult<Url> {
    let mut url =
        Url::parse(base).with_context(|| format!("Invalid vendor base URL: {base}"))?;

    if url.cannot_be_a_base() {
        return Err(AppError::message(format!(
            "Vendor base URL cannot take a path: {base}"
        )));
    }

    let path = format!("{}/{}", url.path().trim_end_matches('/'), segments.join("/"));
    url.set_path(&path);
    Ok(url)
}
