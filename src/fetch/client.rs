use std::time::Duration;

use reqwest::{Client, Url};

use crate::clock::Clock;
use crate::config::VendorConfig;
use crate::error::{AppError, Context, Result};

use super::{decode, fallback, request, FetchResult, PriceHistory, Quote, VendorResult};

/// HTTP client for the market-data vendor.
///
/// Every public fetch resolves to a [`VendorResult`]; network errors, timeouts, error
/// statuses and malformed bodies are logged and replaced with a fallback payload.
#[derive(Debug, Clone)]
pub struct VendorClient {
    client: Client,
    base_url: String,
    api_key: String,
    history_days: u32,
}

impl VendorClient {
    pub fn new(config: &VendorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to construct vendor HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            history_days: config.history_days,
        })
    }

    pub async fn fetch_indices(&self, symbols: &[String]) -> VendorResult<Vec<Quote>> {
        match self.try_fetch_indices(symbols).await {
            Ok(quotes) => VendorResult::Live(quotes),
            Err(err) => {
                log::warn!("[indices] upstream unavailable, returning fallback data: {err}");
                VendorResult::Fallback(fallback::indices())
            }
        }
    }

    pub async fn fetch_history(
        &self,
        symbol: &str,
        clock: &dyn Clock,
    ) -> VendorResult<PriceHistory> {
        match self.try_fetch_history(symbol).await {
            Ok(history) => VendorResult::Live(history),
            Err(err) => {
                log::warn!(
                    "[history {symbol}] upstream unavailable, returning fallback data: {err}"
                );
                VendorResult::Fallback(fallback::history(
                    symbol,
                    clock.now().date_naive(),
                    self.history_days,
                ))
            }
        }
    }

    async fn try_fetch_indices(&self, symbols: &[String]) -> FetchResult<Vec<Quote>> {
        let url = request::quote_url(&self.base_url, symbols, &self.api_key)?;
        let body = self.get_text(url, "indices").await?;
        decode::parse_quotes(&body)
    }

    async fn try_fetch_history(&self, symbol: &str) -> FetchResult<PriceHistory> {
        let url = request::history_url(&self.base_url, symbol, self.history_days, &self.api_key)?;
        let body = self.get_text(url, "history").await?;
        decode::parse_history(&body, symbol)
    }

    async fn get_text(&self, url: Url, label: &str) -> FetchResult<String> {
        // The query string carries the API key; keep it out of the logs.
        log::info!("[{label}] requesting {}", url.path());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("{label} request failed"))?;

        if !response.status().is_success() {
            return Err(AppError::message(format!(
                "{label} request failed with status {}",
                response.status()
            )));
        }

        Ok(response
            .text()
            .await
            .with_context(|| format!("Failed to read {label} body"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn vendor_at(base_url: &str) -> VendorClient {
        VendorClient::new(&VendorConfig {
            base_url: base_url.to_string(),
            api_key: "demo".to_string(),
            timeout_secs: 2,
            history_days: 30,
        })
        .expect("client builds")
    }

    fn unreachable_vendor() -> VendorClient {
        // Port 9 (discard) is not expected to accept HTTP on loopback.
        vendor_at("http://127.0.0.1:9/api/v3")
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap())
    }

    /// Answer a single HTTP request with `status` and `body`, returning the base URL and a
    /// handle resolving to the request line that was received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut received = Vec::new();
            let mut buf = [0_u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&received)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}/api/v3"), handle)
    }

    #[tokio::test]
    async fn unreachable_vendor_yields_fallback_indices() {
        let vendor = unreachable_vendor();
        let symbols = vec!["^GSPC".to_string()];

        let result = vendor.fetch_indices(&symbols).await;

        assert!(result.is_fallback());
        assert_eq!(result.data().len(), 4);
    }

    #[tokio::test]
    async fn unreachable_vendor_yields_fallback_history() {
        let vendor = unreachable_vendor();

        let result = vendor.fetch_history("ETHUSD", &clock()).await;

        assert!(result.is_fallback());
        let history = result.into_inner();
        assert_eq!(history.symbol, "ETHUSD");
        assert_eq!(history.historical.len(), 30);
    }

    #[tokio::test]
    async fn quote_array_is_live() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"symbol":"^GSPC","name":"S&P 500","price":5301.2,"changesPercentage":0.3}]"#,
        )
        .await;
        let vendor = vendor_at(&base);

        let result = vendor.fetch_indices(&["^GSPC".to_string()]).await;

        assert!(!result.is_fallback());
        assert_eq!(result.data().len(), 1);
        assert_eq!(result.data()[0].symbol, "^GSPC");
        assert!((result.data()[0].price - 5301.2).abs() < 1e-9);

        let request_line = server.await.expect("server task");
        assert!(
            request_line.starts_with("GET /api/v3/quote/%5EGSPC?apikey=demo "),
            "unexpected request line: {request_line}"
        );
    }

    #[tokio::test]
    async fn error_status_falls_back() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let vendor = vendor_at(&base);

        let result = vendor.fetch_indices(&["AAPL".to_string()]).await;

        assert!(result.is_fallback());
        assert_eq!(result.data().len(), 4);
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn malformed_quote_body_falls_back() {
        let (base, server) = serve_once("200 OK", r#"{"Error Message":"Invalid API KEY."}"#).await;
        let vendor = vendor_at(&base);

        let result = vendor.fetch_indices(&["AAPL".to_string()]).await;

        assert!(result.is_fallback());
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn history_payload_is_live() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"symbol":"ETHUSD","historical":[{"date":"2025-11-02","close":3850.5}]}"#,
        )
        .await;
        let vendor = vendor_at(&base);

        let result = vendor.fetch_history("ETHUSD", &clock()).await;

        assert!(!result.is_fallback());
        assert_eq!(result.data().historical.len(), 1);

        let request_line = server.await.expect("server task");
        assert!(
            request_line.contains("/historical-price-full/ETHUSD?timeseries=30&apikey=demo"),
            "unexpected request line: {request_line}"
        );
    }

    #[tokio::test]
    async fn history_without_points_falls_back() {
        let (base, server) = serve_once("200 OK", "{}").await;
        let vendor = vendor_at(&base);

        let result = vendor.fetch_history("NOPE", &clock()).await;

        assert!(result.is_fallback());
        assert_eq!(result.data().historical.len(), 30);
        server.await.expect("server task");
    }
}
