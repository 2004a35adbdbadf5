use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetch::{MarketPayload, VendorClient};
use crate::gate::{AdmissionGate, Admitted};
use crate::limits::QuotaStatus;
use crate::storage::{CounterStore, JsonFileStore};

pub const INDICES_KEY: &str = "indices";

/// Cache fingerprint for a symbol's price history.
pub fn history_key(symbol: &str) -> String {
    format!("history_{symbol}")
}

/// Market-data operations exposed to the front end, each routed through one shared gate.
#[derive(Debug)]
pub struct MarketService {
    gate: AdmissionGate<MarketPayload>,
    vendor: VendorClient,
    symbols: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl MarketService {
    pub fn new(
        gate: AdmissionGate<MarketPayload>,
        vendor: VendorClient,
        symbols: Vec<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate,
            vendor,
            symbols,
            clock,
        }
    }

    /// Production wiring: system clock and the JSON counter file named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = JsonFileStore::new(&config.counter_path);
        Self::with_store(config, Box::new(store), clock)
    }

    pub fn with_store(
        config: &Config,
        store: Box<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let vendor = VendorClient::new(&config.vendor)?;
        let gate = AdmissionGate::from_config(config, store, Arc::clone(&clock));
        Ok(Self::new(gate, vendor, config.symbols.clone(), clock))
    }

    pub fn gate(&self) -> &AdmissionGate<MarketPayload> {
        &self.gate
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub async fn indices(&self) -> Result<Admitted<MarketPayload>> {
        self.gate
            .handle(INDICES_KEY, move || async move {
                self.vendor
                    .fetch_indices(&self.symbols)
                    .await
                    .map(MarketPayload::Indices)
            })
            .await
    }

    pub async fn history(&self, symbol: &str) -> Result<Admitted<MarketPayload>> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AppError::message("symbol must not be empty"));
        }

        let key = history_key(symbol);
        self.gate
            .handle(&key, move || async move {
                self.vendor
                    .fetch_history(symbol, self.clock.as_ref())
                    .await
                    .map(MarketPayload::History)
            })
            .await
    }

    /// Request several histories concurrently. Repeated symbols are requested once; results
    /// follow the order in which each symbol first appears.
    pub async fn histories(&self, symbols: &[String]) -> Vec<Result<Admitted<MarketPayload>>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = symbols
            .iter()
            .map(|symbol| symbol.trim())
            .filter(|symbol| seen.insert(*symbol))
            .collect();

        join_all(unique.into_iter().map(|symbol| self.history(symbol))).await
    }

    pub fn quota(&self) -> QuotaStatus {
        self.gate.counter().status()
    }
}
