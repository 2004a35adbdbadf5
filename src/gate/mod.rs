//! Admission control in front of the vendor.
//!
//! Per request, in order: cache lookup (free), per-minute token bucket, monthly quota,
//! then the upstream fetch. Whatever the fetch returns, live or fallback, is cached under
//! the request key for the configured TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::cache::ExpiringCache;
use crate::clock::Clock;
use crate::config::{Config, MAX_CACHE_TTL_SECS};
use crate::error::{AppError, Result};
use crate::fetch::VendorResult;
use crate::limits::{MonthlyCounter, TokenBucket};
use crate::storage::CounterStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Live,
}

/// A successful admission: where the data came from and the vendor outcome itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Admitted<T> {
    pub source: Source,
    pub data: VendorResult<T>,
}

impl<T: Serialize> Serialize for Admitted<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Admitted", 3)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("fallback", &self.data.is_fallback())?;
        state.serialize_field("data", self.data.data())?;
        state.end()
    }
}

#[derive(Debug)]
pub struct AdmissionGate<T> {
    cache: ExpiringCache<VendorResult<T>>,
    bucket: TokenBucket,
    counter: MonthlyCounter,
}

impl<T: Clone> AdmissionGate<T> {
    pub fn new(
        cache: ExpiringCache<VendorResult<T>>,
        bucket: TokenBucket,
        counter: MonthlyCounter,
    ) -> Self {
        Self {
            cache,
            bucket,
            counter,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Box<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = chrono::Duration::from_std(StdDuration::from_secs(config.cache_ttl_secs))
            .unwrap_or_else(|_| chrono::Duration::seconds(MAX_CACHE_TTL_SECS as i64));
        Self::new(
            ExpiringCache::new(ttl, Arc::clone(&clock)),
            TokenBucket::per_minute(config.rate_per_minute, Arc::clone(&clock)),
            MonthlyCounter::new(store, config.monthly_cap, clock),
        )
    }

    pub fn cache(&self) -> &ExpiringCache<VendorResult<T>> {
        &self.cache
    }

    pub fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }

    pub fn counter(&self) -> &MonthlyCounter {
        &self.counter
    }

    /// Serve `key` from cache, or spend one token and one unit of monthly quota to run
    /// `fetcher` and cache its result.
    ///
    /// Quota is charged per attempt: a fetch that ends in fallback still counts.
    pub async fn handle<F, Fut>(&self, key: &str, fetcher: F) -> Result<Admitted<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VendorResult<T>>,
    {
        if let Some(hit) = self.cache.get(key) {
            log::debug!("cache hit for `{key}`");
            return Ok(Admitted {
                source: Source::Cache,
                data: hit,
            });
        }

        if !self.bucket.take(1.0) {
            log::info!("per-minute limit reached, rejecting `{key}`");
            return Err(AppError::RateLimited);
        }

        let quota = self.counter.check_and_increment()?;
        if !quota.allowed {
            return Err(AppError::QuotaExceeded {
                cap: self.counter.cap(),
            });
        }
        log::debug!(
            "admitted `{key}`, {} upstream calls left this month",
            quota.remaining
        );

        let data = fetcher().await;
        if data.is_fallback() {
            log::warn!("caching fallback payload for `{key}`");
        }
        self.cache.set(key, data.clone());

        Ok(Admitted {
            source: Source::Live,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Harness {
        clock: Arc<ManualClock>,
        gate: AdmissionGate<String>,
        calls: AtomicUsize,
    }

    impl Harness {
        fn new(rate_per_minute: u32, monthly_cap: u32) -> Self {
            let clock = Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2025, 11, 3, 9, 30, 0).unwrap(),
            ));
            let mut config = Config::builtin();
            config.rate_per_minute = rate_per_minute;
            config.monthly_cap = monthly_cap;

            let gate =
                AdmissionGate::from_config(&config, Box::new(MemoryStore::new()), clock.clone());
            Self {
                clock,
                gate,
                calls: AtomicUsize::new(0),
            }
        }

        async fn live(&self, key: &str) -> Result<Admitted<String>> {
            self.gate
                .handle(key, move || async move {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    VendorResult::Live(format!("{key}-payload"))
                })
                .await
        }

        async fn failing(&self, key: &str) -> Result<Admitted<String>> {
            self.gate
                .handle(key, move || async move {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    VendorResult::Fallback("synthetic".to_string())
                })
                .await
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache_for_free() {
        let h = Harness::new(20, 500);

        let first = h.live("indices").await.unwrap();
        assert_eq!(first.source, Source::Live);
        assert_eq!(first.data, VendorResult::Live("indices-payload".to_string()));

        let tokens_after_first = h.gate.bucket().snapshot().tokens;
        let quota_after_first = h.gate.counter().status();

        let second = h.live("indices").await.unwrap();
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.data, first.data);
        assert_eq!(h.calls(), 1);
        assert_eq!(h.gate.bucket().snapshot().tokens, tokens_after_first);
        assert_eq!(h.gate.counter().status(), quota_after_first);
        assert_eq!(quota_after_first.count, 1);
    }

    #[tokio::test]
    async fn rate_limit_is_checked_before_quota() {
        let h = Harness::new(1, 500);

        h.live("indices").await.unwrap();
        let err = h.live("history_AAPL").await.expect_err("bucket is empty");

        assert!(matches!(err, AppError::RateLimited));
        assert_eq!(h.calls(), 1);
        assert_eq!(h.gate.counter().status().count, 1, "denied call must not spend quota");
    }

    #[tokio::test]
    async fn quota_exhaustion_blocks_the_fetch() {
        let h = Harness::new(20, 1);

        h.live("indices").await.unwrap();
        let err = h.live("history_AAPL").await.expect_err("quota is spent");

        assert!(matches!(err, AppError::QuotaExceeded { cap: 1 }));
        assert!(err.is_throttled());
        assert_eq!(h.calls(), 1);
    }

    #[tokio::test]
    async fn fallback_is_cached_and_still_costs_quota() {
        let h = Harness::new(20, 500);

        let first = h.failing("history_ETHUSD").await.unwrap();
        assert_eq!(first.source, Source::Live);
        assert!(first.data.is_fallback());
        assert_eq!(h.gate.counter().status().count, 1);

        let second = h.failing("history_ETHUSD").await.unwrap();
        assert_eq!(second.source, Source::Cache);
        assert!(second.data.is_fallback());
        assert_eq!(h.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_goes_back_upstream() {
        let h = Harness::new(20, 500);

        h.live("indices").await.unwrap();
        h.clock.advance(Duration::seconds(91));
        let again = h.live("indices").await.unwrap();

        assert_eq!(again.source, Source::Live);
        assert_eq!(h.calls(), 2);
        assert_eq!(h.gate.counter().status().count, 2);
    }

    #[test]
    fn serializes_source_fallback_flag_and_data() {
        let admitted = Admitted {
            source: Source::Cache,
            data: VendorResult::Fallback(vec![1, 2]),
        };

        let json = serde_json::to_value(&admitted).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "source": "cache", "fallback": true, "data": [1, 2] })
        );
    }
}
