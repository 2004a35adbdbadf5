//! Hard monthly call quota that survives restarts.
//!
//! The counter reads the persisted record, rolls it over when the UTC month changed, and
//! writes the incremented record back before admitting the call. The whole read-check-write
//! runs under one lock, so concurrent callers in this process cannot both spend the last
//! unit of quota. Separate processes sharing the same file are not coordinated.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{CounterStore, MonthlyQuotaRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub month: String,
    pub count: u32,
    pub cap: u32,
    pub remaining: u32,
}

/// `YYYY-MM` for the UTC month containing `at`.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

#[derive(Debug)]
pub struct MonthlyCounter {
    store: Mutex<Box<dyn CounterStore>>,
    cap: u32,
    clock: Arc<dyn Clock>,
}

impl MonthlyCounter {
    pub fn new(store: Box<dyn CounterStore>, cap: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(store),
            cap,
            clock,
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Spend one unit of this month's quota if any is left.
    ///
    /// A denial does not touch storage. An allowed call is only reported once the
    /// incremented record has been saved.
    pub fn check_and_increment(&self) -> Result<QuotaDecision> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut record = self.current_record(&**store);

        if record.count >= self.cap {
            log::warn!(
                "monthly quota exhausted for {}: {} of {} calls used",
                record.month_key,
                record.count,
                self.cap
            );
            return Ok(QuotaDecision {
                allowed: false,
                remaining: 0,
            });
        }

        record.count += 1;
        store.save(&record)?;

        Ok(QuotaDecision {
            allowed: true,
            remaining: self.cap - record.count,
        })
    }

    /// Usage for the current month without writing anything.
    pub fn status(&self) -> QuotaStatus {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let record = self.current_record(&**store);

        QuotaStatus {
            remaining: self.cap.saturating_sub(record.count),
            month: record.month_key,
            count: record.count,
            cap: self.cap,
        }
    }

    fn current_record(&self, store: &dyn CounterStore) -> MonthlyQuotaRecord {
        let current = month_key(self.clock.now());
        match store.load() {
            Some(record) if record.month_key == current => record,
            Some(stale) => {
                log::info!(
                    "monthly counter rolled over from {} to {}",
                    stale.month_key,
                    current
                );
                MonthlyQuotaRecord::fresh(current)
            }
            None => MonthlyQuotaRecord::fresh(current),
        }
    }
}
