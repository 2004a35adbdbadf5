use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::clock::Clock;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucketState {
    pub capacity: f64,
    /// Always within `0..=capacity`.
    pub tokens: f64,
    pub refill_per_second: f64,
    pub last_refill_at: DateTime<Utc>,
}

/// Smoothing limiter that refills its full capacity over one minute.
///
/// Bursts of up to `capacity` calls pass immediately; after that calls are admitted at the
/// refill rate. A denied `take` never waits.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<TokenBucketState>,
    clock: Arc<dyn Clock>,
}

impl TokenBucket {
    /// A bucket that starts full with `per_minute` tokens.
    pub fn per_minute(per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        let capacity = f64::from(per_minute);
        let state = TokenBucketState {
            capacity,
            tokens: capacity,
            refill_per_second: capacity / 60.0,
            last_refill_at: clock.now(),
        };

        Self {
            state: Mutex::new(state),
            clock,
        }
    }

    /// Refill for the time elapsed since the last call, then try to spend `cost` tokens.
    /// A cost that is not a positive finite number is always denied.
    pub fn take(&self, cost: f64) -> bool {
        if !cost.is_finite() || cost <= 0.0 {
            log::debug!("token bucket rejected invalid cost {cost}");
            return false;
        }

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now - state.last_refill_at;
        let refill = match elapsed.num_nanoseconds() {
            Some(nanos) => nanos.max(0) as f64 * state.refill_per_second / NANOS_PER_SECOND,
            // Only overflows after centuries; any such gap refills the bucket.
            None if elapsed > chrono::Duration::zero() => state.capacity,
            None => 0.0,
        };
        state.tokens = (state.tokens + refill).min(state.capacity);
        state.last_refill_at = now;

        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            log::debug!(
                "token bucket denied cost {cost}: {:.3} of {} tokens left",
                state.tokens,
                state.capacity
            );
            false
        }
    }

    pub fn snapshot(&self) -> TokenBucketState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
