//! Token bucket admission control.
//!
//! The bucket holds at most `max_tokens`. Refills happen lazily on each
//! `allow` call: every whole `period` elapsed since the last fill adds
//! `max_tokens` tokens. `last_fill` advances by whole periods only, so the
//! refill schedule behaves like a ticker even when calls arrive irregularly.

use std::sync::Mutex;

use tokio::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    tokens: u64,
    last_fill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    max_tokens: u64,
    period: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(max_tokens: u64, period: Duration) -> Self {
        Self::starting_at(max_tokens, period, Instant::now())
    }

    fn starting_at(max_tokens: u64, period: Duration, now: Instant) -> Self {
        Self {
            max_tokens,
            period,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_fill: now,
            }),
        }
    }

    pub fn max_tokens(&self) -> u64 {
        self.max_tokens
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Take one token if available.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(state.last_fill);
        let periods = if self.period.is_zero() {
            0
        } else {
            (elapsed.as_nanos() / self.period.as_nanos()) as u64
        };
        let tokens_to_add = self.max_tokens.saturating_mul(periods);
        let current = state.tokens.saturating_add(tokens_to_add);

        if current < 1 {
            return false;
        }

        if current > self.max_tokens {
            state.last_fill = now;
            state.tokens = self.max_tokens - 1;
        } else {
            state.last_fill += self.period * periods as u32;
            state.tokens = current - 1;
        }
        true
    }
}
