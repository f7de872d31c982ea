//! Game activity counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct GameMetrics {
    enabled: bool,
    start_time: Instant,
    hackable_guesses: AtomicU64,
    unhackable_guesses: AtomicU64,
    randomness_requests: AtomicU64,
    fulfillments: AtomicU64,
    wins: AtomicU64,
    rejected_calls: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hackable_guesses: u64,
    pub unhackable_guesses: u64,
    pub randomness_requests: u64,
    pub fulfillments: u64,
    pub wins: u64,
    pub rejected_calls: u64,
}

impl GameMetrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            start_time: Instant::now(),
            hackable_guesses: AtomicU64::new(0),
            unhackable_guesses: AtomicU64::new(0),
            randomness_requests: AtomicU64::new(0),
            fulfillments: AtomicU64::new(0),
            wins: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
        }
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_hackable_guess(&self) {
        self.bump(&self.hackable_guesses);
    }

    /// Counts the guess and the randomness request it issued
    pub fn record_unhackable_guess(&self) {
        self.bump(&self.unhackable_guesses);
        self.bump(&self.randomness_requests);
    }

    pub fn record_fulfillment(&self) {
        self.bump(&self.fulfillments);
    }

    pub fn record_win(&self) {
        self.bump(&self.wins);
    }

    pub fn record_rejection(&self) {
        self.bump(&self.rejected_calls);
    }

    pub fn total_runtime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hackable_guesses: self.hackable_guesses.load(Ordering::SeqCst),
            unhackable_guesses: self.unhackable_guesses.load(Ordering::SeqCst),
            randomness_requests: self.randomness_requests.load(Ordering::SeqCst),
            fulfillments: self.fulfillments.load(Ordering::SeqCst),
            wins: self.wins.load(Ordering::SeqCst),
            rejected_calls: self.rejected_calls.load(Ordering::SeqCst),
        }
    }
}
