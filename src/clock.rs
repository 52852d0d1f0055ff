//! Clock Module
//!
//! Logical timestamps used to order conflicting versions of a key.
//!
//! A timestamp is `millis * 1_000_000 + counter`, where the counter restarts
//! at zero whenever the wall-clock millisecond changes. This gives
//! nanosecond-scale resolution without a nanosecond clock.
//!
//! Known bound: more than 1,000,000 calls inside a single millisecond spill
//! into the next millisecond's range. Values stay strictly increasing, but
//! they drift ahead of the wall clock until it catches up.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

const COUNTER_SPAN: i64 = 1_000_000;

/// Source of coarse wall-clock time in milliseconds
pub trait WallClock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually driven wall clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl WallClock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct TimestampState {
    last_millis: i64,
    counter: i64,
    last_issued: i64,
}

/// Produces strictly increasing timestamps, even for bursts of calls
/// within one wall-clock millisecond.
pub struct TimestampSource {
    clock: Box<dyn WallClock>,
    state: Mutex<TimestampState>,
}

impl TimestampSource {
    pub fn new(clock: impl WallClock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            state: Mutex::new(TimestampState::default()),
        }
    }

    /// Timestamp source driven by the system clock
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Next timestamp; never repeats and never goes backwards
    pub fn next(&self) -> i64 {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();

        if now != state.last_millis {
            state.last_millis = now;
            state.counter = 0;
        } else {
            state.counter += 1;
        }

        let mut timestamp = state.last_millis * COUNTER_SPAN + state.counter;
        // Wall clock stepped backwards or the counter overflowed its span
        if timestamp <= state.last_issued {
            timestamp = state.last_issued + 1;
        }
        state.last_issued = timestamp;
        timestamp
    }
}

impl Default for TimestampSource {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampSource")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
