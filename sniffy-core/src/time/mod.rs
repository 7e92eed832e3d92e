//! ## sniffy-core::time
//! **Second-resolution clocks for flow expiry**
//!
//! Flow freshness is tracked in whole seconds since the Unix epoch. The TTL
//! store is generic over [`Clock`] so tests can drive expiry with a
//! [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        // A clock before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Settable clock. Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    secs: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::Release);
    }

    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.secs.load(Ordering::Acquire)
    }
}
