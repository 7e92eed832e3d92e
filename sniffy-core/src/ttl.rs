//! ## sniffy-core::ttl
//! **TTL Store**
//!
//! Last-seen time per flow key. The pipeline refreshes a key on every frame;
//! the sweeper periodically evicts keys that have been idle for longer than
//! the expiry and retracts their metric series.
//!
//! One mutex guards the whole table. `sweep_with` runs its callback while the
//! lock is held, so a refresh racing with a sweep is either evicted together
//! with its series or survives with its series. It can never land between the
//! eviction and the retraction.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::key::FlowKey;
use crate::time::{Clock, SystemClock};

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub remaining: usize,
}

pub struct TtlStore<C: Clock = SystemClock> {
    entries: Mutex<HashMap<FlowKey, i64>>,
    clock: C,
}

impl TtlStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TtlStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TtlStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Marks `key` as seen now.
    pub fn refresh(&self, key: &str) {
        let now = self.clock.now_secs();
        self.refresh_at(key, now);
    }

    /// Marks `key` as seen at `at`. Only allocates the first time a key is
    /// seen.
    pub fn refresh_at(&self, key: &str, at: i64) {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(last) => *last = at,
            None => {
                entries.insert(FlowKey::from(key.to_string()), at);
            }
        }
    }

    pub fn last_seen(&self, key: &str) -> Option<i64> {
        self.entries.lock().get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Evicts every key idle for strictly more than `expire_secs` and
    /// returns them.
    pub fn sweep(&self, expire_secs: i64) -> Vec<FlowKey> {
        let now = self.clock.now_secs();
        let mut expired = Vec::new();
        self.sweep_with(now, expire_secs, |key| expired.push(key.clone()));
        expired
    }

    /// Evicts every key with `now - last_seen > expire_secs`, calling
    /// `on_evict` for each one under the table lock.
    pub fn sweep_with<F>(&self, now: i64, expire_secs: i64, mut on_evict: F) -> SweepReport
    where
        F: FnMut(&FlowKey),
    {
        let mut entries = self.entries.lock();
        let scanned = entries.len();
        entries.retain(|key, last| {
            if now.saturating_sub(*last) > expire_secs {
                on_evict(key);
                false
            } else {
                true
            }
        });

        SweepReport {
            scanned,
            expired: scanned - entries.len(),
            remaining: entries.len(),
        }
    }
}
