//! ## sniffy-engine::sweeper
//! Periodic expiry of idle flows.
//!
//! Each pass evicts keys idle for longer than the configured expiry and
//! retracts the label tuple decoded from each key from all three families.
//! Retraction runs inside the TTL table's lock.

use std::time::Duration;

use opentelemetry::KeyValue;
use sniffy_core::prelude::{Clock, KeyCodec, SweepReport, SystemClock};
use sniffy_telemetry::EventLogger;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::context::FlowContext;

pub struct Sweeper<C: Clock = SystemClock> {
    context: FlowContext<C>,
    codec: KeyCodec,
    expire_after: i64,
}

impl<C: Clock> Sweeper<C> {
    pub fn new(context: FlowContext<C>, expire_after_secs: u64) -> Self {
        Self {
            codec: KeyCodec::new(context.selector.clone()),
            context,
            expire_after: i64::try_from(expire_after_secs).unwrap_or(i64::MAX),
        }
    }

    /// One pass at the clock's current time.
    pub fn sweep_once(&self) -> SweepReport {
        let now = self.context.store.now();
        let flows = &self.context.flows;
        let codec = &self.codec;

        let report = self
            .context
            .store
            .sweep_with(now, self.expire_after, |key| match codec.decode(key.as_str()) {
                Ok(labels) => flows.retract(&labels),
                Err(e) => warn!(error = %e, key = %key, "Cannot retract series of expired flow"),
            });

        self.context
            .recorder
            .record_sweep(report.expired, report.remaining);
        info!(
            scanned = report.scanned,
            expired = report.expired,
            remaining = report.remaining,
            "Flow expiry sweep done"
        );
        report
    }

    /// Sweeps every `period`, first one a full period after start.
    #[instrument(level = "info", name = "flow_sweeper", skip(self))]
    pub async fn run(self, period: Duration) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = self.sweep_once();
            if report.expired > 0 {
                EventLogger::log_event(
                    "sweep_completed",
                    vec![
                        KeyValue::new("scanned", report.scanned as i64),
                        KeyValue::new("expired", report.expired as i64),
                        KeyValue::new("remaining", report.remaining as i64),
                    ],
                )
                .await;
            }
        }
    }
}
