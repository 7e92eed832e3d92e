//! ## sniffy-telemetry::metrics
//! **Pipeline self-metrics**
//!
//! Counters describing sniffy itself rather than the traffic it meters.
//! They live in the same registry as the flow counters and are exported
//! alongside them.

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::MetricsError;

/// Why a frame did not make it into the flow counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    Read,
    Decode,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Read => "read_error",
            DropReason::Decode => "decode_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub frames_processed: IntCounter,
    pub bytes_processed: IntCounter,
    pub frames_dropped: IntCounterVec,
    pub flows_tracked: IntGauge,
    pub flows_expired: IntCounter,
}

impl MetricsRecorder {
    pub fn new(registry: &Registry) -> Result<Self, MetricsError> {
        let frames_processed = IntCounter::new(
            "sniffy_frames_processed_total",
            "Frames decoded and counted into a flow series",
        )?;
        let bytes_processed = IntCounter::new(
            "sniffy_bytes_processed_total",
            "Captured bytes of frames counted into a flow series",
        )?;
        let frames_dropped = IntCounterVec::new(
            Opts::new(
                "sniffy_frames_dropped_total",
                "Frames lost to capture read or decode failures",
            ),
            &["reason"],
        )?;
        let flows_tracked = IntGauge::new(
            "sniffy_flows_tracked",
            "Flow keys currently held by the expiry table",
        )?;
        let flows_expired = IntCounter::new(
            "sniffy_flows_expired_total",
            "Flow keys evicted by the expiry sweep",
        )?;

        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(bytes_processed.clone()))?;
        registry.register(Box::new(frames_dropped.clone()))?;
        registry.register(Box::new(flows_tracked.clone()))?;
        registry.register(Box::new(flows_expired.clone()))?;

        Ok(Self {
            frames_processed,
            bytes_processed,
            frames_dropped,
            flows_tracked,
            flows_expired,
        })
    }

    pub fn record_frame(&self, bytes: usize) {
        self.frames_processed.inc();
        self.bytes_processed.inc_by(bytes as u64);
    }

    pub fn record_drop(&self, reason: DropReason) {
        self.frames_dropped.with_label_values(&[reason.as_str()]).inc();
    }

    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.frames_dropped.with_label_values(&[reason.as_str()]).get()
    }

    pub fn record_sweep(&self, expired: usize, remaining: usize) {
        self.flows_expired.inc_by(expired as u64);
        self.flows_tracked.set(remaining as i64);
    }
}

/// Renders every family of `registry` in the Prometheus text format.
pub fn gather_metrics(registry: &Registry) -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::<u8>::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_frames_and_drops() {
        let registry = Registry::new();
        let recorder = MetricsRecorder::new(&registry).unwrap();

        recorder.record_frame(60);
        recorder.record_frame(1514);
        recorder.record_drop(DropReason::Decode);

        assert_eq!(recorder.frames_processed.get(), 2);
        assert_eq!(recorder.bytes_processed.get(), 1574);
        assert_eq!(recorder.dropped(DropReason::Decode), 1);
        assert_eq!(recorder.dropped(DropReason::Read), 0);

        let text = gather_metrics(&registry).unwrap();
        assert!(text.contains("sniffy_frames_processed_total 2"));
        assert!(text.contains("sniffy_frames_dropped_total{reason=\"decode_error\"} 1"));
    }

    #[test]
    fn sweep_updates_gauge() {
        let registry = Registry::new();
        let recorder = MetricsRecorder::new(&registry).unwrap();
        recorder.record_sweep(4, 10);
        recorder.record_sweep(1, 9);
        assert_eq!(recorder.flows_expired.get(), 5);
        assert_eq!(recorder.flows_tracked.get(), 9);
    }

    #[test]
    fn double_registration_is_an_error() {
        let registry = Registry::new();
        MetricsRecorder::new(&registry).unwrap();
        assert!(matches!(
            MetricsRecorder::new(&registry),
            Err(MetricsError::Prometheus(_))
        ));
    }
}
