//! ## sniffy-engine::pipeline
//! **Pipeline Driver**
//!
//! One frame at a time: read → decode → extract → classify → route →
//! refresh. Read and decode failures drop the frame and the loop goes on.
//! The descriptor, decoded-frame scratch and key buffer are reused for every
//! frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use sniffy_capture::{CaptureError, FrameSource};
use sniffy_core::prelude::{Clock, Direction, FlowDescriptor, KeyCodec, SystemClock};
use sniffy_protocols::{DecodedFrame, EthernetDecoder, FrameDecoder};
use sniffy_telemetry::DropReason;
use tracing::{debug, info, warn};

use crate::context::FlowContext;

/// What happened to one attempted read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Frame counted in the given direction's family.
    Counted(Direction),
    /// Read timeout, nothing arrived.
    Idle,
    ReadFailed,
    DecodeFailed,
    /// The source will not yield any more frames.
    Exhausted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames: u64,
    pub bytes: u64,
    pub read_errors: u64,
    pub decode_errors: u64,
}

pub struct Pipeline<S: FrameSource, C: Clock = SystemClock> {
    source: S,
    decoder: EthernetDecoder,
    frame: DecodedFrame,
    descriptor: FlowDescriptor,
    key: String,
    codec: KeyCodec,
    local_mac: String,
    context: FlowContext<C>,
    log_all_packets: bool,
    stats: PipelineStats,
}

impl<S: FrameSource, C: Clock> Pipeline<S, C> {
    pub fn new(
        source: S,
        context: FlowContext<C>,
        local_mac: String,
        log_all_packets: bool,
    ) -> Self {
        Self {
            source,
            decoder: EthernetDecoder::new(),
            frame: DecodedFrame::new(),
            descriptor: FlowDescriptor::new(),
            key: String::with_capacity(128),
            codec: KeyCodec::new(context.selector.clone()),
            local_mac,
            context,
            log_all_packets,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Processes at most one frame.
    pub fn step(&mut self) -> StepOutcome {
        let data = match self.source.next_frame() {
            Ok(data) => data,
            Err(CaptureError::Timeout) => return StepOutcome::Idle,
            Err(CaptureError::Exhausted) => return StepOutcome::Exhausted,
            Err(e) => {
                warn!(error = %e, "Dropping frame after capture read failure");
                self.stats.read_errors += 1;
                self.context.recorder.record_drop(DropReason::Read);
                return StepOutcome::ReadFailed;
            }
        };
        let len = data.len();

        if let Err(e) = self.decoder.decode_into(data, &mut self.frame) {
            debug!(error = %e, len, "Dropping undecodable frame");
            self.stats.decode_errors += 1;
            self.context.recorder.record_drop(DropReason::Decode);
            return StepOutcome::DecodeFailed;
        }

        self.descriptor.fill_from(&self.frame);
        if self.log_all_packets {
            info!(layers = ?self.frame.layers(), descriptor = ?self.descriptor, len, "Frame");
        }

        let direction = Direction::classify(&self.descriptor, &self.local_mac);
        self.context.flows.increment(direction, &self.descriptor);
        self.codec.encode_into(&self.descriptor, &mut self.key);
        self.context.store.refresh(&self.key);

        self.stats.frames += 1;
        self.stats.bytes += len as u64;
        self.context.recorder.record_frame(len);
        StepOutcome::Counted(direction)
    }

    /// Steps until `terminate` is raised or the source is exhausted, logging
    /// capture statistics every `stats_every`.
    pub fn run(&mut self, terminate: &AtomicBool, stats_every: Duration) -> PipelineStats {
        let started = Instant::now();
        let mut last_stats = started;

        while !terminate.load(Ordering::Relaxed) {
            if self.step() == StepOutcome::Exhausted {
                break;
            }
            if last_stats.elapsed() >= stats_every {
                self.log_capture_stats();
                last_stats = Instant::now();
            }
        }

        info!(
            bytes = self.stats.bytes,
            frames = self.stats.frames,
            elapsed = ?started.elapsed(),
            "Processed {} bytes in {:?}",
            self.stats.bytes,
            started.elapsed()
        );
        self.stats
    }

    fn log_capture_stats(&mut self) {
        match self.source.stats() {
            Ok(stats) => info!(
                received = stats.received,
                dropped = stats.dropped,
                if_dropped = stats.if_dropped,
                tracked_flows = self.context.store.len(),
                "Capture statistics"
            ),
            Err(e) => warn!(error = %e, "Capture statistics unavailable"),
        }
    }
}
