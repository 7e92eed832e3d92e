use std::collections::VecDeque;
use std::time::Duration;

use pcap::{Active, Capture};
use thiserror::Error;
use tracing::{debug, info};

use crate::packet::Packet;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to open capture on '{interface}': {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },
    /// No frame arrived within the read timeout. Not a failure.
    #[error("Capture read timed out")]
    Timeout,
    /// The source has no more frames to give.
    #[error("Capture source exhausted")]
    Exhausted,
    #[error("Capture read failed: {0}")]
    Read(String),
}

/// libpcap counters since the capture was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub received: u32,
    pub dropped: u32,
    pub if_dropped: u32,
}

/// Anything that yields raw Ethernet frames one at a time.
pub trait FrameSource {
    /// Next frame, borrowed until the following call.
    fn next_frame(&mut self) -> Result<&[u8], CaptureError>;

    fn stats(&mut self) -> Result<CaptureStats, CaptureError>;
}

/// Promiscuous live capture on one interface.
pub struct LiveCapture {
    cap: Capture<Active>,
}

impl LiveCapture {
    /// Opens `interface` with the given snap length and read timeout.
    /// A timeout under one millisecond is raised to one millisecond.
    pub fn open(
        interface: &str,
        snap_len: u32,
        read_timeout: Duration,
    ) -> Result<Self, CaptureError> {
        let open_err = |source| CaptureError::Open {
            interface: interface.to_string(),
            source,
        };
        let timeout_ms = read_timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let snap_len = snap_len.min(i32::MAX as u32) as i32;

        let cap = Capture::from_device(interface)
            .map_err(open_err)?
            .promisc(true)
            .snaplen(snap_len)
            .timeout(timeout_ms)
            .open()
            .map_err(open_err)?;

        info!(interface, snap_len, timeout_ms, "Capture opened");
        Ok(Self { cap })
    }
}

impl FrameSource for LiveCapture {
    fn next_frame(&mut self) -> Result<&[u8], CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => Ok(packet.data),
            Err(pcap::Error::TimeoutExpired) => Err(CaptureError::Timeout),
            Err(pcap::Error::NoMorePackets) => Err(CaptureError::Exhausted),
            Err(e) => Err(CaptureError::Read(e.to_string())),
        }
    }

    fn stats(&mut self) -> Result<CaptureStats, CaptureError> {
        let stat = self
            .cap
            .stats()
            .map_err(|e| CaptureError::Read(e.to_string()))?;
        Ok(CaptureStats {
            received: stat.received,
            dropped: stat.dropped,
            if_dropped: stat.if_dropped,
        })
    }
}

enum Scripted {
    Frame(Packet),
    Timeout,
    ReadError(String),
}

/// In-memory frame source. Replays queued frames, timeouts and read errors
/// in order, then reports [`CaptureError::Exhausted`].
#[derive(Default)]
pub struct MemorySource {
    queue: VecDeque<Scripted>,
    current: Option<Packet>,
    delivered: u32,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames<I, P>(frames: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Packet>,
    {
        let mut source = Self::new();
        for frame in frames {
            source.push_frame(frame);
        }
        source
    }

    pub fn push_frame(&mut self, frame: impl Into<Packet>) -> &mut Self {
        self.queue.push_back(Scripted::Frame(frame.into()));
        self
    }

    pub fn push_timeout(&mut self) -> &mut Self {
        self.queue.push_back(Scripted::Timeout);
        self
    }

    pub fn push_read_error(&mut self, message: &str) -> &mut Self {
        self.queue.push_back(Scripted::ReadError(message.to_string()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<&[u8], CaptureError> {
        match self.queue.pop_front() {
            Some(Scripted::Frame(packet)) => {
                self.delivered += 1;
                let packet = self.current.insert(packet);
                Ok(&packet.data[..])
            }
            Some(Scripted::Timeout) => Err(CaptureError::Timeout),
            Some(Scripted::ReadError(message)) => Err(CaptureError::Read(message)),
            None => {
                debug!(delivered = self.delivered, "Memory source drained");
                Err(CaptureError::Exhausted)
            }
        }
    }

    fn stats(&mut self) -> Result<CaptureStats, CaptureError> {
        Ok(CaptureStats {
            received: self.delivered,
            ..Default::default()
        })
    }
}
