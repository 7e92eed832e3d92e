//! sniffy-capture
//!
//! Frame sources for sniffy: live libpcap capture, an in-memory replay source
//! for tests, and local MAC discovery.

pub mod capture;
pub mod interface;
pub mod packet;

pub use capture::{CaptureError, CaptureStats, FrameSource, LiveCapture, MemorySource};
pub use interface::local_mac;
pub use packet::Packet;
