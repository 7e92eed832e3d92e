//! ## sniffy-core::flow
//! **Flow Descriptor and extraction from decoded layers**
//!
//! A descriptor is the fixed-shape summary of one frame. Every field starts
//! out empty (`tls_version` starts as `"none"`) and is only overwritten by the
//! layers actually present, so extraction never fails.
//!
//! The pipeline keeps a single descriptor and refills it for every frame;
//! the string fields keep their capacity across frames.

use std::fmt::Write;

use sniffy_protocols::{DecodedFrame, LayerType, TcpFlags};

pub const PROTOCOL_TCP: &str = "TCP";
pub const PROTOCOL_UDP: &str = "UDP";
pub const TLS_NONE: &str = "none";
pub const TCP_FLAG_NONE: &str = "nil";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowDescriptor {
    pub source_mac: String,
    pub destination_mac: String,
    pub source_ip: String,
    pub destination_ip: String,
    pub source_port: String,
    pub destination_port: String,
    /// `"TCP"`, `"UDP"` or empty.
    pub layer4_protocol: &'static str,
    /// See [`classify_tcp_flags`]. Empty unless the frame is TCP.
    pub tcp_flag: &'static str,
    /// Record version of the first TLS application-data record, or `"none"`.
    pub tls_version: &'static str,
}

impl Default for FlowDescriptor {
    fn default() -> Self {
        Self {
            source_mac: String::new(),
            destination_mac: String::new(),
            source_ip: String::new(),
            destination_ip: String::new(),
            source_port: String::new(),
            destination_port: String::new(),
            layer4_protocol: "",
            tcp_flag: "",
            tls_version: TLS_NONE,
        }
    }
}

impl FlowDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fresh descriptor from a decoded frame.
    pub fn from_frame(frame: &DecodedFrame) -> Self {
        let mut descriptor = Self::new();
        descriptor.fill_from(frame);
        descriptor
    }

    /// Back to the all-defaults state, keeping allocations.
    pub fn reset(&mut self) {
        self.source_mac.clear();
        self.destination_mac.clear();
        self.source_ip.clear();
        self.destination_ip.clear();
        self.source_port.clear();
        self.destination_port.clear();
        self.layer4_protocol = "";
        self.tcp_flag = "";
        self.tls_version = TLS_NONE;
    }

    /// Resets, then overwrites the fields of every layer present in `frame`.
    pub fn fill_from(&mut self, frame: &DecodedFrame) {
        self.reset();

        for layer in frame.layers() {
            match layer {
                LayerType::Ethernet => {
                    if let Some(eth) = frame.ethernet() {
                        write_mac(&mut self.source_mac, &eth.source);
                        write_mac(&mut self.destination_mac, &eth.destination);
                    }
                }
                LayerType::Ipv4 => {
                    if let Some(ip) = frame.ipv4() {
                        let _ = write!(self.source_ip, "{}", ip.source);
                        let _ = write!(self.destination_ip, "{}", ip.destination);
                    }
                }
                LayerType::Ipv6 => {
                    if let Some(ip) = frame.ipv6() {
                        let _ = write!(self.source_ip, "{}", ip.source);
                        let _ = write!(self.destination_ip, "{}", ip.destination);
                    }
                }
                LayerType::Tcp => {
                    if let Some(tcp) = frame.tcp() {
                        write_port(&mut self.source_port, tcp.source_port);
                        write_port(&mut self.destination_port, tcp.destination_port);
                        self.layer4_protocol = PROTOCOL_TCP;
                        self.tcp_flag = classify_tcp_flags(&tcp.flags);
                    }
                }
                LayerType::Udp => {
                    if let Some(udp) = frame.udp() {
                        write_port(&mut self.source_port, udp.source_port);
                        write_port(&mut self.destination_port, udp.destination_port);
                        self.layer4_protocol = PROTOCOL_UDP;
                    }
                }
                LayerType::Tls => {
                    if let Some(version) = frame.tls().and_then(|tls| tls.first_app_data()) {
                        self.tls_version = version.as_str();
                    }
                }
            }
        }
    }
}

/// Picks exactly one token per TCP segment, first match wins:
/// SYN, ACK, FIN, RST, PSH, URG, ECE, CWR, NS, else `"nil"`.
///
/// A SYN+ACK is reported as `"SYN"`. Combinations are collapsed on purpose so
/// the label space stays at ten values.
pub fn classify_tcp_flags(flags: &TcpFlags) -> &'static str {
    const PRIORITY: [(fn(&TcpFlags) -> bool, &str); 9] = [
        (|f| f.syn, "SYN"),
        (|f| f.ack, "ACK"),
        (|f| f.fin, "FIN"),
        (|f| f.rst, "RST"),
        (|f| f.psh, "PSH"),
        (|f| f.urg, "URG"),
        (|f| f.ece, "ECE"),
        (|f| f.cwr, "CWR"),
        (|f| f.ns, "NS"),
    ];

    PRIORITY
        .iter()
        .find(|(is_set, _)| is_set(flags))
        .map_or(TCP_FLAG_NONE, |&(_, token)| token)
}

fn write_mac(out: &mut String, mac: &[u8; 6]) {
    out.clear();
    let _ = write!(
        out,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
}

fn write_port(out: &mut String, port: u16) {
    out.clear();
    let _ = write!(out, "{}", port);
}
