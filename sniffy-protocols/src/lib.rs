//! # sniffy Protocol Decoders
//!
//! Crate for turning captured Ethernet frames into the layers sniffy meters:
//! Ethernet, IPv4/IPv6, TCP/UDP and the TLS record version.

pub mod decoder;
pub mod tls;

pub use decoder::{
    DecodeError, DecodedFrame, EthernetDecoder, EthernetLayer, FrameDecoder, Ipv4Layer,
    Ipv6Layer, LayerType, TcpFlags, TcpLayer, UdpLayer,
};
pub use tls::{TlsLayer, TlsVersion};
