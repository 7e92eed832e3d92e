//! ## sniffy-protocols::decoder
//! Frame decoder: raw Ethernet bytes in, recognized layers out.
//!
//! Mirrors a decoding-layer parser: the caller owns one [`DecodedFrame`] and
//! hands it to [`FrameDecoder::decode_into`] for every frame, so the hot path
//! does not allocate. Only layers listed in [`DecodedFrame::layers`] are valid;
//! the others hold whatever the previous frame left behind and are hidden
//! behind the `Option` accessors.

use std::net::{Ipv4Addr, Ipv6Addr};

use etherparse::{LinkSlice, NetSlice, SlicedPacket, TransportSlice};
use thiserror::Error;

use crate::tls::{TlsLayer, TLS_PORT};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Malformed(String),
}

/// Layers the decoder understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerType {
    Ethernet,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Tls,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EthernetLayer {
    pub source: [u8; 6],
    pub destination: [u8; 6],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Layer {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Default for Ipv4Layer {
    fn default() -> Self {
        Self {
            source: Ipv4Addr::UNSPECIFIED,
            destination: Ipv4Addr::UNSPECIFIED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv6Layer {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

impl Default for Ipv6Layer {
    fn default() -> Self {
        Self {
            source: Ipv6Addr::UNSPECIFIED,
            destination: Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// TCP control bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub syn: bool,
    pub ack: bool,
    pub fin: bool,
    pub rst: bool,
    pub psh: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
    pub ns: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpLayer {
    pub source_port: u16,
    pub destination_port: u16,
    pub flags: TcpFlags,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UdpLayer {
    pub source_port: u16,
    pub destination_port: u16,
}

/// Reusable decoding target.
#[derive(Clone, Debug, Default)]
pub struct DecodedFrame {
    layers: Vec<LayerType>,
    ethernet: EthernetLayer,
    ipv4: Ipv4Layer,
    ipv6: Ipv6Layer,
    tcp: TcpLayer,
    udp: UdpLayer,
    tls: TlsLayer,
}

impl DecodedFrame {
    pub fn new() -> Self {
        Self {
            layers: Vec::with_capacity(4),
            ..Default::default()
        }
    }

    /// Layers present in the last decoded frame, outermost first.
    pub fn layers(&self) -> &[LayerType] {
        &self.layers
    }

    pub fn contains(&self, layer: LayerType) -> bool {
        self.layers.contains(&layer)
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn ethernet(&self) -> Option<&EthernetLayer> {
        self.contains(LayerType::Ethernet).then_some(&self.ethernet)
    }

    pub fn ipv4(&self) -> Option<&Ipv4Layer> {
        self.contains(LayerType::Ipv4).then_some(&self.ipv4)
    }

    pub fn ipv6(&self) -> Option<&Ipv6Layer> {
        self.contains(LayerType::Ipv6).then_some(&self.ipv6)
    }

    pub fn tcp(&self) -> Option<&TcpLayer> {
        self.contains(LayerType::Tcp).then_some(&self.tcp)
    }

    pub fn udp(&self) -> Option<&UdpLayer> {
        self.contains(LayerType::Udp).then_some(&self.udp)
    }

    pub fn tls(&self) -> Option<&TlsLayer> {
        self.contains(LayerType::Tls).then_some(&self.tls)
    }

    pub fn set_ethernet(&mut self, layer: EthernetLayer) -> &mut Self {
        self.ethernet = layer;
        self.layers.push(LayerType::Ethernet);
        self
    }

    pub fn set_ipv4(&mut self, layer: Ipv4Layer) -> &mut Self {
        self.ipv4 = layer;
        self.layers.push(LayerType::Ipv4);
        self
    }

    pub fn set_ipv6(&mut self, layer: Ipv6Layer) -> &mut Self {
        self.ipv6 = layer;
        self.layers.push(LayerType::Ipv6);
        self
    }

    pub fn set_tcp(&mut self, layer: TcpLayer) -> &mut Self {
        self.tcp = layer;
        self.layers.push(LayerType::Tcp);
        self
    }

    pub fn set_udp(&mut self, layer: UdpLayer) -> &mut Self {
        self.udp = layer;
        self.layers.push(LayerType::Udp);
        self
    }

    /// Parses `payload` as TLS records and marks the layer present on success.
    pub fn set_tls_from(&mut self, payload: &[u8]) -> &mut Self {
        if self.tls.decode_from(payload).is_ok() {
            self.layers.push(LayerType::Tls);
        }
        self
    }
}

/// Turns a raw captured buffer into decoded layers.
pub trait FrameDecoder {
    fn decode_into(&mut self, data: &[u8], frame: &mut DecodedFrame) -> Result<(), DecodeError>;
}

/// Ethernet II decoder backed by etherparse. VLAN tags are skipped by
/// etherparse; upper layers it does not know (ARP, ICMP, ...) simply end the
/// layer list without failing the frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct EthernetDecoder;

impl EthernetDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for EthernetDecoder {
    fn decode_into(&mut self, data: &[u8], frame: &mut DecodedFrame) -> Result<(), DecodeError> {
        frame.clear();
        let sliced =
            SlicedPacket::from_ethernet(data).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if let Some(LinkSlice::Ethernet2(eth)) = &sliced.link {
            frame.set_ethernet(EthernetLayer {
                source: eth.source(),
                destination: eth.destination(),
            });
        }

        match &sliced.net {
            Some(NetSlice::Ipv4(ipv4)) => {
                let header = ipv4.header();
                frame.set_ipv4(Ipv4Layer {
                    source: header.source_addr(),
                    destination: header.destination_addr(),
                });
            }
            Some(NetSlice::Ipv6(ipv6)) => {
                let header = ipv6.header();
                frame.set_ipv6(Ipv6Layer {
                    source: header.source_addr(),
                    destination: header.destination_addr(),
                });
            }
            _ => {}
        }

        match &sliced.transport {
            Some(TransportSlice::Tcp(tcp)) => {
                frame.set_tcp(TcpLayer {
                    source_port: tcp.source_port(),
                    destination_port: tcp.destination_port(),
                    flags: TcpFlags {
                        syn: tcp.syn(),
                        ack: tcp.ack(),
                        fin: tcp.fin(),
                        rst: tcp.rst(),
                        psh: tcp.psh(),
                        urg: tcp.urg(),
                        ece: tcp.ece(),
                        cwr: tcp.cwr(),
                        ns: tcp.ns(),
                    },
                });
                let payload = tcp.payload();
                if !payload.is_empty()
                    && (tcp.source_port() == TLS_PORT || tcp.destination_port() == TLS_PORT)
                {
                    frame.set_tls_from(payload);
                }
            }
            Some(TransportSlice::Udp(udp)) => {
                frame.set_udp(UdpLayer {
                    source_port: udp.source_port(),
                    destination_port: udp.destination_port(),
                });
            }
            _ => {}
        }

        Ok(())
    }
}
