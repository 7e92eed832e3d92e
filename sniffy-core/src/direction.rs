//! ## sniffy-core::direction
//! Directional Classifier: which counter family a frame lands in.

use std::fmt;

use crate::flow::FlowDescriptor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by the local interface.
    Outgoing,
    /// Addressed to the local interface.
    Incoming,
    /// Neither, or no local MAC configured.
    Generic,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Generic, Direction::Incoming, Direction::Outgoing];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
            Direction::Generic => "generic",
        }
    }

    /// MACs are compared case-insensitively. An empty `local_mac` never
    /// matches, so every frame is generic. Source is checked first: a frame
    /// from the local MAC to itself is outgoing.
    pub fn classify(descriptor: &FlowDescriptor, local_mac: &str) -> Direction {
        if local_mac.is_empty() {
            return Direction::Generic;
        }
        if descriptor.source_mac.eq_ignore_ascii_case(local_mac) {
            Direction::Outgoing
        } else if descriptor.destination_mac.eq_ignore_ascii_case(local_mac) {
            Direction::Incoming
        } else {
            Direction::Generic
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
