//! ## sniffy-telemetry::router
//! **Metric Router**
//!
//! Three counter families share one label schema (the field selector's label
//! names): `packets_counter` for generic traffic, `incoming_packets_counter`
//! and `outgoing_packets_counter` for traffic to and from the local MAC.
//! Each frame bumps exactly one member of one family.

use std::collections::HashMap;
use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{IntCounterVec, Opts, Registry};
use sniffy_core::prelude::{Direction, FieldSelector, FlowDescriptor};

use crate::error::MetricsError;

const GENERIC_NAME: &str = "packets_counter";
const GENERIC_HELP: &str =
    "How many packets have been seen between the given source and destination fields. This is used for packets where the source/destination can't be identified as the local machine";
const INCOMING_NAME: &str = "incoming_packets_counter";
const INCOMING_HELP: &str =
    "How many packets have been seen incoming from the source fields to the local machine";
const OUTGOING_NAME: &str = "outgoing_packets_counter";
const OUTGOING_HELP: &str =
    "How many packets have been seen outgoing from the local machine to the destination fields";

pub struct FlowMetrics {
    selector: Arc<FieldSelector>,
    generic: IntCounterVec,
    incoming: IntCounterVec,
    outgoing: IntCounterVec,
}

impl FlowMetrics {
    /// Creates the three families and registers them.
    pub fn new(registry: &Registry, selector: Arc<FieldSelector>) -> Result<Self, MetricsError> {
        let labels = selector.label_names();
        let family = |name: &str, help: &str| -> Result<IntCounterVec, MetricsError> {
            let vec = IntCounterVec::new(Opts::new(name, help), &labels)?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        Ok(Self {
            generic: family(GENERIC_NAME, GENERIC_HELP)?,
            incoming: family(INCOMING_NAME, INCOMING_HELP)?,
            outgoing: family(OUTGOING_NAME, OUTGOING_HELP)?,
            selector,
        })
    }

    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    fn family(&self, direction: Direction) -> &IntCounterVec {
        match direction {
            Direction::Generic => &self.generic,
            Direction::Incoming => &self.incoming,
            Direction::Outgoing => &self.outgoing,
        }
    }

    /// Adds one to the member of `direction`'s family labelled with the
    /// descriptor's selected values, creating it at zero first if needed.
    pub fn increment(&self, direction: Direction, descriptor: &FlowDescriptor) {
        let values = self.selector.label_values(descriptor);
        self.family(direction)
            .with_label_values(values.as_slice())
            .inc();
    }

    /// Removes the tuple from all three families. Absent members are ignored.
    pub fn retract(&self, labels: &[&str]) {
        for direction in Direction::ALL {
            let _ = self.family(direction).remove_label_values(labels);
        }
    }

    /// Number of members currently in `direction`'s family.
    pub fn series_len(&self, direction: Direction) -> usize {
        self.family(direction)
            .collect()
            .iter()
            .map(|mf| mf.get_metric().len())
            .sum()
    }

    /// Current value of one member, `None` if it does not exist. Does not
    /// create the member.
    pub fn counter_value(&self, direction: Direction, labels: &[&str]) -> Option<u64> {
        let wanted: HashMap<&str, &str> = self
            .selector
            .label_names()
            .into_iter()
            .zip(labels.iter().copied())
            .collect();

        self.family(direction)
            .collect()
            .iter()
            .flat_map(|mf| mf.get_metric().iter())
            .find(|m| {
                m.get_label().len() == wanted.len()
                    && m
                        .get_label()
                        .iter()
                        .all(|pair| wanted.get(pair.get_name()) == Some(&pair.get_value()))
            })
            .map(|m| m.get_counter().get_value() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::gather_metrics;

    fn descriptor(source_mac: &str, destination_mac: &str, port: &str) -> FlowDescriptor {
        FlowDescriptor {
            source_mac: source_mac.into(),
            destination_mac: destination_mac.into(),
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.2".into(),
            source_port: port.into(),
            destination_port: "80".into(),
            layer4_protocol: "TCP",
            tcp_flag: "ACK",
            tls_version: "none",
        }
    }

    fn metrics(excluded: &[&str]) -> (Registry, FlowMetrics) {
        let registry = Registry::new();
        let selector = Arc::new(FieldSelector::with_exclusions(excluded).unwrap());
        let metrics = FlowMetrics::new(&registry, selector).unwrap();
        (registry, metrics)
    }

    #[test]
    fn increments_only_the_routed_family() {
        let (_registry, metrics) = metrics(&["sourceMAC", "destinationMAC"]);
        let d = descriptor("a", "b", "40000");
        metrics.increment(Direction::Incoming, &d);
        metrics.increment(Direction::Incoming, &d);

        let labels = ["10.0.0.1", "10.0.0.2", "40000", "80", "TCP", "ACK", "none"];
        assert_eq!(metrics.counter_value(Direction::Incoming, &labels), Some(2));
        assert_eq!(metrics.counter_value(Direction::Outgoing, &labels), None);
        assert_eq!(metrics.series_len(Direction::Generic), 0);
        assert_eq!(metrics.series_len(Direction::Incoming), 1);
    }

    #[test]
    fn excluded_fields_merge_series() {
        let (_registry, metrics) = metrics(&["sourcePort"]);
        metrics.increment(Direction::Generic, &descriptor("a", "b", "1000"));
        metrics.increment(Direction::Generic, &descriptor("a", "b", "2000"));

        assert_eq!(metrics.series_len(Direction::Generic), 1);
        let labels = ["a", "b", "10.0.0.1", "10.0.0.2", "80", "TCP", "ACK", "none"];
        assert_eq!(metrics.counter_value(Direction::Generic, &labels), Some(2));
    }

    #[test]
    fn retract_removes_tuple_everywhere() {
        let (_registry, metrics) = metrics(&[]);
        let d = descriptor("a", "b", "1");
        metrics.increment(Direction::Generic, &d);
        metrics.increment(Direction::Outgoing, &d);
        metrics.increment(Direction::Outgoing, &descriptor("a", "b", "2"));

        let values = metrics.selector().label_values(&d);
        metrics.retract(values.as_slice());

        assert_eq!(metrics.series_len(Direction::Generic), 0);
        assert_eq!(metrics.series_len(Direction::Outgoing), 1);
        assert_eq!(metrics.counter_value(Direction::Outgoing, values.as_slice()), None);

        // absent tuple
        metrics.retract(values.as_slice());
    }

    #[test]
    fn exposition_uses_selected_label_names() {
        let (registry, metrics) = metrics(&[
            "sourceMAC",
            "destinationMAC",
            "sourceIP",
            "destinationIP",
            "sourcePort",
            "destinationPort",
            "tcpFlag",
            "tlsVersion",
        ]);
        metrics.increment(Direction::Generic, &descriptor("a", "b", "1"));

        let text = gather_metrics(&registry).unwrap();
        assert!(text.contains("# HELP packets_counter How many packets"));
        assert!(text.contains("packets_counter{layer4_protocol=\"TCP\"} 1"));
        assert!(!text.contains("sourceIP"));
    }

    #[test]
    fn empty_selection_has_a_single_member() {
        let names: Vec<&str> = sniffy_core::field::FlowField::ALL
            .iter()
            .map(|f| f.label())
            .collect();
        let (_registry, metrics) = metrics(&names);
        metrics.increment(Direction::Generic, &descriptor("a", "b", "1"));
        metrics.increment(Direction::Generic, &descriptor("c", "d", "2"));
        assert_eq!(metrics.counter_value(Direction::Generic, &[]), Some(2));
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = Registry::new();
        let selector = Arc::new(FieldSelector::all());
        FlowMetrics::new(&registry, Arc::clone(&selector)).unwrap();
        assert!(FlowMetrics::new(&registry, selector).is_err());
    }
}
