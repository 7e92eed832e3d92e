//! ## sniffy-core::field
//! **Field Selector**
//!
//! The nine descriptor fields in their canonical order, and the subset kept
//! after the configured exclusions. The selector is built once at startup and
//! shared read-only by the key codec and the metric router, so label names
//! and label values always line up.

use thiserror::Error;

use crate::flow::FlowDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown flow field '{0}' in exclude list")]
    UnknownField(String),
}

/// One descriptor field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowField {
    SourceMac,
    DestinationMac,
    SourceIp,
    DestinationIp,
    SourcePort,
    DestinationPort,
    Layer4Protocol,
    TcpFlag,
    TlsVersion,
}

impl FlowField {
    /// Canonical order. Label names, label values and flow-key segments all
    /// follow it.
    pub const ALL: [FlowField; 9] = [
        FlowField::SourceMac,
        FlowField::DestinationMac,
        FlowField::SourceIp,
        FlowField::DestinationIp,
        FlowField::SourcePort,
        FlowField::DestinationPort,
        FlowField::Layer4Protocol,
        FlowField::TcpFlag,
        FlowField::TlsVersion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FlowField::SourceMac => "sourceMAC",
            FlowField::DestinationMac => "destinationMAC",
            FlowField::SourceIp => "sourceIP",
            FlowField::DestinationIp => "destinationIP",
            FlowField::SourcePort => "sourcePort",
            FlowField::DestinationPort => "destinationPort",
            FlowField::Layer4Protocol => "layer4Protocol",
            FlowField::TcpFlag => "tcpFlag",
            FlowField::TlsVersion => "tlsVersion",
        }
    }

    /// Case-insensitive lookup by label name.
    pub fn from_label(name: &str) -> Option<FlowField> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.label().eq_ignore_ascii_case(name))
    }

    pub fn value(self, descriptor: &FlowDescriptor) -> &str {
        match self {
            FlowField::SourceMac => &descriptor.source_mac,
            FlowField::DestinationMac => &descriptor.destination_mac,
            FlowField::SourceIp => &descriptor.source_ip,
            FlowField::DestinationIp => &descriptor.destination_ip,
            FlowField::SourcePort => &descriptor.source_port,
            FlowField::DestinationPort => &descriptor.destination_port,
            FlowField::Layer4Protocol => descriptor.layer4_protocol,
            FlowField::TcpFlag => descriptor.tcp_flag,
            FlowField::TlsVersion => descriptor.tls_version,
        }
    }
}

/// Selected field values of one descriptor, in canonical order. Lives on the
/// stack so the per-frame path stays allocation free.
pub struct LabelValues<'a> {
    values: [&'a str; 9],
    len: usize,
}

impl<'a> LabelValues<'a> {
    pub fn as_slice(&self) -> &[&'a str] {
        &self.values[..self.len]
    }
}

/// The ordered subset of [`FlowField::ALL`] that survives exclusion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSelector {
    fields: Vec<FlowField>,
}

impl Default for FieldSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl FieldSelector {
    pub fn all() -> Self {
        Self {
            fields: FlowField::ALL.to_vec(),
        }
    }

    /// Drops the named fields. Names are matched case-insensitively;
    /// duplicates are harmless, unknown names are rejected.
    ///
    /// Excluding every field is allowed. All flows then share the single
    /// empty key and the counters carry no labels.
    pub fn with_exclusions<S: AsRef<str>>(excluded: &[S]) -> Result<Self, FieldError> {
        let mut drop = Vec::with_capacity(excluded.len());
        for name in excluded {
            let name = name.as_ref();
            let field = FlowField::from_label(name)
                .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
            drop.push(field);
        }

        Ok(Self {
            fields: FlowField::ALL
                .into_iter()
                .filter(|field| !drop.contains(field))
                .collect(),
        })
    }

    pub fn fields(&self) -> &[FlowField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn label_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.label()).collect()
    }

    pub fn label_values<'a>(&self, descriptor: &'a FlowDescriptor) -> LabelValues<'a> {
        let mut values = [""; 9];
        for (slot, field) in values.iter_mut().zip(&self.fields) {
            *slot = field.value(descriptor);
        }
        LabelValues {
            values,
            len: self.fields.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> FlowDescriptor {
        FlowDescriptor {
            source_mac: "00:1a:2b:3c:4d:5e".into(),
            destination_mac: "aa:bb:cc:dd:ee:ff".into(),
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.2".into(),
            source_port: "51000".into(),
            destination_port: "443".into(),
            layer4_protocol: "TCP",
            tcp_flag: "SYN",
            tls_version: "none",
        }
    }

    #[test]
    fn no_exclusions_keeps_canonical_order() {
        let selector = FieldSelector::with_exclusions::<&str>(&[]).unwrap();
        assert_eq!(selector, FieldSelector::all());
        assert_eq!(
            selector.label_names(),
            vec![
                "sourceMAC",
                "destinationMAC",
                "sourceIP",
                "destinationIP",
                "sourcePort",
                "destinationPort",
                "layer4Protocol",
                "tcpFlag",
                "tlsVersion",
            ]
        );
    }

    #[test]
    fn exclusions_preserve_relative_order() {
        let selector =
            FieldSelector::with_exclusions(&["sourcePort", "SOURCEMAC", "sourcePort"]).unwrap();
        assert_eq!(selector.len(), 7);
        assert_eq!(selector.fields()[0], FlowField::DestinationMac);
        assert_eq!(selector.fields()[3], FlowField::DestinationPort);

        let d = descriptor();
        assert_eq!(
            selector.label_values(&d).as_slice(),
            &["aa:bb:cc:dd:ee:ff", "10.0.0.1", "10.0.0.2", "443", "TCP", "SYN", "none"]
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = FieldSelector::with_exclusions(&["src_mac"]).unwrap_err();
        assert_eq!(err, FieldError::UnknownField("src_mac".into()));
        assert!(err.to_string().contains("src_mac"));
    }

    #[test]
    fn excluding_everything_gives_empty_selector() {
        let names: Vec<&str> = FlowField::ALL.iter().map(|f| f.label()).collect();
        let selector = FieldSelector::with_exclusions(&names).unwrap();
        assert!(selector.is_empty());
        assert!(selector.label_values(&descriptor()).as_slice().is_empty());
    }

    #[test]
    fn label_lookup_ignores_case_and_whitespace() {
        assert_eq!(FlowField::from_label(" TLSVersion "), Some(FlowField::TlsVersion));
        assert_eq!(FlowField::from_label("tcpFlags"), None);
        assert_eq!(FlowField::from_label("tls_version"), None);
    }

    #[test]
    fn exclude_list_uses_exported_label_names() {
        let selector = FieldSelector::with_exclusions(&["sourceMAC", "destinationIP"]).unwrap();
        assert_eq!(selector.len(), 7);
        assert!(!selector.label_names().contains(&"sourceMAC"));
        assert!(!selector.label_names().contains(&"destinationIP"));
        assert_eq!(selector.label_names()[0], "destinationMAC");
    }
}
