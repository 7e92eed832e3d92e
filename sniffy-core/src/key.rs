//! ## sniffy-core::key
//! **Flow Key Codec**
//!
//! A flow key is the selected field values of one descriptor, each written as
//! a netstring (`<byte length>:<value>,`). Length prefixes make the encoding
//! injective whatever the values contain, so a key decodes back to exactly the
//! label values that produced it.
//!
//! ```text
//! fields [sourceIP, destinationPort], values ["10.0.0.1", "443"]
//! key    8:10.0.0.1,3:443,
//! ```

use std::borrow::Borrow;
use std::fmt::{self, Write};
use std::sync::Arc;

use thiserror::Error;

use crate::field::FieldSelector;
use crate::flow::FlowDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Malformed flow key at byte {offset}")]
    Malformed { offset: usize },
    #[error("Flow key has {found} fields, expected {expected}")]
    FieldCount { expected: usize, found: usize },
}

/// Opaque identity of a flow under the active field selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey(String);

impl FlowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for FlowKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for FlowKey {
    fn from(raw: String) -> Self {
        FlowKey(raw)
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes descriptors to keys and keys back to label values.
#[derive(Clone, Debug)]
pub struct KeyCodec {
    selector: Arc<FieldSelector>,
}

impl KeyCodec {
    pub fn new(selector: Arc<FieldSelector>) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    pub fn encode(&self, descriptor: &FlowDescriptor) -> FlowKey {
        let mut out = String::new();
        self.encode_into(descriptor, &mut out);
        FlowKey(out)
    }

    /// Writes the key into a caller-owned buffer, replacing its contents.
    pub fn encode_into(&self, descriptor: &FlowDescriptor, out: &mut String) {
        out.clear();
        for value in self.selector.label_values(descriptor).as_slice() {
            let _ = write!(out, "{}:{},", value.len(), value);
        }
    }

    /// Splits a key into its label values, in selector order.
    pub fn decode<'k>(&self, key: &'k str) -> Result<Vec<&'k str>, KeyError> {
        let expected = self.selector.len();
        let mut values = Vec::with_capacity(expected);
        let bytes = key.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            let colon = bytes[pos..]
                .iter()
                .position(|&b| b == b':')
                .map(|i| pos + i)
                .ok_or(KeyError::Malformed { offset: pos })?;

            let digits = &key[pos..colon];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(KeyError::Malformed { offset: pos });
            }
            let len: usize = digits
                .parse()
                .map_err(|_| KeyError::Malformed { offset: pos })?;

            let start = colon + 1;
            let end = start
                .checked_add(len)
                .filter(|&end| end < bytes.len() && bytes[end] == b',')
                .ok_or(KeyError::Malformed { offset: start })?;
            let value = key
                .get(start..end)
                .ok_or(KeyError::Malformed { offset: start })?;

            values.push(value);
            pos = end + 1;
        }

        if values.len() != expected {
            return Err(KeyError::FieldCount {
                expected,
                found: values.len(),
            });
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec(excluded: &[&str]) -> KeyCodec {
        KeyCodec::new(Arc::new(FieldSelector::with_exclusions(excluded).unwrap()))
    }

    fn descriptor() -> FlowDescriptor {
        FlowDescriptor {
            source_mac: "00:1a:2b:3c:4d:5e".into(),
            destination_mac: "aa:bb:cc:dd:ee:ff".into(),
            source_ip: "fe80::1".into(),
            destination_ip: "ff02::fb".into(),
            source_port: "5353".into(),
            destination_port: "5353".into(),
            layer4_protocol: "UDP",
            tcp_flag: "",
            tls_version: "none",
        }
    }

    #[test]
    fn encodes_selected_fields_as_netstrings() {
        let codec = codec(&[
            "sourceMAC",
            "destinationMAC",
            "sourcePort",
            "destinationPort",
            "tlsVersion",
        ]);
        let key = codec.encode(&descriptor());
        assert_eq!(key.as_str(), "7:fe80::1,8:ff02::fb,3:UDP,0:,");
    }

    #[test]
    fn decode_inverts_encode_with_empty_values() {
        let codec = codec(&[]);
        let d = descriptor();
        let key = codec.encode(&d);
        let values = codec.decode(key.as_str()).unwrap();
        assert_eq!(values, codec.selector().label_values(&d).as_slice());
        assert_eq!(values[7], "");
    }

    #[test]
    fn empty_selection_gives_empty_key() {
        let names: Vec<&str> = crate::field::FlowField::ALL.iter().map(|f| f.label()).collect();
        let codec = codec(&names);
        let key = codec.encode(&descriptor());
        assert_eq!(key.as_str(), "");
        assert!(codec.decode("").unwrap().is_empty());
    }

    #[test]
    fn encode_into_reuses_buffer() {
        let codec = codec(&[]);
        let mut buf = String::from("stale");
        codec.encode_into(&descriptor(), &mut buf);
        assert_eq!(buf, codec.encode(&descriptor()).into_string());
    }

    #[test]
    fn malformed_keys_are_rejected() {
        let codec = codec(&["sourceMAC", "destinationMAC", "sourceIP", "destinationIP"]);
        assert_eq!(codec.decode("abc"), Err(KeyError::Malformed { offset: 0 }));
        assert_eq!(codec.decode("x:1,"), Err(KeyError::Malformed { offset: 0 }));
        assert_eq!(codec.decode("5:ab,"), Err(KeyError::Malformed { offset: 2 }));
        assert_eq!(codec.decode("2:ab"), Err(KeyError::Malformed { offset: 2 }));
        assert_eq!(
            codec.decode("2:ab,"),
            Err(KeyError::FieldCount {
                expected: 5,
                found: 1
            })
        );
    }

    #[test]
    fn distinct_values_never_collide() {
        let codec = codec(&[
            "sourceMAC",
            "destinationMAC",
            "sourcePort",
            "destinationPort",
            "layer4Protocol",
            "tcpFlag",
            "tlsVersion",
        ]);
        let mut a = FlowDescriptor::new();
        a.source_ip = "a,b".into();
        a.destination_ip = "c".into();
        let mut b = FlowDescriptor::new();
        b.source_ip = "a".into();
        b.destination_ip = "b,c".into();
        assert_ne!(codec.encode(&a), codec.encode(&b));
    }

    fn arb_descriptor() -> impl Strategy<Value = FlowDescriptor> {
        (
            ".{0,20}",
            ".{0,20}",
            ".{0,40}",
            ".{0,40}",
            "[0-9:,]{0,6}",
            "[0-9:,]{0,6}",
            prop::sample::select(vec!["", "TCP", "UDP"]),
            prop::sample::select(vec!["", "SYN", "ACK", "nil"]),
            prop::sample::select(vec!["none", "TLS 1.2", "Unknown"]),
        )
            .prop_map(|(sm, dm, si, di, sp, dp, l4, flag, tls)| FlowDescriptor {
                source_mac: sm,
                destination_mac: dm,
                source_ip: si,
                destination_ip: di,
                source_port: sp,
                destination_port: dp,
                layer4_protocol: l4,
                tcp_flag: flag,
                tls_version: tls,
            })
    }

    proptest! {
        #[test]
        fn round_trip_for_any_values(d in arb_descriptor(), mask in 0u16..512) {
            let excluded: Vec<&str> = crate::field::FlowField::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| f.label())
                .collect();
            let codec = codec(&excluded);
            let key = codec.encode(&d);
            let decoded = codec.decode(key.as_str()).unwrap();
            let expected = codec.selector().label_values(&d);
            prop_assert_eq!(decoded.as_slice(), expected.as_slice());
        }

        #[test]
        fn equal_keys_mean_equal_values(a in arb_descriptor(), b in arb_descriptor()) {
            let codec = codec(&[]);
            let same_key = codec.encode(&a) == codec.encode(&b);
            let same_values = codec.selector().label_values(&a).as_slice()
                == codec.selector().label_values(&b).as_slice();
            prop_assert_eq!(same_key, same_values);
        }
    }
}
