//! ## sniffy-protocols::tls
//! TLS record-layer parser.
//!
//! Only the 5-byte record headers are read (content type, protocol version,
//! length). Record bodies are skipped, never inspected, so a record truncated
//! by the snap length still yields its header.

use std::fmt;

use thiserror::Error;

/// TCP port whose payloads are treated as TLS.
pub const TLS_PORT: u16 = 443;

pub const CONTENT_CHANGE_CIPHER_SPEC: u8 = 20;
pub const CONTENT_ALERT: u8 = 21;
pub const CONTENT_HANDSHAKE: u8 = 22;
pub const CONTENT_APPLICATION_DATA: u8 = 23;

const RECORD_HEADER_LEN: usize = 5;

/// Errors that can occur while parsing TLS records.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TlsParseError {
    #[error("Insufficient data for a TLS record header")]
    InsufficientData,
    #[error("Unknown TLS content type {0}")]
    UnknownContentType(u8),
}

/// Record-layer protocol version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TlsVersion(pub u16);

impl TlsVersion {
    pub fn as_str(self) -> &'static str {
        match self.0 {
            0x0200 => "SSL 2.0",
            0x0300 => "SSL 3.0",
            0x0301 => "TLS 1.0",
            0x0302 => "TLS 1.1",
            0x0303 => "TLS 1.2",
            0x0304 => "TLS 1.3",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlsRecord {
    pub content_type: u8,
    pub version: TlsVersion,
    pub length: u16,
}

/// Records found in one TCP segment. The buffer is reused across frames.
#[derive(Clone, Debug, Default)]
pub struct TlsLayer {
    records: Vec<TlsRecord>,
}

impl TlsLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TlsRecord] {
        &self.records
    }

    /// Version of the first application-data record, if any.
    pub fn first_app_data(&self) -> Option<TlsVersion> {
        self.records
            .iter()
            .find(|r| r.content_type == CONTENT_APPLICATION_DATA)
            .map(|r| r.version)
    }

    /// Parses consecutive record headers from a TCP payload, replacing the
    /// previous contents. Fails only if not even the first record is valid;
    /// trailing garbage after valid records ends the scan.
    pub fn decode_from(&mut self, payload: &[u8]) -> Result<(), TlsParseError> {
        self.records.clear();
        let mut rest = payload;

        while !rest.is_empty() {
            if rest.len() < RECORD_HEADER_LEN {
                if self.records.is_empty() {
                    return Err(TlsParseError::InsufficientData);
                }
                break;
            }

            let content_type = rest[0];
            if !(CONTENT_CHANGE_CIPHER_SPEC..=CONTENT_APPLICATION_DATA).contains(&content_type) {
                if self.records.is_empty() {
                    return Err(TlsParseError::UnknownContentType(content_type));
                }
                break;
            }

            let version = TlsVersion(u16::from_be_bytes([rest[1], rest[2]]));
            let length = u16::from_be_bytes([rest[3], rest[4]]);
            self.records.push(TlsRecord {
                content_type,
                version,
                length,
            });

            let next = RECORD_HEADER_LEN + length as usize;
            if next >= rest.len() {
                break;
            }
            rest = &rest[next..];
        }

        if self.records.is_empty() {
            return Err(TlsParseError::InsufficientData);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content_type: u8, version: u16, body: &[u8]) -> Vec<u8> {
        let mut out = vec![content_type];
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn picks_first_application_data_record() {
        let mut payload = record(CONTENT_HANDSHAKE, 0x0301, &[1, 2, 3]);
        payload.extend(record(CONTENT_APPLICATION_DATA, 0x0303, b"secret"));
        payload.extend(record(CONTENT_APPLICATION_DATA, 0x0302, b"more"));

        let mut layer = TlsLayer::new();
        layer.decode_from(&payload).unwrap();
        assert_eq!(layer.records().len(), 3);
        assert_eq!(layer.first_app_data(), Some(TlsVersion(0x0303)));
        assert_eq!(layer.first_app_data().unwrap().as_str(), "TLS 1.2");
    }

    #[test]
    fn handshake_only_has_no_app_data() {
        let payload = record(CONTENT_HANDSHAKE, 0x0301, &[0u8; 40]);
        let mut layer = TlsLayer::new();
        layer.decode_from(&payload).unwrap();
        assert_eq!(layer.first_app_data(), None);
    }

    #[test]
    fn truncated_body_still_yields_header() {
        let mut payload = record(CONTENT_APPLICATION_DATA, 0x0303, &[0u8; 100]);
        payload.truncate(20);
        let mut layer = TlsLayer::new();
        layer.decode_from(&payload).unwrap();
        assert_eq!(layer.first_app_data(), Some(TlsVersion(0x0303)));
    }

    #[test]
    fn plain_http_is_rejected() {
        let mut layer = TlsLayer::new();
        assert_eq!(
            layer.decode_from(b"GET / HTTP/1.1\r\n"),
            Err(TlsParseError::UnknownContentType(b'G'))
        );
        assert_eq!(
            layer.decode_from(&[CONTENT_HANDSHAKE, 3]),
            Err(TlsParseError::InsufficientData)
        );
    }

    #[test]
    fn unknown_versions_have_a_name() {
        assert_eq!(TlsVersion(0x0304).to_string(), "TLS 1.3");
        assert_eq!(TlsVersion(0x7f1c).to_string(), "Unknown");
    }
}
