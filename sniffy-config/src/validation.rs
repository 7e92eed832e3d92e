// sniffy-config/src/validation.rs
//! Custom validation functions for configuration.
//!
//! Shared by the section modules through `#[validate(custom(...))]`.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref INTERFACE_RE: Regex = Regex::new("^[a-zA-Z0-9_.:@-]+$").unwrap();
    static ref MAC_RE: Regex =
        Regex::new("^[0-9a-fA-F]{2}([:-][0-9a-fA-F]{2}){5}$").unwrap();
}

/// Validate that an interface name follows Linux naming conventions.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    if !name.is_empty() && name.len() <= 15 && INTERFACE_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate a humantime duration string such as `10s` or `250ms`.
pub fn validate_duration(value: &str) -> Result<(), ValidationError> {
    match humantime::parse_duration(value.trim()) {
        Ok(d) if !d.is_zero() => Ok(()),
        Ok(_) => Err(ValidationError::new("zero_duration")),
        Err(_) => Err(ValidationError::new("invalid_duration")),
    }
}

/// Validate an optional MAC address override. Empty means auto-detect.
pub fn validate_mac_address(mac: &str) -> Result<(), ValidationError> {
    if mac.is_empty() || MAC_RE.is_match(mac) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_mac_address"))
    }
}
