//! Local interface address discovery.
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

const SYSFS_NET: &str = "/sys/class/net";

/// Hardware address of `interface`, lowercase and colon separated, as
/// reported by sysfs. `None` when it cannot be read or is all zeros
/// (loopback, tunnels).
pub fn local_mac(interface: &str) -> Option<String> {
    local_mac_in(Path::new(SYSFS_NET), interface)
}

pub(crate) fn local_mac_in(root: &Path, interface: &str) -> Option<String> {
    let path = root.join(interface).join("address");
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read interface address");
            return None;
        }
    };

    let mac = raw.trim().to_ascii_lowercase();
    if mac.is_empty() || mac == "00:00:00:00:00:00" {
        debug!(interface, "Interface has no hardware address");
        return None;
    }
    Some(mac)
}
