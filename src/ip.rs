//! IP address display masking
//!
//! Comments store the requester's IP address in full for moderation and
//! abuse prevention; the stored value is never exposed to page templates
//! directly. This module produces the display-safe form, computed on demand
//! and never persisted.

/// Mask the host portion of an IP address for display.
///
/// - IPv4 (four dot-separated segments): the last octet becomes `xxx`,
///   e.g. `192.168.1.100` → `192.168.1.xxx`.
/// - IPv6 (contains `:`): the final group becomes `xxxx`,
///   e.g. `2001:db8::1` → `2001:db8::xxxx`.
/// - Anything else is returned unchanged.
pub fn mask_ip(address: &str) -> String {
    if address.contains('.') {
        let segments: Vec<&str> = address.split('.').collect();
        if segments.len() == 4 {
            return format!("{}.{}.{}.xxx", segments[0], segments[1], segments[2]);
        }
    }

    if let Some(pos) = address.rfind(':') {
        return format!("{}:xxxx", &address[..pos]);
    }

    address.to_string()
}
