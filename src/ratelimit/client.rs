//! Client identifier derivation.

/// Identifier shared by every client without address information.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Header carrying the proxy chain, client first.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// Header carrying a single client address set by the proxy.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Derive the bucket key for a request from its address headers.
///
/// Uses the first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// [`UNKNOWN_CLIENT`]. Empty header values count as missing. The result
/// is an opaque key and is not validated as an address.
pub fn client_identifier(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    if let Some(forwarded) = forwarded_for.filter(|v| !v.is_empty()) {
        // split always yields at least one item
        let first = forwarded.split(',').next().unwrap_or_default();
        return first.trim().to_string();
    }

    if let Some(real_ip) = real_ip.filter(|v| !v.is_empty()) {
        return real_ip.to_string();
    }

    UNKNOWN_CLIENT.to_string()
}
