//! Device fingerprint generation

use sha2::{Digest, Sha256};
use txguard_core::DeviceContext;

const FIELD_SEPARATOR: &str = "|";

/// Derive a stable identifier for a reporting device.
///
/// SHA-256 over the lowercased user agent, IP, screen resolution, timezone and
/// language, in that order. Missing fields are empty strings.
pub fn fingerprint(device: &DeviceContext) -> String {
    let material = [
        device.user_agent.as_str(),
        device.ip.as_str(),
        device.screen_resolution.as_str(),
        device.timezone.as_str(),
        device.language.as_str(),
    ]
    .iter()
    .map(|field| field.trim().to_lowercase())
    .collect::<Vec<_>>()
    .join(FIELD_SEPARATOR);

    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}
