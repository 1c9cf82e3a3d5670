//! Device analyzer
//!
//! Registers the device fingerprint in the user's device set, then scores the
//! set size, first sightings, automation user agents and private source IPs.

use super::{AnalysisContext, RiskAnalyzer};
use crate::error::Result;
use crate::storage::AssessmentStore;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use txguard_core::{RiskFactor, RiskFactorResult};

const TOO_MANY_DEVICES_POINTS: f64 = 0.6;
const NEW_DEVICE_POINTS: f64 = 0.3;
const BOT_AGENT_POINTS: f64 = 0.8;
const PRIVATE_IP_POINTS: f64 = 0.4;
const DEVICE_UNAVAILABLE_POINTS: f64 = 0.3;

const BOT_MARKERS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scraper",
    "headless",
    "selenium",
    "puppeteer",
    "phantomjs",
    "curl",
    "wget",
    "python-requests",
];

/// Whether a user agent carries an automation marker
pub fn is_bot_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    BOT_MARKERS.iter().any(|marker| ua.contains(marker))
}

/// Whether an address is private, loopback, link-local or otherwise reserved.
///
/// Unparseable input is not treated as private.
pub fn is_private_ip(ip: &str) -> bool {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // 100.64.0.0/10, carrier-grade NAT
                || (a == 100 && (64..128).contains(&b))
        }
        Ok(IpAddr::V6(v6)) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
        Err(_) => false,
    }
}

/// Scores the reporting device
pub struct DeviceAnalyzer {
    store: Arc<dyn AssessmentStore>,
}

impl DeviceAnalyzer {
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self { store }
    }

    /// Register the fingerprint, returning (is_new, device_count)
    async fn register(&self, user_id: &str, fingerprint: &str) -> Result<(bool, usize)> {
        let is_new = self.store.add_device_fingerprint(user_id, fingerprint).await?;
        let count = self.store.count_devices(user_id).await?;
        Ok((is_new, count))
    }
}

#[async_trait]
impl RiskAnalyzer for DeviceAnalyzer {
    fn factor(&self) -> RiskFactor {
        RiskFactor::Device
    }

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult> {
        let user_id = &ctx.transaction.user_id;
        let mut result = RiskFactorResult::new();

        match self.register(user_id, &ctx.fingerprint).await {
            Ok((is_new, count)) => {
                if count > ctx.rules.max_devices_per_user as usize {
                    result.add(
                        TOO_MANY_DEVICES_POINTS,
                        "Too many devices associated with user",
                    );
                }
                if is_new {
                    tracing::debug!("New device for user {}", user_id);
                    result.add(NEW_DEVICE_POINTS, "New device detected");
                }
            }
            Err(e) => {
                tracing::warn!("Device set unavailable for user {}: {}", user_id, e);
                result.add_degraded(
                    DEVICE_UNAVAILABLE_POINTS,
                    "Unable to verify device information",
                );
            }
        }

        if is_bot_user_agent(&ctx.device.user_agent) {
            result.add(BOT_AGENT_POINTS, "Bot-like user agent detected");
        }

        if is_private_ip(&ctx.device.ip) {
            result.add(PRIVATE_IP_POINTS, "Private IP address detected");
        }

        Ok(result.finish())
    }
}
