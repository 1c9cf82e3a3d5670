//! Rule configuration
//!
//! Thresholds, limits and country sets the analyzers read. The values are data,
//! not logic: every field can be changed at runtime through a validated
//! [`RuleConfigPatch`].

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Runtime-mutable scoring rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    pub max_daily_transactions: u32,
    pub max_daily_amount: f64,
    pub max_single_transaction: f64,
    pub max_devices_per_user: u32,

    /// Trailing window for the burst check
    pub velocity_window_minutes: u32,

    /// More than this many transactions inside the window is a burst
    pub velocity_max_transactions: u32,

    /// Size of the per-user transaction history window
    pub history_limit: u32,

    pub round_amount_unit: f64,
    pub small_amount_threshold: f64,
    pub kyc_required_amount: f64,
    pub new_account_days: u32,

    /// Start of the suspicious window, local hour (inclusive)
    pub suspicious_start_hour: u32,

    /// End of the suspicious window, local hour (exclusive)
    pub suspicious_end_hour: u32,

    pub medium_risk_threshold: f64,
    pub high_risk_threshold: f64,

    /// Platform's primary operating country
    pub primary_country: String,

    pub allowed_countries: BTreeSet<String>,
    pub high_risk_countries: BTreeSet<String>,
}

fn country_set(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_daily_transactions: 10,
            max_daily_amount: 50_000.0,
            max_single_transaction: 10_000.0,
            max_devices_per_user: 5,
            velocity_window_minutes: 60,
            velocity_max_transactions: 3,
            history_limit: 24,
            round_amount_unit: 1_000.0,
            small_amount_threshold: 100.0,
            kyc_required_amount: 5_000.0,
            new_account_days: 7,
            suspicious_start_hour: 22,
            suspicious_end_hour: 6,
            medium_risk_threshold: 0.5,
            high_risk_threshold: 0.8,
            primary_country: "US".to_string(),
            allowed_countries: country_set(&[
                "US", "CA", "MX", "GB", "IE", "DE", "FR", "ES", "IT", "NL", "IN", "PH", "NG",
                "KE", "GH", "BR", "CO", "JP", "AU", "VN",
            ]),
            high_risk_countries: country_set(&["NG", "PH", "VN"]),
        }
    }
}

impl RuleConfig {
    pub fn is_allowed_country(&self, country: &str) -> bool {
        self.allowed_countries.contains(&country.trim().to_ascii_uppercase())
    }

    pub fn is_high_risk_country(&self, country: &str) -> bool {
        self.high_risk_countries
            .contains(&country.trim().to_ascii_uppercase())
    }

    /// Whether `hour` falls inside the suspicious window, handling wrap past midnight
    pub fn is_suspicious_hour(&self, hour: u32) -> bool {
        let (start, end) = (self.suspicious_start_hour, self.suspicious_end_hour);
        if start == end {
            false
        } else if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Check every field, e.g. after loading from a file
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("maxDailyTransactions", self.max_daily_transactions),
            ("maxDevicesPerUser", self.max_devices_per_user),
            ("velocityWindowMinutes", self.velocity_window_minutes),
            ("velocityMaxTransactions", self.velocity_max_transactions),
            ("historyLimit", self.history_limit),
            ("newAccountDays", self.new_account_days),
        ];
        for (field, value) in counts {
            check_count(field, value)?;
        }

        let amounts = [
            ("maxDailyAmount", self.max_daily_amount),
            ("maxSingleTransaction", self.max_single_transaction),
            ("roundAmountUnit", self.round_amount_unit),
            ("smallAmountThreshold", self.small_amount_threshold),
            ("kycRequiredAmount", self.kyc_required_amount),
        ];
        for (field, value) in amounts {
            check_amount(field, value)?;
        }

        check_hour("suspiciousStartHour", self.suspicious_start_hour)?;
        check_hour("suspiciousEndHour", self.suspicious_end_hour)?;
        check_thresholds(self.medium_risk_threshold, self.high_risk_threshold)?;
        check_country_code("primaryCountry", &self.primary_country)?;
        check_country_list("allowedCountries", &self.allowed_countries, false)?;
        check_country_list("highRiskCountries", &self.high_risk_countries, true)?;
        Ok(())
    }

    /// Apply every valid field of `patch`, skipping the invalid ones
    pub fn apply_patch(&mut self, patch: &RuleConfigPatch) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();
        for field in &patch.ignored {
            outcome.reject(field, "unknown field or wrong type".to_string());
        }

        macro_rules! apply {
            ($name:literal, $field:ident, $check:ident) => {
                if let Some(value) = patch.$field.clone() {
                    match $check($name, value.clone()) {
                        Ok(()) => {
                            self.$field = value;
                            outcome.applied.push($name.to_string());
                        }
                        Err(e) => outcome.reject($name, e.to_string()),
                    }
                }
            };
        }

        apply!("maxDailyTransactions", max_daily_transactions, check_count);
        apply!("maxDailyAmount", max_daily_amount, check_amount);
        apply!("maxSingleTransaction", max_single_transaction, check_amount);
        apply!("maxDevicesPerUser", max_devices_per_user, check_count);
        apply!("velocityWindowMinutes", velocity_window_minutes, check_count);
        apply!("velocityMaxTransactions", velocity_max_transactions, check_count);
        apply!("historyLimit", history_limit, check_count);
        apply!("roundAmountUnit", round_amount_unit, check_amount);
        apply!("smallAmountThreshold", small_amount_threshold, check_amount);
        apply!("kycRequiredAmount", kyc_required_amount, check_amount);
        apply!("newAccountDays", new_account_days, check_count);
        apply!("suspiciousStartHour", suspicious_start_hour, check_hour);
        apply!("suspiciousEndHour", suspicious_end_hour, check_hour);

        if patch.medium_risk_threshold.is_some() || patch.high_risk_threshold.is_some() {
            let medium = patch.medium_risk_threshold.unwrap_or(self.medium_risk_threshold);
            let high = patch.high_risk_threshold.unwrap_or(self.high_risk_threshold);
            match check_thresholds(medium, high) {
                Ok(()) => {
                    if patch.medium_risk_threshold.is_some() {
                        self.medium_risk_threshold = medium;
                        outcome.applied.push("mediumRiskThreshold".to_string());
                    }
                    if patch.high_risk_threshold.is_some() {
                        self.high_risk_threshold = high;
                        outcome.applied.push("highRiskThreshold".to_string());
                    }
                }
                Err(e) => {
                    if patch.medium_risk_threshold.is_some() {
                        outcome.reject("mediumRiskThreshold", e.to_string());
                    }
                    if patch.high_risk_threshold.is_some() {
                        outcome.reject("highRiskThreshold", e.to_string());
                    }
                }
            }
        }

        if let Some(code) = &patch.primary_country {
            match check_country_code("primaryCountry", code) {
                Ok(()) => {
                    self.primary_country = code.trim().to_ascii_uppercase();
                    outcome.applied.push("primaryCountry".to_string());
                }
                Err(e) => outcome.reject("primaryCountry", e.to_string()),
            }
        }

        if let Some(codes) = &patch.allowed_countries {
            let codes = normalize_countries(codes);
            match check_country_list("allowedCountries", &codes, false) {
                Ok(()) => {
                    self.allowed_countries = codes;
                    outcome.applied.push("allowedCountries".to_string());
                }
                Err(e) => outcome.reject("allowedCountries", e.to_string()),
            }
        }

        if let Some(codes) = &patch.high_risk_countries {
            let codes = normalize_countries(codes);
            match check_country_list("highRiskCountries", &codes, true) {
                Ok(()) => {
                    self.high_risk_countries = codes;
                    outcome.applied.push("highRiskCountries".to_string());
                }
                Err(e) => outcome.reject("highRiskCountries", e.to_string()),
            }
        }

        outcome
    }
}

/// Partial rule update as submitted by an administrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfigPatch {
    pub max_daily_transactions: Option<u32>,
    pub max_daily_amount: Option<f64>,
    pub max_single_transaction: Option<f64>,
    pub max_devices_per_user: Option<u32>,
    pub velocity_window_minutes: Option<u32>,
    pub velocity_max_transactions: Option<u32>,
    pub history_limit: Option<u32>,
    pub round_amount_unit: Option<f64>,
    pub small_amount_threshold: Option<f64>,
    pub kyc_required_amount: Option<f64>,
    pub new_account_days: Option<u32>,
    pub suspicious_start_hour: Option<u32>,
    pub suspicious_end_hour: Option<u32>,
    pub medium_risk_threshold: Option<f64>,
    pub high_risk_threshold: Option<f64>,
    pub primary_country: Option<String>,
    pub allowed_countries: Option<Vec<String>>,
    pub high_risk_countries: Option<Vec<String>>,

    /// Keys that were unknown or carried the wrong type
    #[serde(skip)]
    pub ignored: Vec<String>,
}

impl RuleConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a loose JSON object key by key.
    ///
    /// Unknown keys and keys with the wrong type are recorded in `ignored`
    /// instead of failing the whole patch.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut patch = Self::default();
        let Some(obj) = value.as_object() else {
            patch.ignored.push("<root>".to_string());
            return patch;
        };

        for (key, v) in obj {
            let known = match key.as_str() {
                "maxDailyTransactions" => set(&mut patch.max_daily_transactions, as_u32(v)),
                "maxDailyAmount" => set(&mut patch.max_daily_amount, v.as_f64()),
                "maxSingleTransaction" => set(&mut patch.max_single_transaction, v.as_f64()),
                "maxDevicesPerUser" => set(&mut patch.max_devices_per_user, as_u32(v)),
                "velocityWindowMinutes" => set(&mut patch.velocity_window_minutes, as_u32(v)),
                "velocityMaxTransactions" => {
                    set(&mut patch.velocity_max_transactions, as_u32(v))
                }
                "historyLimit" => set(&mut patch.history_limit, as_u32(v)),
                "roundAmountUnit" => set(&mut patch.round_amount_unit, v.as_f64()),
                "smallAmountThreshold" => set(&mut patch.small_amount_threshold, v.as_f64()),
                "kycRequiredAmount" => set(&mut patch.kyc_required_amount, v.as_f64()),
                "newAccountDays" => set(&mut patch.new_account_days, as_u32(v)),
                "suspiciousStartHour" => set(&mut patch.suspicious_start_hour, as_u32(v)),
                "suspiciousEndHour" => set(&mut patch.suspicious_end_hour, as_u32(v)),
                "mediumRiskThreshold" => set(&mut patch.medium_risk_threshold, v.as_f64()),
                "highRiskThreshold" => set(&mut patch.high_risk_threshold, v.as_f64()),
                "primaryCountry" => {
                    set(&mut patch.primary_country, v.as_str().map(str::to_string))
                }
                "allowedCountries" => set(&mut patch.allowed_countries, as_string_list(v)),
                "highRiskCountries" => set(&mut patch.high_risk_countries, as_string_list(v)),
                _ => false,
            };
            if !known {
                patch.ignored.push(key.clone());
            }
        }

        patch
    }

    pub fn with_max_daily_transactions(mut self, value: u32) -> Self {
        self.max_daily_transactions = Some(value);
        self
    }

    pub fn with_max_daily_amount(mut self, value: f64) -> Self {
        self.max_daily_amount = Some(value);
        self
    }

    pub fn with_max_single_transaction(mut self, value: f64) -> Self {
        self.max_single_transaction = Some(value);
        self
    }

    pub fn with_max_devices_per_user(mut self, value: u32) -> Self {
        self.max_devices_per_user = Some(value);
        self
    }

    pub fn with_allowed_countries(mut self, codes: Vec<String>) -> Self {
        self.allowed_countries = Some(codes);
        self
    }

    pub fn with_high_risk_countries(mut self, codes: Vec<String>) -> Self {
        self.high_risk_countries = Some(codes);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which fields of a patch were applied and which were rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub applied: Vec<String>,
    pub rejected: Vec<(String, String)>,
}

impl PatchOutcome {
    fn reject(&mut self, field: &str, reason: String) {
        log::warn!("Ignoring rule field '{}': {}", field, reason);
        self.rejected.push((field.to_string(), reason));
    }

    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn as_u32(value: &serde_json::Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn as_string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn normalize_countries(codes: &[String]) -> BTreeSet<String> {
    codes.iter().map(|c| c.trim().to_ascii_uppercase()).collect()
}

fn invalid(field: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_count(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(invalid(field, "must be greater than 0"));
    }
    Ok(())
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("must be a positive number, got {}", value)));
    }
    Ok(())
}

fn check_hour(field: &str, value: u32) -> Result<()> {
    if value > 23 {
        return Err(invalid(field, format!("hour must be in 0..=23, got {}", value)));
    }
    Ok(())
}

fn check_thresholds(medium: f64, high: f64) -> Result<()> {
    for (field, value) in [("mediumRiskThreshold", medium), ("highRiskThreshold", high)] {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(invalid(field, format!("must be in (0, 1], got {}", value)));
        }
    }
    if medium >= high {
        return Err(invalid(
            "mediumRiskThreshold",
            format!("must be below the high threshold ({} >= {})", medium, high),
        ));
    }
    Ok(())
}

fn check_country_code(field: &str, code: &str) -> Result<()> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(field, format!("'{}' is not a two-letter country code", code)));
    }
    Ok(())
}

/// An empty high-risk list just disables that signal; allowed countries
/// must name at least one destination.
fn check_country_list(field: &str, codes: &BTreeSet<String>, allow_empty: bool) -> Result<()> {
    if codes.is_empty() && !allow_empty {
        return Err(invalid(field, "must not be empty"));
    }
    for code in codes {
        check_country_code(field, code)?;
    }
    Ok(())
}
