//! Run settings and the settings merger.
//!
//! The merger starts from the canonical defaults record and overlays user
//! keys one field at a time, so every value in the result is either a
//! supplied value or a traceable default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::defaults::default_settings;
use super::error::{SettingsError, Staged};
use super::json::SettingsJson;
use super::warning::{ConfigWarning, WarningKind};

/// Extra request headers, name to value.
pub type ExtraHeaders = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Json,
    Html,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottlingMethod {
    Devtools,
    Simulate,
    Provided,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottlingSettings {
    pub rtt_ms: f64,
    pub throughput_kbps: f64,
    pub request_latency_ms: f64,
    pub download_throughput_kbps: f64,
    pub upload_throughput_kbps: f64,
    pub cpu_slowdown_multiplier: f64,
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub output: OutputMode,
    /// Milliseconds to wait for page load before giving up.
    pub max_wait_for_load: u64,
    pub throttling_method: ThrottlingMethod,
    pub throttling: ThrottlingSettings,
    pub audit_mode: bool,
    pub gather_mode: bool,
    pub disable_storage_reset: bool,
    pub disable_device_emulation: bool,
    pub locale: String,
    pub blocked_url_patterns: Vec<String>,
    /// Comma-separated trace categories, empty for none.
    pub additional_trace_categories: String,
    pub extra_headers: ExtraHeaders,
    /// Empty means no filter.
    pub only_audits: Vec<String>,
    /// Empty means no filter.
    pub only_categories: Vec<String>,
    pub skip_audits: Vec<String>,
    pub channel: String,
}

impl Default for Settings {
    fn default() -> Self {
        default_settings()
    }
}

impl Settings {
    /// Layer user values over the defaults.
    ///
    /// Type errors and range errors are all collected. Unknown keys only
    /// produce warnings.
    pub fn merge(
        user: Option<&SettingsJson>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Settings, Vec<SettingsError>> {
        let (settings, errors) = merge_fields(user, warnings);
        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(errors)
        }
    }

    /// True when any of the run filters is set.
    pub fn has_run_filter(&self) -> bool {
        !(self.only_audits.is_empty()
            && self.only_categories.is_empty()
            && self.skip_audits.is_empty())
    }
}

/// Merge and keep defaults in place of rejected values.
pub(crate) fn merge_staged(
    user: Option<&SettingsJson>,
    warnings: &mut Vec<ConfigWarning>,
) -> Staged<Settings> {
    let (settings, errors) = merge_fields(user, warnings);
    Staged::new(settings, errors.into_iter().map(Into::into).collect())
}

fn merge_fields(
    user: Option<&SettingsJson>,
    warnings: &mut Vec<ConfigWarning>,
) -> (Settings, Vec<SettingsError>) {
    let mut settings = default_settings();
    let mut errors: Vec<SettingsError> = Vec::new();

    if let Some(user) = user {
        for (key, value) in user {
            // null reads as "not supplied"
            if value.is_null() {
                continue;
            }
            let applied = match key.as_str() {
                "output" => apply(&mut settings.output, key, value, &mut errors),
                "maxWaitForLoad" => apply(&mut settings.max_wait_for_load, key, value, &mut errors),
                "throttlingMethod" => {
                    apply(&mut settings.throttling_method, key, value, &mut errors)
                }
                "throttling" => {
                    merge_throttling(&mut settings.throttling, value, &mut errors, warnings)
                }
                "auditMode" => apply(&mut settings.audit_mode, key, value, &mut errors),
                "gatherMode" => apply(&mut settings.gather_mode, key, value, &mut errors),
                "disableStorageReset" => {
                    apply(&mut settings.disable_storage_reset, key, value, &mut errors)
                }
                "disableDeviceEmulation" => {
                    apply(&mut settings.disable_device_emulation, key, value, &mut errors)
                }
                "locale" => apply(&mut settings.locale, key, value, &mut errors),
                "blockedUrlPatterns" => {
                    apply(&mut settings.blocked_url_patterns, key, value, &mut errors)
                }
                "additionalTraceCategories" => {
                    apply(&mut settings.additional_trace_categories, key, value, &mut errors)
                }
                "extraHeaders" => apply(&mut settings.extra_headers, key, value, &mut errors),
                "onlyAudits" => apply(&mut settings.only_audits, key, value, &mut errors),
                "onlyCategories" => apply(&mut settings.only_categories, key, value, &mut errors),
                "skipAudits" => apply(&mut settings.skip_audits, key, value, &mut errors),
                "channel" => apply(&mut settings.channel, key, value, &mut errors),
                _ => {
                    warnings.push(ConfigWarning::new(
                        WarningKind::UnknownSetting,
                        format!("unknown setting {} ignored", key),
                    ));
                    false
                }
            };
            if applied {
                debug!(setting = %key, "applied settings override");
            }
        }
    }

    check_ranges(&settings, &mut errors);
    (settings, errors)
}

/// Deserialize `value` into `slot`, or record why it does not fit.
fn apply<T: DeserializeOwned>(
    slot: &mut T,
    key: &str,
    value: &Value,
    errors: &mut Vec<SettingsError>,
) -> bool {
    match T::deserialize(value) {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(e) => {
            errors.push(SettingsError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            });
            false
        }
    }
}

fn merge_throttling(
    throttling: &mut ThrottlingSettings,
    value: &Value,
    errors: &mut Vec<SettingsError>,
    warnings: &mut Vec<ConfigWarning>,
) -> bool {
    let Some(fields) = value.as_object() else {
        errors.push(SettingsError::InvalidValue {
            key: "throttling".to_string(),
            reason: "expected an object".to_string(),
        });
        return false;
    };

    let mut applied = false;
    for (field, value) in fields {
        if value.is_null() {
            continue;
        }
        let key = format!("throttling.{}", field);
        let slot = match field.as_str() {
            "rttMs" => &mut throttling.rtt_ms,
            "throughputKbps" => &mut throttling.throughput_kbps,
            "requestLatencyMs" => &mut throttling.request_latency_ms,
            "downloadThroughputKbps" => &mut throttling.download_throughput_kbps,
            "uploadThroughputKbps" => &mut throttling.upload_throughput_kbps,
            "cpuSlowdownMultiplier" => &mut throttling.cpu_slowdown_multiplier,
            _ => {
                warnings.push(ConfigWarning::new(
                    WarningKind::UnknownSetting,
                    format!("unknown setting {} ignored", key),
                ));
                continue;
            }
        };
        applied |= apply(slot, &key, value, errors);
    }
    applied
}

fn check_ranges(settings: &Settings, errors: &mut Vec<SettingsError>) {
    let mut out_of_range = |key: &str, reason: &str| {
        errors.push(SettingsError::OutOfRange {
            key: key.to_string(),
            reason: reason.to_string(),
        })
    };

    if settings.max_wait_for_load == 0 {
        out_of_range("maxWaitForLoad", "must be greater than 0");
    }

    let t = &settings.throttling;
    for (field, value) in [
        ("rttMs", t.rtt_ms),
        ("throughputKbps", t.throughput_kbps),
        ("requestLatencyMs", t.request_latency_ms),
        ("downloadThroughputKbps", t.download_throughput_kbps),
        ("uploadThroughputKbps", t.upload_throughput_kbps),
    ] {
        if !value.is_finite() || value < 0.0 {
            out_of_range(
                &format!("throttling.{}", field),
                "must be a finite, non-negative number",
            );
        }
    }
    if !t.cpu_slowdown_multiplier.is_finite() || t.cpu_slowdown_multiplier < 1.0 {
        out_of_range("throttling.cpuSlowdownMultiplier", "must be at least 1");
    }

    if settings.locale.trim().is_empty() {
        out_of_range("locale", "must not be empty");
    }
    if settings.extra_headers.keys().any(|name| name.trim().is_empty()) {
        out_of_range("extraHeaders", "header names must not be empty");
    }
}
