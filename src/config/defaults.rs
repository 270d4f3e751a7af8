//! Built-in defaults
//!
//! One canonical record per entity type. Every default the resolver fills
//! in comes from here.

use serde::Serialize;
use std::collections::BTreeMap;

use super::json::{GathererRef, PassJson};
use super::settings::{OutputMode, Settings, ThrottlingMethod, ThrottlingSettings};

pub const DEFAULT_PASS_NAME: &str = "defaultPass";

pub const DEFAULT_MAX_WAIT_FOR_LOAD_MS: u64 = 45_000;

pub const DEFAULT_LOCALE: &str = "en-US";

pub const DEFAULT_CHANNEL: &str = "node";

/// DevTools throttling needs these adjustments to approximate simulated
/// network conditions.
pub const DEVTOOLS_RTT_ADJUSTMENT_FACTOR: f64 = 3.75;
pub const DEVTOOLS_THROUGHPUT_ADJUSTMENT_FACTOR: f64 = 0.9;

/// Artifacts every run produces without a dedicated gatherer.
pub const BASE_ARTIFACTS: &[&str] = &[
    "fetchTime",
    "RunWarnings",
    "UserAgent",
    "HostUserAgent",
    "NetworkUserAgent",
    "BenchmarkIndex",
    "URL",
    "Timing",
    "settings",
];

/// Artifacts recorded by any pass with `recordTrace` set.
pub const TRACE_ARTIFACTS: &[&str] = &["traces", "devtoolsLogs"];

/// Gatherers of the default pass, by built-in short name.
pub const DEFAULT_PASS_GATHERERS: &[&str] = &[
    "scripts",
    "css-usage",
    "viewport-dimensions",
    "runtime-exceptions",
    "console-messages",
    "accessibility",
    "image-usage",
    "link-elements",
    "meta-elements",
    "script-elements",
];

pub const OFFLINE_PASS_GATHERERS: &[&str] = &["service-worker", "offline", "start-url"];

pub const REDIRECT_PASS_GATHERERS: &[&str] = &["http-redirect", "html-without-javascript"];

/// Simulated mobile 3G network and a 4x CPU slowdown.
pub fn mobile_3g() -> ThrottlingSettings {
    ThrottlingSettings {
        rtt_ms: 150.0,
        throughput_kbps: 1.6 * 1024.0,
        request_latency_ms: 150.0 * DEVTOOLS_RTT_ADJUSTMENT_FACTOR,
        download_throughput_kbps: 1.6 * 1024.0 * DEVTOOLS_THROUGHPUT_ADJUSTMENT_FACTOR,
        upload_throughput_kbps: 750.0 * DEVTOOLS_THROUGHPUT_ADJUSTMENT_FACTOR,
        cpu_slowdown_multiplier: 4.0,
    }
}

/// The canonical settings record.
pub fn default_settings() -> Settings {
    Settings {
        output: OutputMode::Json,
        max_wait_for_load: DEFAULT_MAX_WAIT_FOR_LOAD_MS,
        throttling_method: ThrottlingMethod::Simulate,
        throttling: mobile_3g(),
        audit_mode: false,
        gather_mode: false,
        disable_storage_reset: false,
        disable_device_emulation: false,
        locale: DEFAULT_LOCALE.to_string(),
        blocked_url_patterns: Vec::new(),
        additional_trace_categories: String::new(),
        extra_headers: BTreeMap::new(),
        only_audits: Vec::new(),
        only_categories: Vec::new(),
        skip_audits: Vec::new(),
        channel: DEFAULT_CHANNEL.to_string(),
    }
}

/// The canonical pass template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDefaults {
    pub pass_name: String,
    pub record_trace: bool,
    pub use_throttling: bool,
    pub pause_after_load_ms: u64,
    pub network_quiet_threshold_ms: u64,
    pub cpu_quiet_threshold_ms: u64,
    pub blocked_url_patterns: Vec<String>,
    pub blank_page: String,
    pub blank_duration: u64,
}

impl Default for PassDefaults {
    fn default() -> Self {
        Self {
            pass_name: DEFAULT_PASS_NAME.to_string(),
            record_trace: false,
            use_throttling: false,
            pause_after_load_ms: 0,
            network_quiet_threshold_ms: 0,
            cpu_quiet_threshold_ms: 0,
            blocked_url_patterns: Vec::new(),
            blank_page: "about:blank".to_string(),
            blank_duration: 300,
        }
    }
}

fn refs(names: &[&str]) -> Vec<GathererRef> {
    names.iter().map(|name| GathererRef::name(*name)).collect()
}

/// Pass set substituted when a configuration declares none.
pub fn default_passes() -> Vec<PassJson> {
    vec![
        PassJson {
            record_trace: Some(true),
            use_throttling: Some(true),
            pause_after_load_ms: Some(1000),
            network_quiet_threshold_ms: Some(1000),
            cpu_quiet_threshold_ms: Some(1000),
            ..PassJson::new(DEFAULT_PASS_NAME, refs(DEFAULT_PASS_GATHERERS))
        },
        PassJson::new("offlinePass", refs(OFFLINE_PASS_GATHERERS)),
        PassJson::new("redirectPass", refs(REDIRECT_PASS_GATHERERS)),
    ]
}
