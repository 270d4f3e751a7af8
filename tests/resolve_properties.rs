//! Property-based tests for defaulting and determinism.

mod fixtures;

use pagecheck_config::config::{
    default_settings, normalize_pass, ConfigJson, GathererRef, PassDefaults, PassJson,
    SettingsJson,
};
use proptest::prelude::*;
use serde_json::json;

use fixtures::{resolver, GATHERERS};

fn gatherers_strategy() -> impl Strategy<Value = Vec<GathererRef>> {
    let names: Vec<&'static str> = GATHERERS.iter().map(|(name, _)| *name).collect();
    prop::sample::subsequence(names, 1..5)
        .prop_map(|names| names.into_iter().map(GathererRef::name).collect())
}

fn pass_strategy() -> impl Strategy<Value = PassJson> {
    (
        proptest::option::of("[a-z]{1,12}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0u64..60_000),
        proptest::option::of(0u64..60_000),
        proptest::option::of(0u64..60_000),
        proptest::option::of(prop::collection::vec("[a-z*./]{1,16}", 0..3)),
        proptest::option::of(0u64..5_000),
        gatherers_strategy(),
    )
        .prop_map(
            |(
                pass_name,
                record_trace,
                use_throttling,
                pause_after_load_ms,
                network_quiet_threshold_ms,
                cpu_quiet_threshold_ms,
                blocked_url_patterns,
                blank_duration,
                gatherers,
            )| PassJson {
                pass_name,
                record_trace,
                use_throttling,
                pause_after_load_ms,
                network_quiet_threshold_ms,
                cpu_quiet_threshold_ms,
                blocked_url_patterns,
                blank_page: None,
                blank_duration,
                gatherers,
                rejected: Vec::new(),
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Omitted pass fields take the template value, supplied ones are kept.
    #[test]
    fn pass_fields_are_explicit_or_default(json in pass_strategy()) {
        let defaults = PassDefaults::default();
        let pass = normalize_pass(&json, &resolver()).expect("fixture gatherers resolve");

        prop_assert_eq!(&pass.pass_name, json.pass_name.as_ref().unwrap_or(&defaults.pass_name));
        prop_assert_eq!(pass.record_trace, json.record_trace.unwrap_or(defaults.record_trace));
        prop_assert_eq!(pass.use_throttling, json.use_throttling.unwrap_or(defaults.use_throttling));
        prop_assert_eq!(
            pass.pause_after_load_ms,
            json.pause_after_load_ms.unwrap_or(defaults.pause_after_load_ms)
        );
        prop_assert_eq!(
            pass.network_quiet_threshold_ms,
            json.network_quiet_threshold_ms.unwrap_or(defaults.network_quiet_threshold_ms)
        );
        prop_assert_eq!(
            pass.cpu_quiet_threshold_ms,
            json.cpu_quiet_threshold_ms.unwrap_or(defaults.cpu_quiet_threshold_ms)
        );
        prop_assert_eq!(
            &pass.blocked_url_patterns,
            json.blocked_url_patterns.as_ref().unwrap_or(&defaults.blocked_url_patterns)
        );
        prop_assert_eq!(&pass.blank_page, &defaults.blank_page);
        prop_assert_eq!(pass.blank_duration, json.blank_duration.unwrap_or(defaults.blank_duration));
        prop_assert_eq!(pass.gatherers.len(), json.gatherers.len());
    }

    /// Resolving the same input twice gives equal results.
    #[test]
    fn resolution_is_deterministic(json in pass_strategy(), max_wait in 1u64..120_000) {
        let mut settings = SettingsJson::new();
        settings.insert("maxWaitForLoad".to_string(), json!(max_wait));
        let config = ConfigJson {
            settings: Some(settings),
            passes: Some(vec![json]),
            ..Default::default()
        };

        let resolver = resolver();
        let first = resolver.resolve(&config).expect("valid config resolves");
        let second = resolver.resolve(&config).expect("valid config resolves");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.config.settings.max_wait_for_load, max_wait);
    }

    /// Settings not supplied keep their canonical default.
    #[test]
    fn unsupplied_settings_keep_defaults(
        locale in proptest::option::of("[a-z]{2}-[A-Z]{2}"),
        audit_mode in proptest::option::of(any::<bool>()),
    ) {
        let mut settings = SettingsJson::new();
        if let Some(locale) = &locale {
            settings.insert("locale".to_string(), json!(locale));
        }
        if let Some(audit_mode) = audit_mode {
            settings.insert("auditMode".to_string(), json!(audit_mode));
        }
        let config = ConfigJson {
            settings: Some(settings),
            ..Default::default()
        };

        let resolved = resolver().resolve(&config).expect("valid settings resolve").config.settings;
        let defaults = default_settings();
        prop_assert_eq!(&resolved.locale, locale.as_ref().unwrap_or(&defaults.locale));
        prop_assert_eq!(resolved.audit_mode, audit_mode.unwrap_or(defaults.audit_mode));
        prop_assert_eq!(&resolved.throttling, &defaults.throttling);
        prop_assert_eq!(&resolved.channel, &defaults.channel);
    }
}
