//! Pass normalizer
//!
//! Fills every omitted pass field from [`PassDefaults`] and resolves the
//! pass's gatherers in their original order.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use super::assemble::ConfigResolver;
use super::defaults::{default_passes, PassDefaults};
use super::error::{ResolveError, Staged, ValidationError};
use super::gatherer::{resolve_gatherer, GathererDefn};
use super::json::PassJson;

/// A fully populated pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    pub pass_name: String,
    pub record_trace: bool,
    pub use_throttling: bool,
    pub pause_after_load_ms: u64,
    pub network_quiet_threshold_ms: u64,
    pub cpu_quiet_threshold_ms: u64,
    pub blocked_url_patterns: Vec<String>,
    pub blank_page: String,
    pub blank_duration: u64,
    /// Empty only when the run filter kept the pass for its trace.
    pub gatherers: Vec<GathererDefn>,
}

impl Pass {
    /// Artifact names this pass gathers, in gatherer order.
    pub fn artifacts(&self) -> impl Iterator<Item = &str> {
        self.gatherers.iter().map(GathererDefn::artifact)
    }
}

/// Normalize one pass. Every failing gatherer is reported.
pub fn normalize_pass(
    json: &PassJson,
    resolver: &ConfigResolver,
) -> Result<Pass, Vec<ResolveError>> {
    let defaults = PassDefaults::default();
    let pass_name = json.pass_name.clone().unwrap_or(defaults.pass_name);

    let mut errors: Vec<ResolveError> = json
        .rejected
        .iter()
        .map(|r| {
            ResolveError::from(ValidationError::InvalidPassField {
                pass_name: pass_name.clone(),
                field: r.field.clone(),
                reason: r.reason.clone(),
            })
        })
        .collect();

    // a list of only malformed entries is already reported
    let gatherers_rejected = json.rejected.iter().any(|r| r.field.starts_with("gatherers"));
    if json.gatherers.is_empty() && !gatherers_rejected {
        errors.push(
            ValidationError::EmptyGatherers {
                pass_name: pass_name.clone(),
            }
            .into(),
        );
    }

    let mut gatherers = Vec::with_capacity(json.gatherers.len());
    for reference in &json.gatherers {
        match resolve_gatherer(reference, resolver) {
            Ok(defn) => gatherers.push(defn),
            Err(e) => errors.push(e.into()),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    debug!(pass = %pass_name, gatherers = gatherers.len(), "normalized pass");
    Ok(Pass {
        pass_name,
        record_trace: json.record_trace.unwrap_or(defaults.record_trace),
        use_throttling: json.use_throttling.unwrap_or(defaults.use_throttling),
        pause_after_load_ms: json.pause_after_load_ms.unwrap_or(defaults.pause_after_load_ms),
        network_quiet_threshold_ms: json
            .network_quiet_threshold_ms
            .unwrap_or(defaults.network_quiet_threshold_ms),
        cpu_quiet_threshold_ms: json
            .cpu_quiet_threshold_ms
            .unwrap_or(defaults.cpu_quiet_threshold_ms),
        blocked_url_patterns: json
            .blocked_url_patterns
            .clone()
            .unwrap_or(defaults.blocked_url_patterns),
        blank_page: json.blank_page.clone().unwrap_or(defaults.blank_page),
        blank_duration: json.blank_duration.unwrap_or(defaults.blank_duration),
        gatherers,
    })
}

/// Normalize a pass list, substituting the default pass set when it is
/// absent or empty.
pub fn normalize_passes(
    passes: Option<&[PassJson]>,
    resolver: &ConfigResolver,
) -> Result<Vec<Pass>, Vec<ResolveError>> {
    normalize_passes_staged(passes, resolver).into_result()
}

pub(crate) fn normalize_passes_staged(
    passes: Option<&[PassJson]>,
    resolver: &ConfigResolver,
) -> Staged<Vec<Pass>> {
    let substituted;
    let passes = match passes {
        Some(passes) if !passes.is_empty() => passes,
        _ => {
            debug!("no passes configured, using the default pass set");
            substituted = default_passes();
            &substituted[..]
        }
    };

    let mut errors = Vec::new();
    let mut resolved = Vec::with_capacity(passes.len());
    for json in passes {
        match normalize_pass(json, resolver) {
            Ok(pass) => resolved.push(pass),
            Err(e) => errors.extend(e),
        }
    }

    let default_name = PassDefaults::default().pass_name;
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for json in passes {
        let name = json.pass_name.as_deref().unwrap_or(&default_name);
        if !seen.insert(name) && reported.insert(name) {
            errors.push(
                ValidationError::DuplicatePassName {
                    pass_name: name.to_string(),
                }
                .into(),
            );
        }
    }

    Staged::new(resolved, errors)
}
