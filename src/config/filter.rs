//! Run filter
//!
//! Narrows a resolved configuration to the categories and audits selected
//! by `onlyCategories`, `onlyAudits` and `skipAudits`, then drops the
//! gatherers nothing needs any more.

use std::collections::BTreeSet;
use tracing::debug;

use super::assemble::Config;
use super::warning::{ConfigWarning, WarningKind};

/// Apply the run filters in `config.settings`. A config without filters is
/// returned unchanged.
pub fn filter_config(mut config: Config, warnings: &mut Vec<ConfigWarning>) -> Config {
    if !config.settings.has_run_filter() {
        return config;
    }

    let settings = &config.settings;
    let only_categories: BTreeSet<String> = settings.only_categories.iter().cloned().collect();
    let only_audits: BTreeSet<String> = settings.only_audits.iter().cloned().collect();
    let skip_audits: BTreeSet<String> = settings.skip_audits.iter().cloned().collect();

    warn_on_filter_entries(&config, &only_categories, &only_audits, &skip_audits, warnings);

    let by_category = !only_categories.is_empty();
    let by_audit = !only_audits.is_empty();

    // listed audits run even when no category scores them
    let mut requested: BTreeSet<String> =
        only_audits.difference(&skip_audits).cloned().collect();
    config.categories.retain(|id, category| {
        let listed = only_categories.contains(id);
        if by_category && by_audit {
            if !listed {
                category.audits.retain(|m| only_audits.contains(&m.id));
            }
        } else if by_category {
            if !listed {
                category.audits.clear();
            }
        } else if by_audit {
            category.audits.retain(|m| only_audits.contains(&m.id));
        }
        category.audits.retain(|m| !skip_audits.contains(&m.id));

        requested.extend(category.audits.iter().map(|m| m.id.clone()));
        !category.audits.is_empty()
    });

    config.audits.retain(|audit| requested.contains(audit.id()));

    let needed = config.required_artifacts();
    let trace_needed = needed.contains("traces");
    config.passes.retain_mut(|pass| {
        pass.gatherers.retain(|g| needed.contains(g.artifact()));
        if !trace_needed {
            pass.record_trace = false;
        }
        !pass.gatherers.is_empty() || pass.record_trace
    });

    debug!(
        categories = config.categories.len(),
        audits = config.audits.len(),
        passes = config.passes.len(),
        "applied run filter"
    );
    config
}

fn warn_on_filter_entries(
    config: &Config,
    only_categories: &BTreeSet<String>,
    only_audits: &BTreeSet<String>,
    skip_audits: &BTreeSet<String>,
    warnings: &mut Vec<ConfigWarning>,
) {
    let audit_ids = config.audit_ids();

    for id in only_categories {
        if !config.categories.contains_key(id) {
            warnings.push(ConfigWarning::new(
                WarningKind::UnknownFilterEntry,
                format!("unrecognized category in onlyCategories: {}", id),
            ));
        }
    }
    for (setting, ids) in [("onlyAudits", only_audits), ("skipAudits", skip_audits)] {
        for id in ids {
            if !audit_ids.contains(id) {
                warnings.push(ConfigWarning::new(
                    WarningKind::UnknownFilterEntry,
                    format!("unrecognized audit in {}: {}", setting, id),
                ));
            }
        }
    }
    for id in only_audits.intersection(skip_audits) {
        warnings.push(ConfigWarning::new(
            WarningKind::ConflictingFilter,
            format!("{} is in both onlyAudits and skipAudits", id),
        ));
    }
}
