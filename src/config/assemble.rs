//! Config assembler
//!
//! [`ConfigResolver`] runs every stage over the input tree, aggregates all
//! failures into one [`ResolveReport`], and on success applies the run
//! filter and the cross-stage checks.

use pagecheck_plugin::{ModuleLoader, NoopLoader, Registry, ScoreDisplayMode};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::artifacts::{load_artifacts_staged, Artifacts};
use super::audit::{resolve_audits_staged, AuditDefn};
use super::category::{resolve_groups_staged, validate_categories_staged, Category, Group};
use super::defaults::{BASE_ARTIFACTS, TRACE_ARTIFACTS};
use super::error::{ConfigError, ResolveReport};
use super::filter::filter_config;
use super::json::ConfigJson;
use super::pass::{normalize_passes_staged, Pass};
use super::settings::{merge_staged, Settings};
use super::source::{load_config_file, ConfigSource};
use super::warning::{ConfigWarning, WarningKind};

/// A fully resolved, internally consistent configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub settings: Settings,
    pub passes: Vec<Pass>,
    pub audits: Vec<AuditDefn>,
    pub categories: BTreeMap<String, Category>,
    pub groups: BTreeMap<String, Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,
}

impl Config {
    pub fn audit_ids(&self) -> BTreeSet<String> {
        self.audits.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn pass(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|p| p.pass_name == name)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Union of every audit's required artifacts.
    pub fn required_artifacts(&self) -> BTreeSet<String> {
        self.audits
            .iter()
            .flat_map(|a| a.meta().required_artifacts.iter().cloned())
            .collect()
    }

    /// Artifacts the configured passes produce, including trace artifacts
    /// when any pass records a trace.
    pub fn gathered_artifacts(&self) -> BTreeSet<String> {
        let mut gathered: BTreeSet<String> = self
            .passes
            .iter()
            .flat_map(|p| p.artifacts().map(str::to_string))
            .collect();
        if self.passes.iter().any(|p| p.record_trace) {
            gathered.extend(TRACE_ARTIFACTS.iter().map(|a| a.to_string()));
        }
        gathered
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A resolved config, its warnings, and the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigSource>,
}

/// Resolves configurations against a registry and a module loader.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    registry: Arc<Registry>,
    loader: Arc<dyn ModuleLoader>,
    base_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(registry: impl Into<Arc<Registry>>) -> Self {
        Self {
            registry: registry.into(),
            loader: Arc::new(NoopLoader),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Directory relative evidence paths are taken from.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a configuration. Either every stage succeeds or every
    /// failure is reported.
    pub fn resolve(&self, json: &ConfigJson) -> Result<Resolution, ResolveReport> {
        self.resolve_in(json, &self.base_dir)
    }

    /// Resolve a `.json` or `.toml` config file. Evidence paths are
    /// relative to the file's directory.
    pub fn resolve_file(&self, path: &Path) -> Result<Resolution, ConfigError> {
        let (json, source) = load_config_file(path)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut resolution = self.resolve_in(&json, base_dir)?;
        info!(path = %source.path.display(), digest = %source.digest, "resolved config file");
        resolution.source = Some(source);
        Ok(resolution)
    }

    fn resolve_in(&self, json: &ConfigJson, base_dir: &Path) -> Result<Resolution, ResolveReport> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let settings =
            merge_staged(json.settings.as_ref(), &mut warnings).drain_into(&mut errors);
        let passes =
            normalize_passes_staged(json.passes.as_deref(), self).drain_into(&mut errors);
        let audits = resolve_audits_staged(json.audits.as_deref(), self).drain_into(&mut errors);
        let groups = resolve_groups_staged(json.groups.as_ref()).drain_into(&mut errors);

        let audit_ids: BTreeSet<String> = audits.iter().map(|a| a.id().to_string()).collect();
        let categories = validate_categories_staged(json.categories.as_ref(), &audit_ids, &groups)
            .drain_into(&mut errors);

        let artifacts = json
            .artifacts
            .as_ref()
            .map(|a| load_artifacts_staged(a, base_dir).drain_into(&mut errors));

        if !errors.is_empty() {
            warn!(errors = errors.len(), "configuration is invalid");
            return Err(ResolveReport::new(errors));
        }

        // evidence for a pass the run filter drops is still matched
        let configured: BTreeSet<String> = passes.iter().map(|p| p.pass_name.clone()).collect();
        let config = filter_config(
            Config {
                settings,
                passes,
                audits,
                categories,
                groups,
                artifacts,
            },
            &mut warnings,
        );
        check_consistency(&config, &configured, &mut warnings);

        for warning in &warnings {
            warn!(kind = ?warning.kind, "{}", warning.message);
        }
        info!(
            passes = config.passes.len(),
            audits = config.audits.len(),
            categories = config.categories.len(),
            warnings = warnings.len(),
            "resolved configuration"
        );

        Ok(Resolution {
            config,
            warnings,
            source: None,
        })
    }
}

/// Cross-stage findings that do not make a config invalid. `configured`
/// holds the pass names before the run filter.
fn check_consistency(
    config: &Config,
    configured: &BTreeSet<String>,
    warnings: &mut Vec<ConfigWarning>,
) {
    let required = config.required_artifacts();

    if !config.audits.is_empty() {
        for pass in &config.passes {
            for artifact in pass.artifacts() {
                if !required.contains(artifact) {
                    warnings.push(ConfigWarning::new(
                        WarningKind::UnusedGatherer,
                        format!(
                            "gatherer {} in pass {} is not required by any audit",
                            artifact, pass.pass_name
                        ),
                    ));
                }
            }
        }
    }

    let gathered = config.gathered_artifacts();
    for audit in &config.audits {
        for artifact in &audit.meta().required_artifacts {
            let available = BASE_ARTIFACTS.contains(&artifact.as_str())
                || gathered.contains(artifact)
                || config.artifacts.as_ref().is_some_and(|a| a.provides(artifact));
            if !available {
                warnings.push(ConfigWarning::new(
                    WarningKind::MissingArtifact,
                    format!(
                        "audit {} requires artifact {} which no pass gathers",
                        audit.id(),
                        artifact
                    ),
                ));
            }
        }
    }

    let manual: BTreeSet<&str> = config
        .audits
        .iter()
        .filter(|a| a.meta().score_display_mode == ScoreDisplayMode::Manual)
        .map(|a| a.id())
        .collect();
    for (category_id, category) in &config.categories {
        for member in &category.audits {
            if member.weight > 0.0 && manual.contains(member.id.as_str()) {
                warnings.push(ConfigWarning::new(
                    WarningKind::ManualAuditWeighted,
                    format!(
                        "manual audit {} carries weight {} in category {}",
                        member.id, member.weight, category_id
                    ),
                ));
            }
        }
    }

    if let Some(artifacts) = &config.artifacts {
        let unmatched: BTreeSet<&str> = artifacts
            .pass_names()
            .filter(|name| !configured.contains(*name))
            .collect();
        for name in unmatched {
            warnings.push(ConfigWarning::new(
                WarningKind::UnmatchedEvidence,
                format!("evidence keyed by unknown pass {}", name),
            ));
        }
    }
}
