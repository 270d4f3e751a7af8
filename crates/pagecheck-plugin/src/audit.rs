//! Audit capability traits and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CapabilityError;

/// How an audit's score is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreDisplayMode {
    #[default]
    Binary,
    Numeric,
    Manual,
    Informative,
    NotApplicable,
}

impl ScoreDisplayMode {
    /// Scored modes must describe their failing state.
    pub fn requires_failure_title(&self) -> bool {
        matches!(self, Self::Binary | Self::Numeric)
    }
}

/// Static description of an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMeta {
    /// Id that categories reference.
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_title: Option<String>,

    pub description: String,

    /// Artifact names the audit reads.
    #[serde(default)]
    pub required_artifacts: Vec<String>,

    #[serde(default)]
    pub score_display_mode: ScoreDisplayMode,
}

impl AuditMeta {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            failure_title: None,
            description: description.into(),
            required_artifacts: Vec::new(),
            score_display_mode: ScoreDisplayMode::default(),
        }
    }

    pub fn with_failure_title(mut self, failure_title: impl Into<String>) -> Self {
        self.failure_title = Some(failure_title.into());
        self
    }

    pub fn with_required_artifacts<I, S>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_artifacts = artifacts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display_mode(mut self, mode: ScoreDisplayMode) -> Self {
        self.score_display_mode = mode;
        self
    }
}

/// Something that can produce audits.
///
/// Audits are instantiated by the scoring pipeline, so configuration only
/// ever holds the factory.
pub trait AuditFactory: fmt::Debug + Send + Sync {
    fn meta(&self) -> &AuditMeta;
}

/// Check that an audit factory exposes complete metadata.
pub fn check_audit(factory: &dyn AuditFactory) -> Result<(), CapabilityError> {
    let meta = factory.meta();
    let audit = if meta.id.trim().is_empty() {
        "<unnamed>".to_string()
    } else {
        meta.id.clone()
    };
    let missing = |field: &'static str| CapabilityError::MissingMeta {
        audit: audit.clone(),
        field,
    };

    if meta.id.trim().is_empty() {
        return Err(missing("id"));
    }
    if meta.title.trim().is_empty() {
        return Err(missing("title"));
    }
    if meta.description.trim().is_empty() {
        return Err(missing("description"));
    }
    if meta.score_display_mode.requires_failure_title()
        && meta
            .failure_title
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
    {
        return Err(missing("failureTitle"));
    }
    Ok(())
}
