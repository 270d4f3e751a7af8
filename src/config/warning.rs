//! Non-fatal findings reported alongside a resolved configuration.

use serde::Serialize;
use std::fmt;

/// Machine-readable warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// A settings key the merger does not know.
    UnknownSetting,
    /// A gatherer whose artifact no audit requires.
    UnusedGatherer,
    /// An audit requires an artifact nothing provides.
    MissingArtifact,
    /// A manual audit carries positive category weight.
    ManualAuditWeighted,
    /// An id in onlyCategories, onlyAudits or skipAudits matches nothing.
    UnknownFilterEntry,
    /// An audit is listed in both onlyAudits and skipAudits.
    ConflictingFilter,
    /// Evidence keyed by a pass name that is not configured.
    UnmatchedEvidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let warning = ConfigWarning::new(WarningKind::UnknownSetting, "unknown setting foo");
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["kind"], "UNKNOWN_SETTING");
        assert_eq!(value["message"], "unknown setting foo");
        assert_eq!(warning.to_string(), "unknown setting foo");
    }
}
