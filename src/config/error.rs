//! Failure taxonomy for configuration resolution.
//!
//! Stages report typed errors; the assembler gathers every stage's errors
//! into one [`ResolveReport`] so a single attempt yields a full diagnostic.

use pagecheck_plugin::ModuleKind;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// A gatherer, audit, or evidence reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReferenceError {
    #[error("{kind} not found: {reference}")]
    NotFound { kind: ModuleKind, reference: String },

    #[error("{kind} reference {reference} is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        kind: ModuleKind,
        reference: String,
        candidates: Vec<String>,
    },

    #[error("invalid {kind} implementation for {reference}: {reason}")]
    InvalidImplementation {
        kind: ModuleKind,
        reference: String,
        reason: String,
    },

    #[error("failed to load {kind} module {reference}: {reason}")]
    LoadFailed {
        kind: ModuleKind,
        reference: String,
        reason: String,
    },

    #[error("evidence {key} could not be loaded from {}: {reason}", .path.display())]
    EvidenceUnavailable {
        key: String,
        path: PathBuf,
        reason: String,
    },
}

/// A structurally valid input whose object graph is inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("passes must have unique names (repeated passName: {pass_name})")]
    DuplicatePassName { pass_name: String },

    #[error("pass {pass_name} has no gatherers")]
    EmptyGatherers { pass_name: String },

    #[error("audit {audit_id} is configured more than once")]
    DuplicateAuditId { audit_id: String },

    #[error("category {category} is missing an audit id at member {index}")]
    MissingAuditId { category: String, index: usize },

    #[error("category {category} references unknown audit {audit_id}")]
    UnknownAudit { category: String, audit_id: String },

    #[error("category {category} member {audit_id} references unknown group {group}")]
    UnknownGroup {
        category: String,
        audit_id: String,
        group: String,
    },

    #[error("category {category} member {audit_id} has invalid weight {weight}")]
    InvalidWeight {
        category: String,
        audit_id: String,
        weight: f64,
    },

    #[error("group {group} is declared more than once")]
    DuplicateGroup { group: String },

    #[error("pass {pass_name} field {field} is invalid: {reason}")]
    InvalidPassField {
        pass_name: String,
        field: String,
        reason: String,
    },

    #[error("category {category} field {field} is invalid: {reason}")]
    InvalidCategoryField {
        category: String,
        field: String,
        reason: String,
    },

    /// `member` is the audit id, or `#<index>` when the id is unusable.
    #[error("category {category} member {member} field {field} is invalid: {reason}")]
    InvalidMemberField {
        category: String,
        member: String,
        field: String,
        reason: String,
    },
}

/// A malformed setting value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("setting {key} has an invalid value: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("setting {key} is out of range: {reason}")]
    OutOfRange { key: String, reason: String },
}

/// Any single resolution failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ResolveError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Reference(e) => match e {
                ReferenceError::NotFound { .. } => "REFERENCE_NOT_FOUND",
                ReferenceError::Ambiguous { .. } => "REFERENCE_AMBIGUOUS",
                ReferenceError::InvalidImplementation { .. } => "INVALID_IMPLEMENTATION",
                ReferenceError::LoadFailed { .. } => "MODULE_LOAD_FAILED",
                ReferenceError::EvidenceUnavailable { .. } => "EVIDENCE_UNAVAILABLE",
            },
            Self::Validation(e) => match e {
                ValidationError::DuplicatePassName { .. } => "DUPLICATE_PASS_NAME",
                ValidationError::EmptyGatherers { .. } => "EMPTY_GATHERERS",
                ValidationError::DuplicateAuditId { .. } => "DUPLICATE_AUDIT_ID",
                ValidationError::MissingAuditId { .. } => "MISSING_AUDIT_ID",
                ValidationError::UnknownAudit { .. } => "UNKNOWN_AUDIT",
                ValidationError::UnknownGroup { .. } => "UNKNOWN_GROUP",
                ValidationError::InvalidWeight { .. } => "INVALID_WEIGHT",
                ValidationError::DuplicateGroup { .. } => "DUPLICATE_GROUP",
                ValidationError::InvalidPassField { .. } => "INVALID_PASS_FIELD",
                ValidationError::InvalidCategoryField { .. }
                | ValidationError::InvalidMemberField { .. } => "INVALID_CATEGORY_FIELD",
            },
            Self::Settings(e) => match e {
                SettingsError::InvalidValue { .. } => "INVALID_SETTING",
                SettingsError::OutOfRange { .. } => "SETTING_OUT_OF_RANGE",
            },
        }
    }
}

/// Every failure from one resolution attempt, in stage order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveReport {
    errors: Vec<ResolveError>,
}

impl ResolveReport {
    pub(crate) fn new(errors: Vec<ResolveError>) -> Self {
        debug_assert!(!errors.is_empty(), "a report always carries a failure");
        Self { errors }
    }

    pub fn errors(&self) -> &[ResolveError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolveError> {
        self.errors.iter()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(ResolveError::code).collect()
    }

    pub fn into_errors(self) -> Vec<ResolveError> {
        self.errors
    }
}

impl fmt::Display for ResolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration is invalid ({} error{})",
            self.errors.len(),
            if self.errors.len() == 1 { "" } else { "s" }
        )?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveReport {}

impl IntoIterator for ResolveReport {
    type Item = ResolveError;
    type IntoIter = std::vec::IntoIter<ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Errors from resolving a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error(transparent)]
    Invalid(#[from] ResolveReport),
}

/// Stage output together with the failures met while producing it.
///
/// `value` holds whatever resolved cleanly, so later stages can still run.
#[derive(Debug)]
pub(crate) struct Staged<T> {
    pub value: T,
    pub errors: Vec<ResolveError>,
}

impl<T> Staged<T> {
    pub fn new(value: T, errors: Vec<ResolveError>) -> Self {
        Self { value, errors }
    }

    pub fn into_result(self) -> Result<T, Vec<ResolveError>> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors)
        }
    }

    /// Move the errors into `sink` and keep the value.
    pub fn drain_into(self, sink: &mut Vec<ResolveError>) -> T {
        sink.extend(self.errors);
        self.value
    }
}
