//! Audit resolver
//!
//! Audits are resolved to factories only; the scoring pipeline owns
//! instantiation.

use pagecheck_plugin::{check_audit, AuditFactory, AuditMeta, ModuleKind, Options};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::assemble::ConfigResolver;
use super::error::{ReferenceError, ResolveError, Staged, ValidationError};
use super::json::AuditRef;
use super::lookup::locate;
use super::merge::merge_options;

#[derive(Debug, Clone)]
pub struct AuditDefn {
    pub implementation: Arc<dyn AuditFactory>,
    pub options: Options,
}

impl AuditDefn {
    /// Id categories use to reference this audit.
    pub fn id(&self) -> &str {
        &self.implementation.meta().id
    }

    pub fn meta(&self) -> &AuditMeta {
        self.implementation.meta()
    }
}

impl PartialEq for AuditDefn {
    fn eq(&self, other: &Self) -> bool {
        self.meta() == other.meta() && self.options == other.options
    }
}

impl Serialize for AuditDefn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AuditDefn", 2)?;
        state.serialize_field("id", self.id())?;
        state.serialize_field("options", &self.options)?;
        state.end()
    }
}

/// Resolve one audit reference.
pub fn resolve_audit(
    reference: &AuditRef,
    resolver: &ConfigResolver,
) -> Result<AuditDefn, ReferenceError> {
    let (path, options) = match reference {
        AuditRef::Name(path) => (path.as_str(), Options::new()),
        AuditRef::Path { path, options } => (path.as_str(), options.clone()),
    };

    let located = locate(ModuleKind::Audit, path, resolver, |registry, name| {
        registry.audit(name).cloned()
    })?;

    check_audit(located.factory.as_ref()).map_err(|e| ReferenceError::InvalidImplementation {
        kind: ModuleKind::Audit,
        reference: path.to_string(),
        reason: e.to_string(),
    })?;

    Ok(AuditDefn {
        implementation: located.factory,
        options: merge_options(located.defaults, options),
    })
}

/// Resolve an audit list. Absent means none.
pub fn resolve_audits(
    refs: Option<&[AuditRef]>,
    resolver: &ConfigResolver,
) -> Result<Vec<AuditDefn>, Vec<ResolveError>> {
    resolve_audits_staged(refs, resolver).into_result()
}

pub(crate) fn resolve_audits_staged(
    refs: Option<&[AuditRef]>,
    resolver: &ConfigResolver,
) -> Staged<Vec<AuditDefn>> {
    let mut errors: Vec<ResolveError> = Vec::new();
    let mut audits: Vec<AuditDefn> = Vec::new();
    let mut seen = BTreeSet::new();

    for reference in refs.unwrap_or_default() {
        match resolve_audit(reference, resolver) {
            Ok(defn) => {
                if seen.insert(defn.id().to_string()) {
                    audits.push(defn);
                } else {
                    errors.push(
                        ValidationError::DuplicateAuditId {
                            audit_id: defn.id().to_string(),
                        }
                        .into(),
                    );
                }
            }
            Err(e) => errors.push(e.into()),
        }
    }

    Staged::new(audits, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecheck_plugin::Registry;
    use serde_json::json;

    #[derive(Debug)]
    struct MetaAudit(AuditMeta);

    impl AuditFactory for MetaAudit {
        fn meta(&self) -> &AuditMeta {
            &self.0
        }
    }

    fn fcp() -> Arc<dyn AuditFactory> {
        Arc::new(MetaAudit(
            AuditMeta::new(
                "first-contentful-paint",
                "First Contentful Paint",
                "Marks the first paint.",
            )
            .with_failure_title("First Contentful Paint is slow")
            .with_required_artifacts(["traces", "devtoolsLogs"]),
        ))
    }

    fn resolver() -> ConfigResolver {
        let registry = Registry::builder()
            .audit("metrics/first-contentful-paint", fcp())
            .audit("fcp-alias", fcp())
            .audit(
                "untitled",
                Arc::new(MetaAudit(AuditMeta::new("untitled", "", "No title."))),
            )
            .build()
            .unwrap();
        ConfigResolver::new(registry)
    }

    #[test]
    fn test_short_name_resolves_to_meta_id() {
        let reference = AuditRef::name("metrics/first-contentful-paint");
        let defn = resolve_audit(&reference, &resolver()).unwrap();
        assert_eq!(defn.id(), "first-contentful-paint");
        assert!(defn.options.is_empty());
    }

    #[test]
    fn test_path_options_carried() {
        let mut options = Options::new();
        options.insert("scorePODR".to_string(), json!(800));
        let defn = resolve_audit(
            &AuditRef::path("metrics/first-contentful-paint", options),
            &resolver(),
        )
        .unwrap();
        assert_eq!(defn.options["scorePODR"], 800);
    }

    #[test]
    fn test_incomplete_meta_rejected() {
        let err = resolve_audit(&AuditRef::name("untitled"), &resolver()).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::InvalidImplementation { kind: ModuleKind::Audit, ref reason, .. }
                if reason.contains("meta.title")
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let refs = vec![
            AuditRef::name("metrics/first-contentful-paint"),
            AuditRef::name("fcp-alias"),
        ];
        let errors = resolve_audits(Some(refs.as_slice()), &resolver()).unwrap_err();
        assert_eq!(
            errors,
            vec![ResolveError::from(ValidationError::DuplicateAuditId {
                audit_id: "first-contentful-paint".to_string(),
            })]
        );
    }

    #[test]
    fn test_absent_list_is_empty() {
        assert!(resolve_audits(None, &resolver()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_audit_not_found() {
        let refs = vec![AuditRef::name("seo/none"), AuditRef::name("seo/other")];
        let errors = resolve_audits(Some(refs.as_slice()), &resolver()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
