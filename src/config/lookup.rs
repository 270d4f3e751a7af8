//! Shared lookup for path-shaped references.
//!
//! The registry is consulted first; anything it does not know is handed to
//! the module loader, whose manifest must alias a registered implementation
//! of the right kind.

use pagecheck_plugin::{LoadError, ModuleKind, Options, Registry};
use std::sync::Arc;
use tracing::debug;

use super::assemble::ConfigResolver;
use super::error::ReferenceError;

/// A factory found for a reference, plus the defaults its module declared.
#[derive(Debug)]
pub(crate) struct Located<F: ?Sized> {
    pub factory: Arc<F>,
    pub defaults: Options,
}

pub(crate) fn locate<F, L>(
    kind: ModuleKind,
    reference: &str,
    resolver: &ConfigResolver,
    from_registry: L,
) -> Result<Located<F>, ReferenceError>
where
    F: ?Sized,
    L: Fn(&Registry, &str) -> Option<Arc<F>>,
{
    if let Some(factory) = from_registry(resolver.registry(), reference) {
        debug!(%kind, reference, "resolved from registry");
        return Ok(Located {
            factory,
            defaults: Options::new(),
        });
    }

    let module = match resolver.loader().load(reference) {
        Ok(Some(module)) => module,
        Ok(None) => {
            return Err(ReferenceError::NotFound {
                kind,
                reference: reference.to_string(),
            })
        }
        Err(LoadError::Ambiguous { candidates, .. }) => {
            return Err(ReferenceError::Ambiguous {
                kind,
                reference: reference.to_string(),
                candidates: candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
            })
        }
        Err(e) => {
            return Err(ReferenceError::LoadFailed {
                kind,
                reference: reference.to_string(),
                reason: e.to_string(),
            })
        }
    };

    let manifest = module.manifest;
    if manifest.kind != kind {
        return Err(ReferenceError::InvalidImplementation {
            kind,
            reference: reference.to_string(),
            reason: format!(
                "module {} declares kind {}",
                module.path.display(),
                manifest.kind
            ),
        });
    }

    let factory = from_registry(resolver.registry(), &manifest.implementation).ok_or_else(|| {
        ReferenceError::InvalidImplementation {
            kind,
            reference: reference.to_string(),
            reason: format!(
                "module {} aliases unregistered {} {}",
                module.path.display(),
                kind,
                manifest.implementation
            ),
        }
    })?;

    debug!(
        %kind,
        reference,
        implementation = %manifest.implementation,
        path = %module.path.display(),
        "resolved through module manifest"
    );
    Ok(Located {
        factory,
        defaults: manifest.options,
    })
}
