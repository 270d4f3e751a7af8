//! Gatherer resolver
//!
//! Turns any of the four reference shapes into one [`GathererDefn`].

use pagecheck_plugin::{
    check_gatherer, Gatherer, GathererFactory, InstanceFactory, ModuleKind, Options,
};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use super::assemble::ConfigResolver;
use super::error::ReferenceError;
use super::json::GathererRef;
use super::lookup::locate;
use super::merge::merge_options;

/// A resolved gatherer: where it came from, the instance to run, and its
/// options.
#[derive(Debug, Clone)]
pub struct GathererDefn {
    pub implementation: Arc<dyn GathererFactory>,
    pub instance: Arc<dyn Gatherer>,
    pub options: Options,
}

impl GathererDefn {
    /// Name of the artifact the instance produces.
    pub fn artifact(&self) -> &str {
        self.instance.name()
    }
}

impl PartialEq for GathererDefn {
    fn eq(&self, other: &Self) -> bool {
        self.implementation.name() == other.implementation.name()
            && self.instance.name() == other.instance.name()
            && self.instance.phases() == other.instance.phases()
            && self.options == other.options
    }
}

impl Serialize for GathererDefn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GathererDefn", 3)?;
        state.serialize_field("implementation", self.implementation.name())?;
        state.serialize_field("artifact", self.instance.name())?;
        state.serialize_field("options", &self.options)?;
        state.end()
    }
}

/// Resolve one gatherer reference.
pub fn resolve_gatherer(
    reference: &GathererRef,
    resolver: &ConfigResolver,
) -> Result<GathererDefn, ReferenceError> {
    let defn = match reference {
        GathererRef::Name(path) => from_path(path, &Options::new(), resolver)?,
        GathererRef::Path { path, options } => from_path(path, options, resolver)?,
        GathererRef::Implementation {
            implementation,
            options,
        } => GathererDefn {
            implementation: Arc::clone(implementation),
            instance: implementation.create(),
            options: options.clone(),
        },
        GathererRef::Instance { instance, options } => GathererDefn {
            implementation: Arc::new(InstanceFactory::new(Arc::clone(instance))),
            instance: Arc::clone(instance),
            options: options.clone(),
        },
    };

    check_gatherer(defn.instance.as_ref()).map_err(|e| ReferenceError::InvalidImplementation {
        kind: ModuleKind::Gatherer,
        reference: reference.label(),
        reason: e.to_string(),
    })?;

    Ok(defn)
}

fn from_path(
    path: &str,
    options: &Options,
    resolver: &ConfigResolver,
) -> Result<GathererDefn, ReferenceError> {
    let located = locate(ModuleKind::Gatherer, path, resolver, |registry, name| {
        registry.gatherer(name).cloned()
    })?;

    Ok(GathererDefn {
        instance: located.factory.create(),
        implementation: located.factory,
        options: merge_options(located.defaults, options.clone()),
    })
}
