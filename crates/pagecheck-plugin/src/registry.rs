//! Read-only name registry for built-in gatherers and audits.
//!
//! The registry is assembled once through [`RegistryBuilder`] and never
//! mutated afterwards; resolution only reads from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{AuditFactory, GathererFactory, ModuleKind};

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} {name} registered more than once")]
    Duplicate { kind: ModuleKind, name: String },

    #[error("{kind} registered with an empty name")]
    EmptyName { kind: ModuleKind },
}

/// Collects registrations, rejecting duplicate short names.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    gatherers: BTreeMap<String, Arc<dyn GathererFactory>>,
    audits: BTreeMap<String, Arc<dyn AuditFactory>>,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gatherer factory under a short name.
    pub fn gatherer(
        mut self,
        name: impl Into<String>,
        factory: Arc<dyn GathererFactory>,
    ) -> Self {
        let name = name.into();
        let taken = self.gatherers.contains_key(&name);
        if let Some(err) = check_name(ModuleKind::Gatherer, &name, taken) {
            self.errors.push(err);
        } else {
            self.gatherers.insert(name, factory);
        }
        self
    }

    /// Register an audit factory under a short name.
    pub fn audit(mut self, name: impl Into<String>, factory: Arc<dyn AuditFactory>) -> Self {
        let name = name.into();
        let taken = self.audits.contains_key(&name);
        if let Some(err) = check_name(ModuleKind::Audit, &name, taken) {
            self.errors.push(err);
        } else {
            self.audits.insert(name, factory);
        }
        self
    }

    /// Freeze the registry. Returns every registration error.
    pub fn build(self) -> Result<Registry, Vec<RegistryError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(Registry {
            gatherers: self.gatherers,
            audits: self.audits,
        })
    }
}

fn check_name(kind: ModuleKind, name: &str, taken: bool) -> Option<RegistryError> {
    if name.trim().is_empty() {
        Some(RegistryError::EmptyName { kind })
    } else if taken {
        Some(RegistryError::Duplicate {
            kind,
            name: name.to_string(),
        })
    } else {
        None
    }
}

/// Short-name lookup table for built-in implementations.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    gatherers: BTreeMap<String, Arc<dyn GathererFactory>>,
    audits: BTreeMap<String, Arc<dyn AuditFactory>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn gatherer(&self, name: &str) -> Option<&Arc<dyn GathererFactory>> {
        self.gatherers.get(name)
    }

    pub fn audit(&self, name: &str) -> Option<&Arc<dyn AuditFactory>> {
        self.audits.get(name)
    }

    /// Registered gatherer short names, sorted.
    pub fn gatherer_names(&self) -> impl Iterator<Item = &str> {
        self.gatherers.keys().map(String::as_str)
    }

    /// Registered audit short names, sorted.
    pub fn audit_names(&self) -> impl Iterator<Item = &str> {
        self.audits.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.gatherers.is_empty() && self.audits.is_empty()
    }
}
