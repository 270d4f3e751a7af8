//! Capability surface for pagecheck gatherers and audits.
//!
//! Gatherers and audits are implemented outside the configuration engine.
//! This crate defines the traits they implement, the read-only registry that
//! maps short names to factories, and the loader that turns path-shaped
//! references into module manifests found on disk.

mod audit;
mod gatherer;
mod loader;
mod registry;

pub use audit::{check_audit, AuditFactory, AuditMeta, ScoreDisplayMode};
pub use gatherer::{check_gatherer, GatherPhases, Gatherer, GathererFactory, InstanceFactory};
pub use loader::{
    LoadError, LoadedModule, ManifestLoader, ModuleLoader, ModuleManifest, NoopLoader,
};
pub use registry::{Registry, RegistryBuilder, RegistryError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Option bag handed to a gatherer or audit.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Which side of the plugin surface a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Gatherer,
    Audit,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gatherer => write!(f, "gatherer"),
            Self::Audit => write!(f, "audit"),
        }
    }
}

/// Reasons an implementation fails the capability check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("gatherer has an empty artifact name")]
    EmptyArtifactName,

    #[error("gatherer {0} participates in no pass phase")]
    NoPhases(String),

    #[error("audit {audit} is missing meta.{field}")]
    MissingMeta { audit: String, field: &'static str },
}
