//! pagecheck configuration engine
//!
//! Resolves a loosely specified page-audit configuration (passes,
//! gatherers, audits, categories, groups and settings) into one internally
//! consistent [`Config`] that collection and scoring can consume without
//! further checks, or reports every problem found in a single
//! [`ResolveReport`].

pub mod config;
pub mod telemetry;

pub use pagecheck_plugin as plugin;

pub use config::{
    Config, ConfigError, ConfigJson, ConfigResolver, ConfigWarning, Resolution, ResolveError,
    ResolveReport, Settings, WarningKind,
};
