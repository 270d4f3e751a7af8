//! Configuration resolution
//!
//! Turns a loosely specified audit-run configuration into a resolved
//! [`Config`]:
//! 1. Settings merged over built-in defaults
//! 2. Passes normalized, gatherers resolved
//! 3. Audits resolved
//! 4. Groups and categories validated
//! 5. Evidence bundle loaded
//! 6. Run filter applied

mod artifacts;
mod assemble;
mod audit;
mod category;
mod defaults;
mod error;
mod filter;
mod gatherer;
mod json;
mod lookup;
mod merge;
mod pass;
mod settings;
mod source;
mod warning;

pub use artifacts::{load_artifacts, Artifacts};
pub use assemble::{Config, ConfigResolver, Resolution};
pub use audit::{resolve_audit, resolve_audits, AuditDefn};
pub use category::{resolve_groups, validate_categories, Category, CategoryMember, Group};
pub use defaults::{
    default_passes, default_settings, mobile_3g, PassDefaults, BASE_ARTIFACTS, DEFAULT_PASS_NAME,
    TRACE_ARTIFACTS,
};
pub use error::{
    ConfigError, ReferenceError, ResolveError, ResolveReport, SettingsError, ValidationError,
};
pub use filter::filter_config;
pub use gatherer::{resolve_gatherer, GathererDefn};
pub use json::{
    ArtifactsJson, AuditRef, CategoryJson, CategoryMemberJson, ConfigJson, GathererRef,
    GroupJson, GroupsJson, KeyedGroupJson, PassJson, RejectedField, SettingsJson,
};
pub use merge::{deep_merge, merge_options};
pub use pass::{normalize_pass, normalize_passes, Pass};
pub use settings::{ExtraHeaders, OutputMode, Settings, ThrottlingMethod, ThrottlingSettings};
pub use source::{load_config_file, ConfigSource};
pub use warning::{ConfigWarning, WarningKind};
