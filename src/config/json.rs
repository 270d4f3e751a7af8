//! Pre-normalization configuration shapes.
//!
//! These mirror the on-disk JSON format (camelCase keys). Passes,
//! categories and category members must be objects, but the values inside
//! them are parsed leniently: a value that does not fit its field is kept
//! as a [`RejectedField`] so the owning stage reports it alongside every
//! other failure instead of parsing stopping at the first bad value.

use pagecheck_plugin::{Gatherer, GathererFactory, Options};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw settings object. Typed field by field by the settings merger.
pub type SettingsJson = serde_json::Map<String, Value>;

/// A complete configuration before resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigJson {
    #[serde(default)]
    pub settings: Option<SettingsJson>,

    #[serde(default)]
    pub passes: Option<Vec<PassJson>>,

    #[serde(default)]
    pub audits: Option<Vec<AuditRef>>,

    #[serde(default)]
    pub categories: Option<BTreeMap<String, CategoryJson>>,

    #[serde(default)]
    pub groups: Option<GroupsJson>,

    #[serde(default)]
    pub artifacts: Option<ArtifactsJson>,
}

impl ConfigJson {
    /// Parse from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// A field value that did not fit its type, or a required field that was
/// missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedField {
    /// Wire name, with an index for list entries (`gatherers[2]`).
    pub field: String,
    pub reason: String,
}

pub(crate) fn rejects(rejected: &[RejectedField], field: &str) -> bool {
    rejected.iter().any(|r| r.field == field)
}

/// An object's fields, typed one at a time.
struct Fields {
    map: Map<String, Value>,
    rejected: Vec<RejectedField>,
}

impl Fields {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            map,
            rejected: Vec::new(),
        }
    }

    fn reject(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.rejected.push(RejectedField {
            field: field.into(),
            reason: reason.into(),
        });
    }

    /// First present key among `keys` (a name and its aliases).
    fn remove(&mut self, keys: &[&str]) -> Option<(String, Value)> {
        let key = keys
            .iter()
            .find(|k| self.map.get(**k).is_some_and(|v| !v.is_null()))?;
        let value = self.map.remove(*key)?;
        Some((key.to_string(), value))
    }

    /// Optional field. `null` reads as absent.
    fn take<T: DeserializeOwned>(&mut self, keys: &[&str]) -> Option<T> {
        let (key, value) = self.remove(keys)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.reject(key, e.to_string());
                None
            }
        }
    }

    fn require<T: DeserializeOwned>(&mut self, keys: &[&str]) -> Option<T> {
        let present = keys
            .iter()
            .any(|k| self.map.get(*k).is_some_and(|v| !v.is_null()));
        if !present {
            self.reject(keys[0], "missing required field");
            return None;
        }
        self.take(keys)
    }

    /// List field typed entry by entry; bad entries are dropped.
    fn take_list<T: DeserializeOwned>(&mut self, keys: &[&str]) -> Vec<T> {
        let Some((key, value)) = self.remove(keys) else {
            return Vec::new();
        };
        let Value::Array(entries) = value else {
            self.reject(key, "expected a list");
            return Vec::new();
        };

        let mut parsed = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value(entry) {
                Ok(item) => parsed.push(item),
                Err(e) => self.reject(format!("{}[{}]", key, index), e.to_string()),
            }
        }
        parsed
    }
}

/// One pass as written by the user.
#[derive(Debug, Clone, Default)]
pub struct PassJson {
    pub pass_name: Option<String>,
    pub record_trace: Option<bool>,
    pub use_throttling: Option<bool>,
    pub pause_after_load_ms: Option<u64>,
    pub network_quiet_threshold_ms: Option<u64>,
    pub cpu_quiet_threshold_ms: Option<u64>,
    pub blocked_url_patterns: Option<Vec<String>>,
    pub blank_page: Option<String>,
    pub blank_duration: Option<u64>,
    /// Empty when omitted; reported by the pass normalizer.
    pub gatherers: Vec<GathererRef>,
    pub rejected: Vec<RejectedField>,
}

impl<'de> Deserialize<'de> for PassJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Fields::new(Map::deserialize(deserializer)?);
        Ok(Self {
            pass_name: fields.take(&["passName"]),
            record_trace: fields.take(&["recordTrace"]),
            use_throttling: fields.take(&["useThrottling"]),
            pause_after_load_ms: fields.take(&["pauseAfterLoadMs"]),
            network_quiet_threshold_ms: fields.take(&["networkQuietThresholdMs"]),
            cpu_quiet_threshold_ms: fields.take(&["cpuQuietThresholdMs"]),
            blocked_url_patterns: fields.take(&["blockedUrlPatterns"]),
            blank_page: fields.take(&["blankPage"]),
            blank_duration: fields.take(&["blankDuration"]),
            gatherers: fields.take_list(&["gatherers"]),
            rejected: fields.rejected,
        })
    }
}

impl PassJson {
    pub fn new(pass_name: impl Into<String>, gatherers: Vec<GathererRef>) -> Self {
        Self {
            pass_name: Some(pass_name.into()),
            gatherers,
            ..Default::default()
        }
    }
}

/// A gatherer reference in one of its shorthand shapes.
#[derive(Debug, Clone)]
pub enum GathererRef {
    /// Bare short name or module path.
    Name(String),

    /// Short name or module path with options.
    Path { path: String, options: Options },

    /// A factory supplied directly; no lookup.
    Implementation {
        implementation: Arc<dyn GathererFactory>,
        options: Options,
    },

    /// A prebuilt instance; no lookup.
    Instance {
        instance: Arc<dyn Gatherer>,
        options: Options,
    },
}

impl GathererRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn path(path: impl Into<String>, options: Options) -> Self {
        Self::Path {
            path: path.into(),
            options,
        }
    }

    pub fn implementation(implementation: Arc<dyn GathererFactory>) -> Self {
        Self::Implementation {
            implementation,
            options: Options::new(),
        }
    }

    pub fn instance(instance: Arc<dyn Gatherer>) -> Self {
        Self::Instance {
            instance,
            options: Options::new(),
        }
    }

    /// Replace the options carried by this reference.
    ///
    /// A bare name becomes a path reference.
    pub fn with_options(self, options: Options) -> Self {
        match self {
            Self::Name(path) | Self::Path { path, .. } => Self::Path { path, options },
            Self::Implementation { implementation, .. } => Self::Implementation {
                implementation,
                options,
            },
            Self::Instance { instance, .. } => Self::Instance { instance, options },
        }
    }

    /// Human-readable label used in diagnostics.
    pub fn label(&self) -> String {
        let label = match self {
            Self::Name(path) | Self::Path { path, .. } => path.as_str(),
            Self::Implementation { implementation, .. } => implementation.name(),
            Self::Instance { instance, .. } => instance.name(),
        };
        if label.is_empty() {
            "<anonymous>".to_string()
        } else {
            label.to_string()
        }
    }
}

/// An audit reference; only the lookup shapes are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditRef {
    Name(String),
    Path { path: String, options: Options },
}

impl AuditRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn path(path: impl Into<String>, options: Options) -> Self {
        Self::Path {
            path: path.into(),
            options,
        }
    }

    pub fn path_str(&self) -> &str {
        match self {
            Self::Name(path) | Self::Path { path, .. } => path,
        }
    }
}

/// Wire shape shared by both reference kinds. `options: null` reads as
/// absent.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Name(String),
    Path {
        path: String,
        #[serde(default)]
        options: Option<Options>,
    },
}

impl<'de> Deserialize<'de> for GathererRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RefRepr::deserialize(deserializer)? {
            RefRepr::Name(name) => Self::Name(name),
            RefRepr::Path { path, options } => Self::Path {
                path,
                options: options.unwrap_or_default(),
            },
        })
    }
}

impl<'de> Deserialize<'de> for AuditRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RefRepr::deserialize(deserializer)? {
            RefRepr::Name(name) => Self::Name(name),
            RefRepr::Path { path, options } => Self::Path {
                path,
                options: options.unwrap_or_default(),
            },
        })
    }
}

/// A scoring category as written by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryJson {
    /// Read from `title`, or `name`.
    pub name: String,
    pub description: String,
    /// Read from `auditRefs`, or `audits`.
    pub audits: Vec<CategoryMemberJson>,
    pub rejected: Vec<RejectedField>,
}

impl<'de> Deserialize<'de> for CategoryJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Fields::new(Map::deserialize(deserializer)?);
        Ok(Self {
            name: fields.require(&["title", "name"]).unwrap_or_default(),
            description: fields.take(&["description"]).unwrap_or_default(),
            audits: fields.take_list(&["auditRefs", "audits"]),
            rejected: fields.rejected,
        })
    }
}

impl CategoryJson {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        audits: Vec<CategoryMemberJson>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            audits,
            rejected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMemberJson {
    /// Empty when omitted; reported as a missing id.
    pub id: String,
    /// Zero when missing or malformed; the rejection is reported instead.
    pub weight: f64,
    pub group: Option<String>,
    pub rejected: Vec<RejectedField>,
}

impl<'de> Deserialize<'de> for CategoryMemberJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Fields::new(Map::deserialize(deserializer)?);
        Ok(Self {
            id: fields.take(&["id"]).unwrap_or_default(),
            weight: fields.require(&["weight"]).unwrap_or(0.0),
            group: fields.take(&["group"]),
            rejected: fields.rejected,
        })
    }
}

impl CategoryMemberJson {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
            group: None,
            rejected: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupJson {
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// A group in list form, carrying its own id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyedGroupJson {
    pub id: String,

    #[serde(flatten)]
    pub group: GroupJson,
}

/// Groups keyed by id, or listed with inline ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GroupsJson {
    Map(BTreeMap<String, GroupJson>),
    List(Vec<KeyedGroupJson>),
}

/// Pre-collected evidence. Traces and devtools logs are file paths keyed
/// by pass name; any other artifact is given inline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactsJson {
    #[serde(default)]
    pub traces: BTreeMap<String, String>,

    #[serde(default)]
    pub devtools_logs: BTreeMap<String, String>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gatherer_shorthand_shapes() {
        let refs: Vec<GathererRef> = serde_json::from_value(json!([
            "viewport-dimensions",
            {"path": "custom/fonts", "options": {"minSize": 12}},
            {"path": "custom/images"},
            {"path": "custom/links", "options": null}
        ]))
        .unwrap();

        assert!(matches!(&refs[0], GathererRef::Name(n) if n == "viewport-dimensions"));
        match &refs[1] {
            GathererRef::Path { path, options } => {
                assert_eq!(path, "custom/fonts");
                assert_eq!(options["minSize"], 12);
            }
            other => panic!("unexpected {:?}", other),
        }
        for r in &refs[2..] {
            assert!(matches!(r, GathererRef::Path { options, .. } if options.is_empty()));
        }
    }

    #[test]
    fn test_non_object_options_rejected() {
        let parsed: Result<GathererRef, _> =
            serde_json::from_value(json!({"path": "x", "options": [1, 2]}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_pass_without_gatherers_parses_empty() {
        let pass: PassJson = serde_json::from_value(json!({"passName": "p"})).unwrap();
        assert!(pass.gatherers.is_empty());
        assert_eq!(pass.pass_name.as_deref(), Some("p"));
        assert!(pass.record_trace.is_none());
    }

    #[test]
    fn test_bad_pass_values_are_kept_as_rejections() {
        let pass: PassJson = serde_json::from_value(json!({
            "passName": "p",
            "pauseAfterLoadMs": -5,
            "recordTrace": "yes",
            "gatherers": ["scripts", 7, {"path": "x", "options": [1]}]
        }))
        .unwrap();

        assert_eq!(pass.pass_name.as_deref(), Some("p"));
        assert!(pass.pause_after_load_ms.is_none());
        assert_eq!(pass.gatherers.len(), 1);
        let fields: Vec<_> = pass.rejected.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["recordTrace", "pauseAfterLoadMs", "gatherers[1]", "gatherers[2]"]
        );
    }

    #[test]
    fn test_member_without_weight_is_rejected() {
        let category: CategoryJson = serde_json::from_value(json!({
            "auditRefs": [{"id": "ghost"}, {"id": "viewport", "weight": "heavy"}]
        }))
        .unwrap();

        assert_eq!(category.rejected[0].field, "title");
        assert_eq!(category.audits.len(), 2);
        assert_eq!(category.audits[0].id, "ghost");
        assert_eq!(category.audits[0].weight, 0.0);
        assert_eq!(
            category.audits[0].rejected,
            vec![RejectedField {
                field: "weight".to_string(),
                reason: "missing required field".to_string(),
            }]
        );
        assert!(rejects(&category.audits[1].rejected, "weight"));
    }

    #[test]
    fn test_groups_accept_map_and_list() {
        let map: GroupsJson = serde_json::from_value(json!({
            "metrics": {"title": "Metrics", "description": "Timing"}
        }))
        .unwrap();
        assert!(matches!(map, GroupsJson::Map(ref m) if m["metrics"].title == "Metrics"));

        let list: GroupsJson = serde_json::from_value(json!([
            {"id": "metrics", "title": "Metrics"}
        ]))
        .unwrap();
        match list {
            GroupsJson::List(items) => {
                assert_eq!(items[0].id, "metrics");
                assert_eq!(items[0].group.description, "");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_category_aliases() {
        let category: CategoryJson = serde_json::from_value(json!({
            "title": "Performance",
            "auditRefs": [{"id": "first-contentful-paint", "weight": 3, "group": "metrics"}]
        }))
        .unwrap();
        assert_eq!(category.name, "Performance");
        assert_eq!(
            category.audits,
            vec![CategoryMemberJson::new("first-contentful-paint", 3.0).in_group("metrics")]
        );
    }

    #[test]
    fn test_artifacts_split_paths_and_inline() {
        let artifacts: ArtifactsJson = serde_json::from_value(json!({
            "traces": {"defaultPass": "trace.json"},
            "devtoolsLogs": {"defaultPass": "log.json"},
            "ViewportDimensions": {"innerWidth": 412}
        }))
        .unwrap();
        assert_eq!(artifacts.traces["defaultPass"], "trace.json");
        assert_eq!(artifacts.devtools_logs["defaultPass"], "log.json");
        assert_eq!(artifacts.other["ViewportDimensions"]["innerWidth"], 412);
        assert!(!artifacts.other.contains_key("traces"));
    }

    #[test]
    fn test_with_options_promotes_name() {
        let mut options = Options::new();
        options.insert("x".to_string(), json!(1));
        let r = GathererRef::name("scripts").with_options(options);
        assert!(matches!(r, GathererRef::Path { ref path, .. } if path == "scripts"));
        assert_eq!(r.label(), "scripts");
    }
}
