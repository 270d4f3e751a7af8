//! Evidence bundle loading.
//!
//! Traces and devtools logs are referenced by path and loaded here; other
//! artifacts arrive inline and are passed through.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{ReferenceError, ResolveError, Staged};
use super::json::ArtifactsJson;

/// Loaded evidence, keyed by pass name or artifact name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifacts {
    pub traces: BTreeMap<String, Value>,
    pub devtools_logs: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl Artifacts {
    /// True when the bundle supplies `artifact` without gathering.
    pub fn provides(&self, artifact: &str) -> bool {
        match artifact {
            "traces" => !self.traces.is_empty(),
            "devtoolsLogs" => !self.devtools_logs.is_empty(),
            _ => self.other.contains_key(artifact),
        }
    }

    /// Pass names any trace or devtools log is keyed by.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.traces
            .keys()
            .chain(self.devtools_logs.keys())
            .map(String::as_str)
    }
}

/// Load every referenced evidence file. Relative paths are taken from
/// `base_dir`; all failures are collected.
pub fn load_artifacts(
    json: &ArtifactsJson,
    base_dir: &Path,
) -> Result<Artifacts, Vec<ResolveError>> {
    load_artifacts_staged(json, base_dir).into_result()
}

pub(crate) fn load_artifacts_staged(json: &ArtifactsJson, base_dir: &Path) -> Staged<Artifacts> {
    let mut errors = Vec::new();
    let traces = load_keyed("traces", &json.traces, base_dir, &mut errors);
    let devtools_logs = load_keyed("devtoolsLogs", &json.devtools_logs, base_dir, &mut errors);

    Staged::new(
        Artifacts {
            traces,
            devtools_logs,
            other: json.other.clone(),
        },
        errors,
    )
}

fn load_keyed(
    field: &str,
    paths: &BTreeMap<String, String>,
    base_dir: &Path,
    errors: &mut Vec<ResolveError>,
) -> BTreeMap<String, Value> {
    let mut loaded = BTreeMap::new();
    for (pass_name, path) in paths {
        let key = format!("{}.{}", field, pass_name);
        let path = resolve_path(base_dir, path);
        match read_json(&path) {
            Ok(value) => {
                debug!(key = %key, path = %path.display(), "loaded evidence");
                loaded.insert(pass_name.clone(), value);
            }
            Err(reason) => {
                errors.push(ReferenceError::EvidenceUnavailable { key, path, reason }.into())
            }
        }
    }
    loaded
}

fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&contents).map_err(|e| e.to_string())
}
