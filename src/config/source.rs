//! Configuration files with provenance
//!
//! A config file is JSON or TOML; TOML is converted to the JSON data model
//! before it is parsed into [`ConfigJson`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::json::ConfigJson;

/// The file a configuration was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub path: PathBuf,

    /// SHA-256 digest of raw file bytes
    pub digest: String,
}

/// Read, digest and parse a config file.
pub fn load_config_file(path: &Path) -> Result<(ConfigJson, ConfigSource), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let parse_error = |reason: String| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let contents =
        String::from_utf8(bytes).map_err(|e| parse_error(format!("Invalid UTF-8: {}", e)))?;

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str::<Value>(&contents)
            .map_err(|e| parse_error(format!("JSON parse error: {}", e)))?,
        Some("toml") => {
            let toml_value: toml::Value = toml::from_str(&contents)
                .map_err(|e| parse_error(format!("TOML parse error: {}", e)))?;
            toml_to_json(toml_value)
        }
        _ => return Err(parse_error("expected a .json or .toml file".to_string())),
    };

    let config = ConfigJson::from_value(value).map_err(|e| parse_error(e.to_string()))?;

    Ok((
        config,
        ConfigSource {
            path: path.to_path_buf(),
            digest,
        },
    ))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
