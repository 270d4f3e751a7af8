//! Module loading for path-shaped references.
//!
//! A module is a manifest file that aliases a registered implementation
//! under a path, optionally with default options:
//!
//! ```toml
//! [module]
//! kind = "gatherer"
//! implementation = "viewport-dimensions"
//!
//! [module.options]
//! includeScrollbars = false
//! ```
//!
//! JSON manifests use the same shape (`{"module": {...}}`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{ModuleKind, Options};

/// Extensions tried when a reference does not name a file directly.
const MANIFEST_EXTENSIONS: &[&str] = &["toml", "json"];

/// Errors raised while locating or reading a module manifest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid module manifest {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("module reference {reference} matches several files: {}", display_paths(.candidates))]
    Ambiguous {
        reference: String,
        candidates: Vec<PathBuf>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `[module]` table of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub kind: ModuleKind,

    /// Registered short name this module aliases.
    pub implementation: String,

    /// Defaults that reference options are layered over.
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    module: ModuleManifest,
}

/// A manifest together with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    pub path: PathBuf,
    pub manifest: ModuleManifest,
}

/// Resolves a path-shaped reference to a module.
pub trait ModuleLoader: fmt::Debug + Send + Sync {
    /// `Ok(None)` means nothing matches the reference.
    fn load(&self, reference: &str) -> Result<Option<LoadedModule>, LoadError>;
}

/// Loader that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl ModuleLoader for NoopLoader {
    fn load(&self, _reference: &str) -> Result<Option<LoadedModule>, LoadError> {
        Ok(None)
    }
}

/// Searches a list of root directories for manifest files.
///
/// Roots are tried in order and the first root with a match wins. Within
/// one root an exact file name wins; otherwise `<ref>.toml` and
/// `<ref>.json` are tried, and finding both is ambiguous.
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    roots: Vec<PathBuf>,
}

impl ManifestLoader {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Read and parse one manifest file; the extension picks the format.
    pub fn read_manifest(path: &Path) -> Result<ModuleManifest, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: Result<ManifestFile, String> =
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&contents).map_err(|e| e.to_string())
            } else {
                toml::from_str(&contents).map_err(|e| e.to_string())
            };

        let file = parsed.map_err(|reason| LoadError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        if file.module.implementation.trim().is_empty() {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                reason: "module.implementation is empty".to_string(),
            });
        }

        Ok(file.module)
    }

    fn search_bases(&self, reference: &str) -> Vec<PathBuf> {
        let reference_path = Path::new(reference);
        if reference_path.is_absolute() {
            vec![reference_path.to_path_buf()]
        } else {
            self.roots.iter().map(|root| root.join(reference_path)).collect()
        }
    }
}

fn candidate_files(base: &Path) -> Vec<PathBuf> {
    if base.is_file() {
        return vec![base.to_path_buf()];
    }
    MANIFEST_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut name = base.as_os_str().to_owned();
            name.push(".");
            name.push(ext);
            PathBuf::from(name)
        })
        .filter(|p| p.is_file())
        .collect()
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, reference: &str) -> Result<Option<LoadedModule>, LoadError> {
        if reference.trim().is_empty() {
            return Ok(None);
        }

        for base in self.search_bases(reference) {
            let mut hits = candidate_files(&base);
            match hits.len() {
                0 => continue,
                1 => {
                    let path = hits.remove(0);
                    let manifest = Self::read_manifest(&path)?;
                    debug!(
                        reference,
                        path = %path.display(),
                        kind = %manifest.kind,
                        implementation = %manifest.implementation,
                        "loaded module manifest"
                    );
                    return Ok(Some(LoadedModule { path, manifest }));
                }
                _ => {
                    return Err(LoadError::Ambiguous {
                        reference: reference.to_string(),
                        candidates: hits,
                    })
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    const GATHERER_TOML: &str = r#"
[module]
kind = "gatherer"
implementation = "viewport-dimensions"

[module.options]
includeScrollbars = false
"#;

    #[test]
    fn test_noop_loader_finds_nothing() {
        assert!(NoopLoader.load("anything").unwrap().is_none());
    }

    #[test]
    fn test_loads_toml_by_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "custom/viewport.toml", GATHERER_TOML);

        let loader = ManifestLoader::new([dir.path()]);
        let module = loader.load("custom/viewport").unwrap().unwrap();

        assert_eq!(module.manifest.kind, ModuleKind::Gatherer);
        assert_eq!(module.manifest.implementation, "viewport-dimensions");
        assert_eq!(module.manifest.options["includeScrollbars"], false);
        assert!(module.path.ends_with("custom/viewport.toml"));
    }

    #[test]
    fn test_loads_json_by_exact_name() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "fcp.json",
            r#"{"module": {"kind": "audit", "implementation": "metrics/first-contentful-paint"}}"#,
        );

        let loader = ManifestLoader::new([dir.path()]);
        let module = loader.load("fcp.json").unwrap().unwrap();

        assert_eq!(module.manifest.kind, ModuleKind::Audit);
        assert!(module.manifest.options.is_empty());
    }

    #[test]
    fn test_absolute_reference_ignores_roots() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "abs.toml", GATHERER_TOML);

        let loader = ManifestLoader::default();
        let module = loader.load(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(module.path, path);
    }

    #[test]
    fn test_first_root_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "g.toml", GATHERER_TOML);
        write(
            second.path(),
            "g.toml",
            "[module]\nkind = \"audit\"\nimplementation = \"other\"\n",
        );

        let loader = ManifestLoader::new([first.path()]).with_root(second.path());
        let module = loader.load("g").unwrap().unwrap();
        assert_eq!(module.manifest.kind, ModuleKind::Gatherer);
        assert_eq!(loader.roots().len(), 2);
    }

    #[test]
    fn test_both_extensions_is_ambiguous() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dup.toml", GATHERER_TOML);
        write(
            dir.path(),
            "dup.json",
            r#"{"module": {"kind": "gatherer", "implementation": "viewport-dimensions"}}"#,
        );

        let loader = ManifestLoader::new([dir.path()]);
        match loader.load("dup") {
            Err(LoadError::Ambiguous { candidates, .. }) => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_reference_is_none() {
        let dir = TempDir::new().unwrap();
        let loader = ManifestLoader::new([dir.path()]);
        assert!(loader.load("nope").unwrap().is_none());
        assert!(loader.load("").unwrap().is_none());
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.toml", "[module]\nkind = \"scorer\"\n");

        let loader = ManifestLoader::new([dir.path()]);
        assert!(matches!(loader.load("bad"), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_empty_implementation_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "empty.toml",
            "[module]\nkind = \"gatherer\"\nimplementation = \"\"\n",
        );

        let loader = ManifestLoader::new([dir.path()]);
        let err = loader.load("empty").unwrap_err();
        assert!(err.to_string().contains("module.implementation is empty"));
    }
}
