//! The `Chart.yaml` descriptor model.
//!
//! Only the fields this server consumes are modeled; everything else in the
//! manifest is ignored. Chart trees are frequently edited mid-save, so a
//! manifest that fails to load is treated as "contributes nothing" by every
//! caller rather than as a fatal condition.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ChartManifest {
    /// The alias an enclosing chart declared for a dependency, if any.
    pub fn alias_for(&self, dependency_name: &str) -> Option<&str> {
        self.dependencies
            .iter()
            .find(|d| d.name == dependency_name)
            .and_then(|d| d.alias.as_deref())
    }
}

pub fn load_manifest(path: &Path) -> Result<ChartManifest, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_manifest(&text, path)
}

pub fn parse_manifest(text: &str, origin: &Path) -> Result<ChartManifest, ManifestError> {
    serde_yaml::from_str(text).map_err(|source| ManifestError::Yaml {
        path: origin.display().to_string(),
        source,
    })
}
