//! Server configuration.
//!
//! Defaults are layered with the client's `initializationOptions` and with
//! a `chartnav.toml` at the workspace root, in that order. Handlers check
//! the feature flags at entry and bail out quietly when disabled.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChartnavConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    #[serde(default = "true_bool")]
    pub completion: bool,
    #[serde(default = "true_bool")]
    pub definition: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Extra file-name patterns classified as override value files, on top
    /// of the built-in `values*.yaml` family.
    #[serde(default)]
    pub override_patterns: Vec<String>,
}

fn true_bool() -> bool {
    true
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            completion: true,
            definition: true,
        }
    }
}

pub struct ConfigManager {
    config: RwLock<ChartnavConfig>,
    init_settings: RwLock<Option<serde_json::Value>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(ChartnavConfig::default()),
            init_settings: RwLock::new(None),
        }
    }

    pub fn get(&self) -> ChartnavConfig {
        self.config.read().clone()
    }

    pub fn is_definition_enabled(&self) -> bool {
        self.config.read().features.definition
    }

    pub fn is_completion_enabled(&self) -> bool {
        self.config.read().features.completion
    }

    pub fn override_patterns(&self) -> Vec<String> {
        self.config.read().workspace.override_patterns.clone()
    }

    pub fn set_init_settings(&self, settings: Option<serde_json::Value>) {
        *self.init_settings.write() = settings;
    }

    /// Rebuilds the effective configuration from defaults, the client's
    /// initialization settings, and `chartnav.toml` at `root`.
    pub fn load_from_workspace(&self, root: &Path) -> anyhow::Result<ChartnavConfig> {
        let mut merged = serde_json::to_value(ChartnavConfig::default())?;

        if let Some(settings) = self.init_settings.read().as_ref() {
            merge_json(&mut merged, settings.clone());
        }

        let config_path = root.join("chartnav.toml");
        if config_path.is_file() {
            let text = std::fs::read_to_string(&config_path)?;
            let from_toml: toml::Value = toml::from_str(&text)?;
            merge_json(&mut merged, serde_json::to_value(from_toml)?);
        }

        let config: ChartnavConfig = serde_json::from_value(merged)?;
        *self.config.write() = config.clone();
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
