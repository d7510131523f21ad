use crate::error::Result;
use crate::paths;
use crate::status::SettingsOverrides;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GateConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Block leaving a phase that recorded no outputs.
    #[serde(default = "default_enforce_outputs")]
    pub enforce_outputs: bool,
}

fn default_enforce_outputs() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enforce_outputs: default_enforce_outputs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

/// Project configuration read from `.prevc/config.yaml`.
///
/// Built once per orchestrator and passed down explicitly; nothing reads it
/// from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Applied to every new workflow after the scale defaults.
    #[serde(default, skip_serializing_if = "SettingsOverrides::is_empty")]
    pub defaults: SettingsOverrides,
    #[serde(default)]
    pub gates: GateConfig,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_version() -> u32 {
    1
}

fn default_history_limit() -> usize {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            defaults: SettingsOverrides::default(),
            gates: GateConfig::default(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load `.prevc/config.yaml`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.history_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "history_limit is 0: the workflow timeline will not be kept".to_string(),
            });
        }

        if self.defaults.autonomous_mode == Some(true) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "defaults.autonomous_mode is on: new workflows skip every gate"
                    .to_string(),
            });
        }

        if !self.gates.enforce_outputs {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "gates.enforce_outputs is off: phases can be left without outputs"
                    .to_string(),
            });
        }

        if self.version != default_version() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("unsupported config version {}", self.version),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
