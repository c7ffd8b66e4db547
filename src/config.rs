// Configuration loaded from YAML

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub latency: LatencyConfig,
    /// Directory holding `tasks.jsonl` / `categories.jsonl` to seed from
    /// instead of the builtin fixture
    pub seed_dir: Option<PathBuf>,
}

/// Simulated round-trip delay applied to every board operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub enabled: bool,
    /// Multiplier over the per-operation base delay
    pub scale: f64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 1.0,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the user config file is used
    /// when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/taskboard/taskboard.yml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskboard").join("taskboard.yml"))
    }

    fn validate(&self) -> Result<()> {
        if !self.latency.scale.is_finite() || self.latency.scale < 0.0 {
            return Err(eyre!("latency.scale must be a non-negative number, got {}", self.latency.scale));
        }
        Ok(())
    }
}
