use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RisklineError;

/// Per-repo file in the repository root; overrides the global config.
pub const REPO_CONFIG_FILE: &str = ".riskline.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub repo: RepoSettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSettings {
    /// Reference branch the risk anchors were recorded against; the diff
    /// runs against `origin/<base_branch>`.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSettings {
    /// Trailing-edge debounce for edit-triggered highlight cycles.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Window during which at most one `git fetch origin` runs.
    #[serde(default = "default_ttl_secs")]
    pub fetch_ttl_secs: u64,
    /// How long a file's risk list is reused without asking the provider.
    #[serde(default = "default_ttl_secs")]
    pub risks_ttl_secs: u64,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_ttl_secs() -> u64 {
    600
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
        }
    }
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fetch_ttl_secs: default_ttl_secs(),
            risks_ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: RepoSettings::default(),
            highlight: HighlightSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("riskline")
            .join("config.toml")
    }

    /// Global settings, or defaults when no config file exists or parses.
    pub fn load() -> Self {
        Self::from_file(&Self::config_path()).unwrap_or_default()
    }

    /// Settings for one repository: a `.riskline.toml` in the repo root
    /// wins over the global config, which wins over built-in defaults.
    pub fn load_for_repo(repo_root: &Path) -> Self {
        Self::from_file(&repo_root.join(REPO_CONFIG_FILE)).unwrap_or_else(Self::load)
    }

    fn from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    pub fn save(&self) -> Result<(), RisklineError> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RisklineError::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.highlight.debounce_ms)
    }

    pub fn fetch_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.fetch_ttl_secs)
    }

    pub fn risks_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.risks_ttl_secs)
    }
}
