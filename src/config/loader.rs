//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE: &str = "config.yaml";

/// Configuration file tier (lowest to highest priority).
///
/// Built-in defaults sit below every tier and environment overrides
/// above them; neither comes from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Project-level config ($CWD/license-import/)
    Project,
    /// User-level config (~/.license-import/)
    User,
    /// Single file named by `--config` or `LICENSE_IMPORT_CONFIG_PATH`
    Explicit,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Explicit => write!(f, "explicit"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; when set, tiers are not consulted.
    pub explicit: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit = std::env::var("LICENSE_IMPORT_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        // User dir: LICENSE_IMPORT_USER_DIR or ~/.license-import
        let user_dir = std::env::var("LICENSE_IMPORT_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".license-import")));

        // Project dir: LICENSE_IMPORT_PROJECT_DIR or $CWD/license-import
        let project_dir = std::env::var("LICENSE_IMPORT_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("license-import")));

        Self {
            explicit,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit: None,
            project_dir,
            user_dir,
        }
    }

    /// Use a single config file instead of the tiers.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        if let Some(ref explicit) = paths.explicit {
            let value = read_yaml_tier(explicit)?
                .ok_or_else(|| anyhow!("config file {} not found", explicit.display()))?;
            configs.push(value);
            sources.push((ConfigTier::Explicit, explicit.clone()));
            return Self::finish(paths, configs, sources);
        }

        // Tier 2: Project config
        if let Some(ref project_dir) = paths.project_dir {
            if let Some(value) = read_yaml_tier(&project_dir.join(CONFIG_FILE))? {
                configs.push(value);
                sources.push((ConfigTier::Project, project_dir.join(CONFIG_FILE)));
            }
        }

        // Tier 3: User config
        if let Some(ref user_dir) = paths.user_dir {
            if let Some(value) = read_yaml_tier(&user_dir.join(CONFIG_FILE))? {
                configs.push(value);
                sources.push((ConfigTier::User, user_dir.join(CONFIG_FILE)));
            }
        }

        Self::finish(paths, configs, sources)
    }

    /// Merge the collected tiers over the defaults and apply env overrides.
    fn finish(
        paths: ConfigPaths,
        configs: Vec<Value>,
        sources: Vec<(ConfigTier, PathBuf)>,
    ) -> Result<Self> {
        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Environment variable overrides
        Self::apply_env_overrides(&mut config);

        for (tier, path) in &sources {
            debug!(tier = %tier, path = %path.display(), "Loaded config tier");
        }

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) {
        if let Ok(db_path) = std::env::var("LICENSE_IMPORT_DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one tier's YAML file. A missing file is not an error; a broken one is.
fn read_yaml_tier(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML in {}", path.display()))?;
    Ok(Some(value))
}
