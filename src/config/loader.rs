//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `$CWD/shiftlist/`
    Project = 1,
    /// `~/.shiftlist/`
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: SHIFTLIST_USER_DIR or ~/.shiftlist
        let user_dir = std::env::var("SHIFTLIST_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".shiftlist")));

        // Project dir: SHIFTLIST_PROJECT_DIR or $CWD/shiftlist
        let project_dir = std::env::var("SHIFTLIST_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("shiftlist")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-tier config file that contributed, if any.
    config_path: Option<PathBuf>,
    /// Tiers that contributed values, lowest first.
    tiers: Vec<ConfigTier>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // An explicit config file replaces the tier lookup
        if let Ok(explicit_path) = std::env::var("SHIFTLIST_CONFIG_PATH") {
            return Self::load_file(paths, PathBuf::from(explicit_path));
        }

        let mut configs: Vec<Value> = Vec::new();
        let mut config_path = None;
        let mut tiers = vec![ConfigTier::Defaults];

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        // Tiers 2 and 3: project, then user
        let tier_dirs = [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ];
        for (tier, dir) in tier_dirs {
            let Some(dir) = dir else { continue };
            if let Some(value) = read_yaml_tier(tier, &dir.join("config.yaml")) {
                configs.push(value);
                config_path = Some(dir.join("config.yaml"));
                tiers.push(tier);
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config =
            serde_json::from_value(merged).context("invalid merged configuration")?;

        // Tier 4: Environment variable overrides
        if Self::apply_env_overrides(&mut config) {
            tiers.push(ConfigTier::Environment);
        }

        Ok(Self {
            paths,
            config,
            config_path,
            tiers,
        })
    }

    /// Load one explicit file, then apply environment overrides.
    pub fn load_file(paths: ConfigPaths, path: PathBuf) -> Result<Self> {
        let mut config = Config::load(&path)
            .with_context(|| format!("failed to load config file {}", path.display()))?;
        let mut tiers = vec![ConfigTier::Defaults];
        if Self::apply_env_overrides(&mut config) {
            tiers.push(ConfigTier::Environment);
        }
        Ok(Self {
            paths,
            config,
            config_path: Some(path),
            tiers,
        })
    }

    fn apply_env_overrides(config: &mut Config) -> bool {
        apply_overrides(config, |key| std::env::var(key).ok())
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

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Tiers that contributed to the loaded configuration, lowest first.
    pub fn tiers(&self) -> &[ConfigTier] {
        &self.tiers
    }
}

/// Read a tier's YAML file. Missing files are skipped silently; unreadable or
/// malformed files are skipped with a warning.
fn read_yaml_tier(tier: ConfigTier, file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(tier = %tier, path = %file.display(), error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(tier = %tier, path = %file.display(), "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(tier = %tier, path = %file.display(), error = %e, "Skipping malformed config file");
            None
        }
    }
}

/// Apply `SHIFTLIST_*` overrides read through `lookup`. Returns whether any
/// override took effect.
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> bool {
    let mut applied = false;

    if let Some(db_path) = lookup("SHIFTLIST_DB_PATH") {
        config.storage.db_path = PathBuf::from(db_path);
        applied = true;
    }

    if let Some(password) = lookup("SHIFTLIST_ADMIN_PASSWORD") {
        config.auth.admin_password = Some(password);
        applied = true;
    }

    if let Some(secret) = lookup("SHIFTLIST_CRON_SECRET") {
        config.auth.cron_secret = Some(secret);
        applied = true;
    }

    if let Some(port) = lookup("SHIFTLIST_PORT") {
        match port.parse() {
            Ok(port) => {
                config.server.port = port;
                applied = true;
            }
            Err(_) => {
                warn!(tier = %ConfigTier::Environment, value = %port, "Ignoring invalid SHIFTLIST_PORT")
            }
        }
    }

    applied
}
