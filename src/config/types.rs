//! Configuration types.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Database location and expiry sweep cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Seconds between expiry sweeps while serving.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shiftlist/shiftlist.db")
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Shared secrets. Unset secrets reject every credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Bearer token expected from the external scheduler.
    #[serde(default)]
    pub cron_secret: Option<String>,
}

/// Daily cycle tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Local hour (0-23) at which employee copies expire.
    #[serde(default = "default_expiry_hour")]
    pub expiry_hour: u32,

    #[serde(default = "default_archive_retention_days")]
    pub archive_retention_days: i64,

    /// Maximum tasks loaded per rollover phase.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            expiry_hour: default_expiry_hour(),
            archive_retention_days: default_archive_retention_days(),
            max_batch: default_max_batch(),
        }
    }
}

fn default_expiry_hour() -> u32 {
    4
}

fn default_archive_retention_days() -> i64 {
    7
}

fn default_max_batch() -> usize {
    1000
}

impl Config {
    /// Load configuration from a single file. Missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject values the lifecycle cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.lifecycle.expiry_hour >= 24 {
            bail!(
                "lifecycle.expiry_hour must be between 0 and 23, got {}",
                self.lifecycle.expiry_hour
            );
        }
        if self.lifecycle.archive_retention_days <= 0 {
            bail!("lifecycle.archive_retention_days must be positive");
        }
        if self.lifecycle.max_batch == 0 {
            bail!("lifecycle.max_batch must be at least 1");
        }
        if self.storage.sweep_interval_secs == 0 {
            bail!("storage.sweep_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.storage.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
