// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Resolve process-wide runtime configuration from defaults, TOML and CLI flags.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::InitError;

/// Lock file guarding setup and clean on real hardware.
pub const DEFAULT_LOCK_PATH: &str = "/var/lock/platinit.lock";
/// Configuration file consulted when no override is supplied.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/platinit/platinit.toml";
/// Inventory file read by `syseeprom`.
pub const DEFAULT_INVENTORY_PATH: &str = "/etc/platinit/prefdl";
/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV: &str = "PLATINIT_CONFIG";
/// Delay between reset-in and reset-out when toggling.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(1);
/// Platform used when running in simulation mode.
pub const SIMULATED_PLATFORM: &str = "simulated";

/// Behaviour when the process lock is already held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Wait until the holder releases the lock.
    #[default]
    Block,
    /// Fail immediately with a lock error.
    Fail,
}

/// Configuration threaded through a single command execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Skip privilege checks and isolate lock/log files.
    pub simulation: bool,
    /// Emit debug-level logs.
    pub verbose: bool,
    /// Lock file guarding setup and clean.
    pub lock_path: PathBuf,
    /// Contention behaviour for the lock.
    pub lock_mode: LockMode,
    /// Optional log file; stderr when unset.
    pub log_file: Option<PathBuf>,
    /// Platform identifier to resolve for platform commands.
    pub platform: Option<String>,
    /// Default delay for reset toggles.
    pub reset_delay: Duration,
    /// Inventory file read by `syseeprom`.
    pub inventory_path: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            simulation: false,
            verbose: false,
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            lock_mode: LockMode::Block,
            log_file: None,
            platform: None,
            reset_delay: DEFAULT_RESET_DELAY,
            inventory_path: PathBuf::from(DEFAULT_INVENTORY_PATH),
        }
    }
}

/// Values supplied on the command line; `None` leaves lower layers intact.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--simulation`.
    pub simulation: bool,
    /// `--verbose`.
    pub verbose: bool,
    /// `--lockfile`.
    pub lock_path: Option<PathBuf>,
    /// `--lock-mode`.
    pub lock_mode: Option<LockMode>,
    /// `--logfile`.
    pub log_file: Option<PathBuf>,
    /// `--platform`.
    pub platform: Option<String>,
    /// `--inventory`.
    pub inventory_path: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Layer defaults, an optional configuration file and CLI overrides.
    ///
    /// Simulation mode always generates a fresh lock file so simulated runs
    /// never contend with hardware runs or with each other. A log file is
    /// generated too unless one was given explicitly. Both files are left in
    /// the temp directory after the run: the log is the run's record, and a
    /// detached background worker reopens the lock file after the parent
    /// exits.
    pub fn resolve(file: Option<&ConfigFile>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();
        if let Some(file) = file {
            file.apply(&mut config)?;
        }

        config.simulation |= overrides.simulation;
        config.verbose |= overrides.verbose;
        if let Some(path) = overrides.lock_path {
            config.lock_path = path;
        }
        if let Some(mode) = overrides.lock_mode {
            config.lock_mode = mode;
        }
        if overrides.log_file.is_some() {
            config.log_file = overrides.log_file;
        }
        if overrides.platform.is_some() {
            config.platform = overrides.platform;
        }
        if let Some(path) = overrides.inventory_path {
            config.inventory_path = path;
        }

        if config.simulation {
            config.lock_path = unique_temp_path("platinit-", ".lock")?;
            if config.log_file.is_none() {
                config.log_file = Some(unique_temp_path("platinit-", ".log")?);
            }
            if config.platform.is_none() {
                config.platform = Some(SIMULATED_PLATFORM.to_owned());
            }
        }
        Ok(config)
    }
}

/// Create an empty uniquely named file in the temp directory and keep it.
fn unique_temp_path(prefix: &str, suffix: &str) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()
        .context("create simulation temp file")?;
    let path = file
        .into_temp_path()
        .keep()
        .context("persist simulation temp file")?;
    Ok(path)
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Platform identifier.
    pub platform: Option<String>,
    /// Force simulation mode.
    pub simulation: Option<bool>,
    /// `[lock]` table.
    pub lock: Option<LockSection>,
    /// `[log]` table.
    pub log: Option<LogSection>,
    /// `[reset]` table.
    pub reset: Option<ResetSection>,
    /// `[inventory]` table.
    pub inventory: Option<InventorySection>,
}

/// `[lock]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockSection {
    /// Lock file path.
    pub path: Option<PathBuf>,
    /// Contention behaviour.
    pub mode: Option<LockMode>,
}

/// `[log]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Log file path.
    pub file: Option<PathBuf>,
    /// Debug-level logging.
    pub verbose: Option<bool>,
}

/// `[reset]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetSection {
    /// Toggle delay in seconds.
    pub delay_s: Option<f64>,
}

/// `[inventory]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventorySection {
    /// Inventory file path.
    pub path: Option<PathBuf>,
}

impl ConfigFile {
    /// Parse a configuration document.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| InitError::config(path, err.to_string()).into())
    }

    fn apply(&self, config: &mut RuntimeConfig) -> Result<()> {
        if let Some(simulation) = self.simulation {
            config.simulation = simulation;
        }
        if self.platform.is_some() {
            config.platform = self.platform.clone();
        }
        if let Some(lock) = &self.lock {
            if let Some(path) = &lock.path {
                config.lock_path = path.clone();
            }
            if let Some(mode) = lock.mode {
                config.lock_mode = mode;
            }
        }
        if let Some(log) = &self.log {
            if log.file.is_some() {
                config.log_file = log.file.clone();
            }
            if let Some(verbose) = log.verbose {
                config.verbose = verbose;
            }
        }
        if let Some(delay_s) = self.reset.as_ref().and_then(|reset| reset.delay_s) {
            config.reset_delay = delay_from_secs(delay_s)?;
        }
        if let Some(path) = self.inventory.as_ref().and_then(|inv| inv.path.clone()) {
            config.inventory_path = path;
        }
        Ok(())
    }
}

/// Convert a seconds value into a [`Duration`], rejecting negatives and NaN.
pub fn delay_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| InitError::InvalidDelay(secs).into())
}

/// Pick the configuration file: CLI path, then `$PLATINIT_CONFIG`, then the
/// default location when it exists.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path);
    }
    if let Ok(value) = env::var(CONFIG_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    default.exists().then_some(default)
}

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)
        .map_err(|err| InitError::config(path, err.to_string()))?;
    ConfigFile::parse(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_hardware() {
        let config = RuntimeConfig::resolve(None, ConfigOverrides::default()).unwrap();
        assert!(!config.simulation);
        assert_eq!(config.lock_path, PathBuf::from(DEFAULT_LOCK_PATH));
        assert_eq!(config.lock_mode, LockMode::Block);
        assert_eq!(config.reset_delay, DEFAULT_RESET_DELAY);
        assert!(config.platform.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn cli_overrides_file() {
        let file = ConfigFile::parse(
            Path::new("inline.toml"),
            r#"
                platform = "from-file"
                [lock]
                path = "/tmp/file.lock"
                mode = "fail"
                [reset]
                delay_s = 2.5
            "#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            platform: Some("from-cli".to_owned()),
            ..ConfigOverrides::default()
        };
        let config = RuntimeConfig::resolve(Some(&file), overrides).unwrap();
        assert_eq!(config.platform.as_deref(), Some("from-cli"));
        assert_eq!(config.lock_path, PathBuf::from("/tmp/file.lock"));
        assert_eq!(config.lock_mode, LockMode::Fail);
        assert_eq!(config.reset_delay, Duration::from_millis(2500));
    }

    #[test]
    fn simulation_generates_unique_paths() {
        let overrides = ConfigOverrides {
            simulation: true,
            lock_path: Some(PathBuf::from(DEFAULT_LOCK_PATH)),
            ..ConfigOverrides::default()
        };
        let first = RuntimeConfig::resolve(None, overrides.clone()).unwrap();
        let second = RuntimeConfig::resolve(None, overrides).unwrap();
        assert_ne!(first.lock_path, PathBuf::from(DEFAULT_LOCK_PATH));
        assert_ne!(first.lock_path, second.lock_path);
        assert_ne!(first.log_file, second.log_file);
        assert_eq!(first.platform.as_deref(), Some(SIMULATED_PLATFORM));
        for config in [first, second] {
            assert!(config.lock_path.exists());
            assert!(config.log_file.as_deref().is_some_and(Path::exists));
            let _ = fs::remove_file(&config.lock_path);
            if let Some(log) = &config.log_file {
                let _ = fs::remove_file(log);
            }
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConfigFile::parse(Path::new("bad.toml"), "colour = \"blue\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InitError>(),
            Some(InitError::Config { .. })
        ));
    }

    #[test]
    fn negative_delay_is_rejected() {
        let err = delay_from_secs(-1.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InitError>(),
            Some(InitError::InvalidDelay(_))
        ));
    }
}
