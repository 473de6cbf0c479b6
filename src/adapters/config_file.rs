//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on disk.
//!
//! - Missing file: defaults, nothing written.
//! - Every field is range-checked after loading and before persisting.
//! - Writes go to a sibling temp file first and are renamed into place,
//!   so a crash mid-write never leaves a truncated config.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, Qos};
use crate::config::SystemConfig;

pub struct FileConfigAdapter {
    path: PathBuf,
}

impl FileConfigAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.device_id.trim().is_empty() {
        return Err(ConfigError::ValidationFailed("device_id must not be empty"));
    }
    if cfg.tz().is_none() {
        return Err(ConfigError::ValidationFailed(
            "timezone must be a known IANA zone",
        ));
    }
    if cfg.light_cutoff_hour > 23 {
        return Err(ConfigError::ValidationFailed("light_cutoff_hour must be 0–23"));
    }
    if !(1..=86_400).contains(&cfg.daily_exposure_target_secs) {
        return Err(ConfigError::ValidationFailed(
            "daily_exposure_target_secs must be 1–86400",
        ));
    }
    if !cfg.light_threshold.is_finite() || cfg.light_threshold < 0.0 {
        return Err(ConfigError::ValidationFailed(
            "light_threshold must be a non-negative number",
        ));
    }
    if !(-40.0..=80.0).contains(&cfg.temperature_threshold_c) {
        return Err(ConfigError::ValidationFailed(
            "temperature_threshold_c must be -40.0–80.0",
        ));
    }
    if !(1..=1000).contains(&cfg.temperature_lookback_rows) {
        return Err(ConfigError::ValidationFailed(
            "temperature_lookback_rows must be 1–1000",
        ));
    }
    if cfg.decision_topic.is_empty() || cfg.command_topics.iter().any(String::is_empty) {
        return Err(ConfigError::ValidationFailed("topics must not be empty"));
    }
    if Qos::from_level(cfg.qos).is_none() {
        return Err(ConfigError::ValidationFailed("qos must be 0 or 1"));
    }
    if cfg.broker_host.is_empty() || cfg.broker_port == 0 {
        return Err(ConfigError::ValidationFailed(
            "broker_host and broker_port must be set",
        ));
    }
    if !(5..=3600).contains(&cfg.keep_alive_secs) {
        return Err(ConfigError::ValidationFailed("keep_alive_secs must be 5–3600"));
    }
    if cfg.sample_collect_ms > 60_000 {
        return Err(ConfigError::ValidationFailed(
            "sample_collect_ms must be 0–60000",
        ));
    }
    if !(100..=3_600_000).contains(&cfg.publish_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "publish_interval_ms must be 100–3600000",
        ));
    }
    if !(10..=60_000).contains(&cfg.trigger_poll_ms) {
        return Err(ConfigError::ValidationFailed("trigger_poll_ms must be 10–60000"));
    }
    if cfg.reconnect_initial_ms == 0 || cfg.reconnect_max_ms < cfg.reconnect_initial_ms {
        return Err(ConfigError::ValidationFailed(
            "reconnect_initial_ms must be > 0 and <= reconnect_max_ms",
        ));
    }
    if cfg.light_eval_interval_secs == 0 || cfg.windows_eval_interval_secs == 0 {
        return Err(ConfigError::ValidationFailed(
            "evaluation intervals must be > 0",
        ));
    }
    // A local day lasts up to 25 h across a DST change.
    if !(25..=720).contains(&cfg.store_retention_hours) {
        return Err(ConfigError::ValidationFailed(
            "store_retention_hours must be 25–720",
        ));
    }
    Ok(())
}

impl ConfigPort for FileConfigAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Config: {} not found, using defaults", self.path.display());
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("Config: reading {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let cfg: SystemConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        info!("Config: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let json = serde_json::to_vec_pretty(config).map_err(|_| ConfigError::IoError)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|_| ConfigError::IoError)?;
        fs::rename(&tmp, &self.path).map_err(|_| ConfigError::IoError)?;
        info!("Config: saved {}", self.path.display());
        Ok(())
    }
}
