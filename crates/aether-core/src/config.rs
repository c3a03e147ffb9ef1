//! Configuration for Aether hosts.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{CoreError, Result};
use crate::memory::{
    RetentionPolicy, DEFAULT_MIN_USAGE, DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AetherConfig {
    /// Age threshold, in whole days, after which rarely used gems may be released
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Gems used fewer times than this are eligible once aged
    #[serde(default = "default_min_usage_threshold")]
    pub min_usage_threshold: u64,

    /// Storage location for the gem vault
    #[serde(default = "default_persist_path")]
    pub persist_path: PathBuf,

    /// Seconds between scheduled retention sweeps
    #[serde(default = "default_ritual_interval_secs")]
    pub ritual_interval_secs: u64,

    /// Capacity of the producer to gate channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Topic for committed intents
    #[serde(default = "default_topic")]
    pub default_topic: String,
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_min_usage_threshold() -> u64 {
    DEFAULT_MIN_USAGE
}

fn default_persist_path() -> PathBuf {
    PathBuf::from(".aether/vault")
}

fn default_ritual_interval_secs() -> u64 {
    86_400
}

fn default_channel_capacity() -> usize {
    64
}

fn default_topic() -> String {
    "render_light".to_string()
}

impl Default for AetherConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            min_usage_threshold: default_min_usage_threshold(),
            persist_path: default_persist_path(),
            ritual_interval_secs: default_ritual_interval_secs(),
            channel_capacity: default_channel_capacity(),
            default_topic: default_topic(),
        }
    }
}

impl AetherConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    /// Reject values the host cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.retention_days > MAX_RETENTION_DAYS {
            return Err(CoreError::Config(format!(
                "retention_days must be at most {MAX_RETENTION_DAYS}"
            )));
        }
        if self.ritual_interval_secs == 0 {
            return Err(CoreError::Config("ritual_interval_secs must be positive".into()));
        }
        if self.channel_capacity == 0 {
            return Err(CoreError::Config("channel_capacity must be positive".into()));
        }
        if self.default_topic.trim().is_empty() {
            return Err(CoreError::Config("default_topic must not be empty".into()));
        }
        Ok(())
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.retention_days, self.min_usage_threshold)
    }

    pub fn ritual_interval(&self) -> Duration {
        Duration::from_secs(self.ritual_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AetherConfig::from_toml_str("").unwrap();
        assert_eq!(config, AetherConfig::default());
        assert_eq!(config.retention_days, 15);
        assert_eq!(config.min_usage_threshold, 3);
        assert_eq!(config.persist_path, PathBuf::from(".aether/vault"));
        assert_eq!(config.retention_policy(), RetentionPolicy::new(15, 3));
    }

    #[test]
    fn overrides_are_applied() {
        let config = AetherConfig::from_toml_str(
            "retention_days = 30\nmin_usage_threshold = 1\npersist_path = \"/tmp/gems\"\n",
        )
        .unwrap();
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.min_usage_threshold, 1);
        assert_eq!(config.persist_path, PathBuf::from("/tmp/gems"));
        assert_eq!(config.ritual_interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AetherConfig::from_toml_str("retention_days = -1").is_err());
        assert!(AetherConfig::from_toml_str("channel_capacity = 0").is_err());
        assert!(AetherConfig::from_toml_str("ritual_interval_secs = 0").is_err());
    }

    #[test]
    fn retention_days_is_bounded() {
        assert!(AetherConfig::from_toml_str("retention_days = 36500").is_ok());
        assert!(AetherConfig::from_toml_str("retention_days = 36501").is_err());
        let err = AetherConfig::from_toml_str("retention_days = 4000000000").unwrap_err();
        assert!(err.to_string().contains("retention_days"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_topic = \"aura\"").unwrap();
        let config = AetherConfig::load(file.path()).unwrap();
        assert_eq!(config.default_topic, "aura");

        let missing = AetherConfig::load("/nonexistent/aether.toml").unwrap_err();
        assert!(matches!(missing, CoreError::Io(_)));
    }
}
