use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Endpoint watched when no usable configuration file is found.
pub const FALLBACK_WEBSITE: &str = "https://www.google.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonitorConfig {
    pub websites: Vec<String>,
    #[serde(default = "default_check_interval", alias = "refresh_interval_seconds")]
    pub check_interval: u64,
    #[serde(default = "default_timeout", alias = "timeout_seconds")]
    pub timeout: u64,
    #[serde(default = "default_history_size", alias = "max_history_length")]
    pub history_size: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

pub fn default_check_interval() -> u64 { 60 }
pub fn default_timeout() -> u64 { 10 }
pub fn default_history_size() -> usize { 10 }
fn default_max_concurrency() -> usize { 64 }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            websites: vec![FALLBACK_WEBSITE.to_string()],
            check_interval: default_check_interval(),
            timeout: default_timeout(),
            history_size: default_history_size(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Values given on the command line; each one replaces its config counterpart.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub check_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub history_size: Option<usize>,
    pub max_concurrency: Option<usize>,
}

impl MonitorConfig {
    /// Reads a YAML config, or JSON when the file ends in `.json`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Loads the config file, degrading to [`MonitorConfig::default`] when it
    /// is missing or unparseable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), websites = config.websites.len(), "Configuration loaded");
                config
            }
            Err(e) => {
                warn!(error = %e, fallback = FALLBACK_WEBSITE, "Using default configuration");
                Self::default()
            }
        }
    }

    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(interval) = overrides.check_interval {
            self.check_interval = interval;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(size) = overrides.history_size {
            self.history_size = size;
        }
        if let Some(limit) = overrides.max_concurrency {
            self.max_concurrency = limit;
        }
        self.dedup_websites();
        self
    }

    /// Keeps the first occurrence of each URL, in order.
    fn dedup_websites(&mut self) {
        let before = self.websites.len();
        let unique: IndexSet<String> = self.websites.drain(..).collect();
        self.websites = unique.into_iter().collect();
        if self.websites.len() < before {
            warn!(
                dropped = before - self.websites.len(),
                "Ignoring repeated entries in `websites`"
            );
        }
    }

    /// Checks the merged configuration. Unlike a missing or unparseable
    /// file, which falls back to defaults, a failure here stops startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websites.is_empty() {
            return Err(ConfigError::Invalid("`websites` must list at least one URL".into()));
        }
        if let Some(blank) = self.websites.iter().position(|w| w.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("website #{} is empty", blank + 1)));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::Invalid("check interval must be greater than 0".into()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than 0".into()));
        }
        if self.history_size == 0 {
            return Err(ConfigError::Invalid("history size must be greater than 0".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max concurrency must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn yaml_with_defaults() {
        let file = write_config(".yaml", "websites:\n  - https://a.example\n  - https://b.example\n");
        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.websites, ["https://a.example", "https://b.example"]);
        assert_eq!(config.check_interval, 60);
        assert_eq!(config.timeout, 10);
        assert_eq!(config.history_size, 10);
    }

    #[test]
    fn yaml_accepts_alias_names() {
        let file = write_config(
            ".yaml",
            "websites: [https://a.example]\nrefresh_interval_seconds: 15\ntimeout_seconds: 3\nmax_history_length: 25\n",
        );
        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.check_interval, 15);
        assert_eq!(config.timeout, 3);
        assert_eq!(config.history_size, 25);
    }

    #[test]
    fn json_by_extension() {
        let file = write_config(".json", r#"{"websites": ["https://a.example"], "check_interval": 5}"#);
        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.check_interval, 5);
    }

    #[test]
    fn missing_websites_is_a_parse_error() {
        let file = write_config(".yaml", "check_interval: 5\n");
        let err = MonitorConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonitorConfig::load_or_default(&dir.path().join("nope.yaml"));
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.websites, [FALLBACK_WEBSITE]);
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let overrides = Overrides {
            check_interval: Some(30),
            timeout: None,
            history_size: Some(4),
            max_concurrency: None,
        };
        let config = MonitorConfig::default().apply(&overrides);
        assert_eq!(config.check_interval, 30);
        assert_eq!(config.timeout, 10);
        assert_eq!(config.history_size, 4);
    }

    #[test]
    fn repeated_websites_are_dropped_keeping_order() {
        let file = write_config(
            ".yaml",
            "websites:\n  - https://b.example\n  - https://a.example\n  - https://b.example\n  - https://c.example\n  - https://a.example\n",
        );
        let config = MonitorConfig::from_file(file.path()).unwrap().apply(&Overrides::default());
        assert_eq!(config.websites, ["https://b.example", "https://a.example", "https://c.example"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_values() {
        let zero_timeout = MonitorConfig { timeout: 0, ..MonitorConfig::default() };
        assert!(matches!(zero_timeout.validate(), Err(ConfigError::Invalid(_))));

        let no_sites = MonitorConfig { websites: vec![], ..MonitorConfig::default() };
        assert!(no_sites.validate().is_err());

        assert!(MonitorConfig::default().validate().is_ok());
    }
}
