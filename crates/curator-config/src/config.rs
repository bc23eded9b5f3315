//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&paths.config_file)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &PathBuf) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Curator Configuration
# Ingest message files and links, classify them, keep them deduplicated.

[general]
# Data directory for the record database
# data_dir = "~/.local/share/curator"

[service]
# Content-understanding service address
base_url = "http://localhost:8089"

# Model identifier passed through to the service
model = "understanding-v1"

# Request timeout in seconds
timeout_seconds = 120

[fetcher]
# Optional auxiliary content fetcher (page scrapes, video transcripts).
# Leave disabled if no fetcher is running; the pipeline works without it.
enabled = false
base_url = "http://localhost:8090"
timeout_seconds = 60

[pipeline]
# Seconds to pause between items in a batch (rate limiting)
pacing_seconds = 15

# Retry policy for the understanding service
max_attempts = 5
initial_delay_seconds = 10
delay_multiplier = 1.5
max_delay_seconds = 60
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// Content-understanding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8089".to_string(),
            model: "understanding-v1".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Auxiliary content-fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8090".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Batch pacing and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pacing_seconds: u64,
    pub max_attempts: u32,
    pub initial_delay_seconds: u64,
    pub delay_multiplier: f64,
    pub max_delay_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pacing_seconds: 15,
            max_attempts: 5,
            initial_delay_seconds: 10,
            delay_multiplier: 1.5,
            max_delay_seconds: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.pacing_seconds, 15);
        assert_eq!(config.pipeline.max_attempts, 5);
        assert!(!config.fetcher.enabled);
    }

    #[test]
    fn test_default_config_string_parses() {
        let config: Config = toml::from_str(&Config::default_config_string()).unwrap();
        assert_eq!(config.service.timeout_seconds, 120);
        assert_eq!(config.pipeline.initial_delay_seconds, 10);
    }

    #[test]
    fn test_create_default_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_file(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pipeline.pacing_seconds, 15);

        // Writing again replaces an edited file with the template
        std::fs::write(&path, "[pipeline]\npacing_seconds = 1\n").unwrap();
        Config::create_default_file(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pipeline.pacing_seconds, 15);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[pipeline]\npacing_seconds = 0\n").unwrap();
        assert_eq!(config.pipeline.pacing_seconds, 0);
        assert_eq!(config.pipeline.max_attempts, 5);
        assert_eq!(config.service.base_url, "http://localhost:8089");
    }
}
