//! Configuration for the telemetry engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ordered conversion funnel steps. A conversion whose kind matches a
    /// step also emits a funnel step-completion event with its index here.
    pub funnel_steps: Vec<String>,

    /// Scroll-depth thresholds (percent) that each emit one engagement event
    /// the first time the running maximum crosses them.
    pub scroll_thresholds: Vec<u8>,

    /// Resources slower than this are reported as slow.
    pub slow_resource_threshold_ms: f64,

    /// Captured element value/text is truncated to this many characters.
    pub value_truncate_chars: usize,

    /// Path for storing variant assignments and other engine state.
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitepulse");

        Self {
            funnel_steps: vec![
                "page_view".to_string(),
                "portfolio_view".to_string(),
                "service_view".to_string(),
                "contact_form_view".to_string(),
                "contact_form_submit".to_string(),
            ],
            scroll_thresholds: vec![25, 50, 75, 100],
            slow_resource_threshold_ms: 1000.0,
            value_truncate_chars: 100,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitepulse")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Zero-based index of a conversion kind within the funnel, if it is one.
    pub fn funnel_index(&self, kind: &str) -> Option<usize> {
        self.funnel_steps.iter().position(|step| step == kind)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.funnel_steps.len(), 5);
        assert_eq!(config.scroll_thresholds, vec![25, 50, 75, 100]);
        assert_eq!(config.slow_resource_threshold_ms, 1000.0);
        assert_eq!(config.value_truncate_chars, 100);
    }

    #[test]
    fn test_funnel_index() {
        let config = Config::default();
        assert_eq!(config.funnel_index("page_view"), Some(0));
        assert_eq!(config.funnel_index("portfolio_view"), Some(1));
        assert_eq!(config.funnel_index("newsletter_signup"), None);
    }
}
