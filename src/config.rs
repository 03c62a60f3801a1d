//! Configuration System
//!
//! Server, collaborator, engine and logging settings. Read from a TOML
//! file, then overridden by `MOODLINE_*` environment variables (and
//! `GROQ_API_KEY` for the collaborator credentials).

use crate::analytics::{CorrelationAlignment, ForecastStrategy};
use crate::collaborator::{clamp_timeout_secs, CollaboratorConfig};
use crate::insights::{clamp_threshold, InsightConfig, PromptSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub collaborator: CollaboratorSettings,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024 // 2 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Text-generation collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorSettings {
    #[serde(default = "default_collaborator_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Clamped to 10..=30 when used
    #[serde(default = "default_collaborator_timeout")]
    pub timeout_secs: u64,
}

fn default_collaborator_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_collaborator_timeout() -> u64 {
    30
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            base_url: default_collaborator_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_collaborator_timeout(),
        }
    }
}

impl CollaboratorSettings {
    /// Settings for [`crate::collaborator::ChatCompletionsClient`]
    pub fn client_config(&self) -> CollaboratorConfig {
        CollaboratorConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout_secs: clamp_timeout_secs(self.timeout_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Local analytics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub forecast_strategy: ForecastStrategy,

    /// Fixed seed for the heuristic forecaster
    #[serde(default)]
    pub forecast_seed: Option<u64>,

    #[serde(default)]
    pub correlation_alignment: CorrelationAlignment,

    /// Clamped to 0.2..=0.3 when used
    #[serde(default = "default_recommendation_threshold")]
    pub recommendation_threshold: f64,
}

fn default_recommendation_threshold() -> f64 {
    0.3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            forecast_strategy: ForecastStrategy::default(),
            forecast_seed: None,
            correlation_alignment: CorrelationAlignment::default(),
            recommendation_threshold: default_recommendation_threshold(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("moodline").join("config.toml")),
            Some(PathBuf::from("/etc/moodline/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Settings for [`crate::insights::InsightEngine`]
    pub fn insight_config(&self) -> InsightConfig {
        InsightConfig {
            prompt: PromptSettings {
                model: self.collaborator.model.clone(),
                temperature: self.collaborator.temperature,
                max_tokens: self.collaborator.max_tokens,
            },
            collaborator_timeout: self.collaborator.client_config().timeout(),
            forecast_strategy: self.engine.forecast_strategy,
            forecast_seed: self.engine.forecast_seed,
            correlation_alignment: self.engine.correlation_alignment,
            recommendation_threshold: clamp_threshold(self.engine.recommendation_threshold),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(host) = var("MOODLINE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("MOODLINE_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Collaborator overrides
        if let Some(url) = var("MOODLINE_COLLABORATOR_URL") {
            self.collaborator.base_url = url;
        }
        if let Some(model) = var("MOODLINE_COLLABORATOR_MODEL") {
            self.collaborator.model = model;
        }
        if let Some(key) = var("MOODLINE_COLLABORATOR_API_KEY").or_else(|| var("GROQ_API_KEY")) {
            self.collaborator.api_key = Some(key);
        }
        if let Some(secs) = var("MOODLINE_COLLABORATOR_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.collaborator.timeout_secs = secs;
        }

        // Engine overrides
        if let Some(strategy) = var("MOODLINE_FORECAST_STRATEGY") {
            match strategy.parse() {
                Ok(s) => self.engine.forecast_strategy = s,
                Err(e) => tracing::warn!("Ignoring MOODLINE_FORECAST_STRATEGY: {}", e),
            }
        }
        if let Some(seed) = var("MOODLINE_FORECAST_SEED").and_then(|s| s.parse().ok()) {
            self.engine.forecast_seed = Some(seed);
        }
        if let Some(alignment) = var("MOODLINE_CORRELATION_ALIGNMENT") {
            match alignment.parse() {
                Ok(a) => self.engine.correlation_alignment = a,
                Err(e) => tracing::warn!("Ignoring MOODLINE_CORRELATION_ALIGNMENT: {}", e),
            }
        }

        // Logging overrides
        if let Some(level) = var("MOODLINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("MOODLINE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Moodline Configuration
#
# Environment variables override these settings:
# - MOODLINE_API_HOST
# - MOODLINE_API_PORT
# - MOODLINE_COLLABORATOR_URL
# - MOODLINE_COLLABORATOR_MODEL
# - MOODLINE_COLLABORATOR_API_KEY (or GROQ_API_KEY)
# - MOODLINE_COLLABORATOR_TIMEOUT_SECS
# - MOODLINE_FORECAST_STRATEGY
# - MOODLINE_FORECAST_SEED
# - MOODLINE_CORRELATION_ALIGNMENT
# - MOODLINE_LOG_LEVEL
# - MOODLINE_LOG_FORMAT

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8000

# Largest accepted request body (bytes)
max_body_bytes = 2097152

[collaborator]
# OpenAI-compatible chat completions endpoint (without /chat/completions)
base_url = "https://api.groq.com/openai/v1"

# API key; prefer the GROQ_API_KEY environment variable
# api_key = ""

# Model name sent with every request
model = "mixtral-8x7b-32768"

# Sampling temperature
temperature = 0.3

# Completion length limit
max_tokens = 1000

# Give up on the collaborator after this many seconds (10-30)
timeout_secs = 30

[engine]
# Next-day forecaster: regression (deterministic) or heuristic (adds noise)
forecast_strategy = "regression"

# Fixed seed for the heuristic forecaster's noise
# forecast_seed = 42

# Pair correlation samples by calendar date or by position
correlation_alignment = "date"

# Correlations stronger than this become recommendations (0.2-0.3)
recommendation_threshold = 0.3

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.addr(), "0.0.0.0:8000");
        assert_eq!(config.collaborator.model, "mixtral-8x7b-32768");
        assert_eq!(config.engine.forecast_strategy, ForecastStrategy::Regression);
        assert_eq!(config.engine.correlation_alignment, CorrelationAlignment::Date);
        assert!(!config.collaborator.has_api_key());
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_default_template_parses() {
        let file = write_config(&generate_default_config());
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.port, 8000);
        assert_eq!(config.collaborator.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.collaborator.timeout_secs, 30);
        assert_eq!(config.engine.recommendation_threshold, 0.3);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[engine]
forecast_strategy = "heuristic"
forecast_seed = 7

[collaborator]
timeout_secs = 5
"#,
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.engine.forecast_strategy, ForecastStrategy::Heuristic);
        assert_eq!(config.engine.forecast_seed, Some(7));
        assert_eq!(config.api.port, 8000);
        // Clamped up to the minimum when used
        assert_eq!(config.collaborator.client_config().timeout_secs, 10);
        assert_eq!(config.insight_config().collaborator_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let file = write_config("[engine]\nforecast_strategy = \"lstm\"\n");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MOODLINE_API_PORT", "9100"),
            ("MOODLINE_API_HOST", "127.0.0.1"),
            ("GROQ_API_KEY", "gsk-test"),
            ("MOODLINE_COLLABORATOR_TIMEOUT_SECS", "12"),
            ("MOODLINE_FORECAST_STRATEGY", "heuristic"),
            ("MOODLINE_FORECAST_SEED", "99"),
            ("MOODLINE_CORRELATION_ALIGNMENT", "position"),
            ("MOODLINE_LOG_FORMAT", "json"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.addr(), "127.0.0.1:9100");
        assert_eq!(config.collaborator.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.collaborator.timeout_secs, 12);
        assert_eq!(config.engine.forecast_strategy, ForecastStrategy::Heuristic);
        assert_eq!(config.engine.forecast_seed, Some(99));
        assert_eq!(config.engine.correlation_alignment, CorrelationAlignment::Position);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "MOODLINE_API_PORT" => Some("not-a-port".to_string()),
            "MOODLINE_FORECAST_STRATEGY" => Some("lstm".to_string()),
            _ => None,
        });

        assert_eq!(config.api.port, 8000);
        assert_eq!(config.engine.forecast_strategy, ForecastStrategy::Regression);
    }

    #[test]
    fn test_specific_key_wins_over_groq_key() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "MOODLINE_COLLABORATOR_API_KEY" => Some("specific".to_string()),
            "GROQ_API_KEY" => Some("groq".to_string()),
            _ => None,
        });
        assert_eq!(config.collaborator.api_key.as_deref(), Some("specific"));
    }

    #[test]
    fn test_blank_api_key_is_not_sent() {
        let settings = CollaboratorSettings {
            api_key: Some("  ".to_string()),
            ..CollaboratorSettings::default()
        };
        assert!(!settings.has_api_key());
        assert!(settings.client_config().api_key.is_none());
    }

    #[test]
    fn test_insight_config_clamps_threshold() {
        let mut config = Config::default();
        config.engine.recommendation_threshold = 0.05;
        assert_eq!(config.insight_config().recommendation_threshold, 0.2);
        assert_eq!(config.insight_config().prompt.max_tokens, 1000);
    }
}
