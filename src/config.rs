use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{SessionConfig, PAGE_SIZE, SESSION_TTL_MINUTES, TOP_K};
use crate::models::ScoringWeights;
use crate::services::DEFAULT_MAX_CANDIDATES;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    /// Unset means designers come from `matching.fixture_path`
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String { "claude-3-5-sonnet-latest".to_string() }
fn default_max_tokens() -> u32 { 1024 }
fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    pub shuffle_seed: Option<u64>,
    pub fixture_path: Option<String>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            page_size: default_page_size(),
            session_ttl_secs: default_session_ttl_secs(),
            max_candidates: default_max_candidates(),
            shuffle_seed: None,
            fixture_path: None,
        }
    }
}

impl MatchingSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: chrono::Duration::seconds(self.session_ttl_secs),
            page_size: self.page_size,
            shuffle_seed: self.shuffle_seed,
        }
    }
}

fn default_top_k() -> usize { TOP_K }
fn default_page_size() -> usize { PAGE_SIZE }
fn default_session_ttl_secs() -> i64 { SESSION_TTL_MINUTES * 60 }
fn default_max_candidates() -> usize { DEFAULT_MAX_CANDIDATES }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_category_weight")]
    pub category: u32,
    #[serde(default = "default_style_weight")]
    pub style: u32,
    #[serde(default = "default_portfolio_weight")]
    pub portfolio: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            category: default_category_weight(),
            style: default_style_weight(),
            portfolio: default_portfolio_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            category: config.category,
            style: config.style,
            portfolio: config.portfolio,
        }
    }
}

fn default_category_weight() -> u32 { 2 }
fn default_style_weight() -> u32 { 3 }
fn default_portfolio_weight() -> u32 { 1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ARTCONNECT__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ARTCONNECT__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ARTCONNECT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional unprefixed variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
        builder = builder.set_override("llm.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::from(&WeightsConfig::default());
        assert_eq!(weights, ScoringWeights::default());
        assert_eq!(weights.category, 2);
        assert_eq!(weights.style, 3);
        assert_eq!(weights.portfolio, 1);
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.top_k, 10);
        assert_eq!(matching.page_size, 2);
        assert_eq!(matching.max_candidates, 50);

        let session = matching.session_config();
        assert_eq!(session.ttl, chrono::Duration::minutes(30));
        assert_eq!(session.shuffle_seed, None);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("artconnect-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [llm]
            endpoint = "http://localhost:1234"
            api_key = "k"

            [matching]
            shuffle_seed = 7
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.server.port, 9090);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.matching.shuffle_seed, Some(7));
        assert_eq!(settings.matching.top_k, 10);
        assert_eq!(settings.llm.max_tokens, 1024);

        std::fs::remove_dir_all(&dir).ok();
    }
}
