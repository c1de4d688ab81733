use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::{env, time::Duration};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub bot: BotConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub houses: HousesConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotConfig {
    /// Bot username without `@`, used to build deep links.
    pub username: String,
    pub developer_chat_id: i64,
    pub registration_chat_id: i64,
    #[serde(default)]
    pub admins: Vec<i64>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl BotConfig {
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            retries: default_retries(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
        }
    }
}

impl AuditConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

fn default_queue_capacity() -> usize {
    8
}

fn default_retries() -> u32 {
    3
}

fn default_attempt_timeout_ms() -> u64 {
    500
}

fn default_enqueue_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct HousesConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for HousesConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl HousesConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (BOTCOMOD__TOKEN__SECRET, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite:botcomod.db")?
            .set_default("database.max_connections", 5)?
            .set_default("bot.username", "botcomod_bot")?
            .set_default("bot.developer_chat_id", 0)?
            .set_default("bot.registration_chat_id", 0)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("BOTCOMOD")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("bot.admins")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.token.secret.len() < 32 {
            return Err("Token secret must be at least 32 characters long".to_string());
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.bot.username.trim().is_empty() {
            return Err("Bot username must not be empty".to_string());
        }
        if self.audit.queue_capacity == 0 {
            return Err("Audit queue_capacity must be at least 1".to_string());
        }
        if self.audit.retries == 0 {
            return Err("Audit retries must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:test.db".to_string(),
                max_connections: 5,
            },
            bot: BotConfig {
                username: "botcomod_bot".to_string(),
                developer_chat_id: 1,
                registration_chat_id: 2,
                admins: vec![1],
                webhook_secret: None,
            },
            token: TokenConfig {
                secret: "test_secret_key_minimum_32_characters_long".to_string(),
            },
            audit: AuditConfig::default(),
            houses: HousesConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_short_secret() {
        let mut config = valid_config();
        config.token.secret = "short".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_connections() {
        let mut config = valid_config();
        config.database.max_connections = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_audit_queue() {
        let mut config = valid_config();
        config.audit.queue_capacity = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audit_defaults() {
        let audit = AuditConfig::default();

        assert_eq!(audit.queue_capacity, 8);
        assert_eq!(audit.retries, 3);
        assert_eq!(audit.attempt_timeout(), Duration::from_millis(500));
        assert_eq!(audit.enqueue_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_admin_lookup() {
        let config = valid_config();

        assert!(config.bot.is_admin(1));
        assert!(!config.bot.is_admin(2));
    }
}
