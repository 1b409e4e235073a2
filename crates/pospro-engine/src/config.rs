//! # Engine Configuration
//!
//! Configuration for the checkout engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     POSPRO_DB_PATH=/var/lib/pospro/pospro.db                           │
//! │     POSPRO_MAX_CART_ITEMS=50                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pospro/engine.toml (Linux)                               │
//! │     ~/Library/Application Support/com.pospro.pospro/engine.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [database]
//! path = "pospro.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! acquire_timeout_ms = 30000
//!
//! [checkout]
//! max_cart_items = 100
//! max_item_quantity = 999
//! allow_discount_clamp = false
//!
//! [retry]
//! max_attempts = 5
//! initial_interval_ms = 20
//! max_interval_ms = 500
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use pospro_core::requests::CheckoutLimits;
use pospro_core::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};
use pospro_db::DbConfig;

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size. Writers still serialize on SQLite's single write lock.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the write lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// How long to wait for a free pooled connection (milliseconds).
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("pospro.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout() -> u64 {
    5_000
}
fn default_acquire_timeout() -> u64 {
    30_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
            acquire_timeout_ms: default_acquire_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Pool configuration for [`pospro_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .acquire_timeout(Duration::from_millis(self.acquire_timeout_ms))
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    #[serde(default = "default_max_cart_items")]
    pub max_cart_items: usize,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    /// Honour `clamp_discount` on checkout requests. When false an oversized
    /// discount is always rejected.
    #[serde(default)]
    pub allow_discount_clamp: bool,
}

fn default_max_cart_items() -> usize {
    MAX_CART_ITEMS
}
fn default_max_item_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            max_cart_items: default_max_cart_items(),
            max_item_quantity: default_max_item_quantity(),
            allow_discount_clamp: false,
        }
    }
}

impl CheckoutSettings {
    pub fn limits(&self) -> CheckoutLimits {
        CheckoutLimits {
            max_cart_items: self.max_cart_items,
            max_item_quantity: self.max_item_quantity,
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Re-running whole units on transient storage errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first. 1 disables retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_interval() -> u64 {
    20
}
fn default_max_interval() -> u64 {
    500
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            initial_interval_ms: default_initial_interval(),
            max_interval_ms: default_max_interval(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `"info,pospro_db=debug,sqlx=warn"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must be set".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.checkout.max_cart_items == 0 {
            return Err(ConfigError::Invalid(
                "checkout.max_cart_items must be greater than 0".into(),
            ));
        }
        if self.checkout.max_item_quantity <= 0 {
            return Err(ConfigError::Invalid(
                "checkout.max_item_quantity must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.initial_interval_ms > self.retry.max_interval_ms {
            return Err(ConfigError::Invalid(
                "retry.initial_interval_ms must not exceed retry.max_interval_ms".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("POSPRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = env_parse::<u32>("POSPRO_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }

        if let Some(ms) = env_parse::<u64>("POSPRO_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = ms;
        }

        if let Some(max) = env_parse::<usize>("POSPRO_MAX_CART_ITEMS") {
            self.checkout.max_cart_items = max;
        }

        if let Some(max) = env_parse::<i64>("POSPRO_MAX_ITEM_QUANTITY") {
            self.checkout.max_item_quantity = max;
        }

        if let Ok(filter) = std::env::var("POSPRO_LOG_FILTER") {
            self.logging.filter = filter;
        }

        if let Some(attempts) = env_parse::<u32>("POSPRO_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = attempts;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pospro", "pospro")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => {
            debug!(key = key, value = %raw, "Overriding config from environment");
            Some(value)
        }
        Err(_) => {
            warn!(key = key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
