use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSocketConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_timeout_secs: u64,
}

impl WebSocketConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentityConfig {
    /// Replaces the built-in candidate names when set.
    pub names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::defaults_builder()?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_WEBSOCKET__PORT=5001` would set `Settings.websocket.port`
            .add_source(Self::environment("app"))
            .build()?
            .try_deserialize()
    }

    /// Rejects values that would break the heartbeat at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.websocket.heartbeat_interval_secs == 0 {
            return Err(AppError::ValidationError(
                "websocket.heartbeat_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.websocket.heartbeat_timeout_secs < self.websocket.heartbeat_interval_secs {
            return Err(AppError::ValidationError(format!(
                "websocket.heartbeat_timeout_secs ({}) must not be shorter than the interval ({})",
                self.websocket.heartbeat_timeout_secs, self.websocket.heartbeat_interval_secs
            )));
        }
        Ok(())
    }

    // `APP_IDENTITY__NAMES=Ali,Omar` is read as a list
    fn environment(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("identity.names")
    }

    /// Built-in defaults only; no config files and no environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::defaults_builder()?.build()?.try_deserialize()
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("websocket.host", "127.0.0.1")?
            .set_default("websocket.port", 4000)?
            .set_default("websocket.path", "/chat")?
            .set_default("websocket.heartbeat_interval_secs", 30)?
            .set_default("websocket.heartbeat_timeout_secs", 40)?
            .set_default("cors.enabled", true)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)
    }
}
