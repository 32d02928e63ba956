//! Configuration module for jeedom-listen.
//!
//! Handles loading configuration from the TOML file, CLI arguments and
//! environment variables.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use jeedom_core::{JeedomConfig, ListenerConfig};
use jeedom_sdk::ApiKey;
use thiserror::Error;
use url::Url;

use crate::config::file::{AuthConfig, FileConfig};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// How to obtain the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(ApiKey),
    Login { login: String, password: String },
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub jeedom: JeedomConfig,
    pub credential: Credential,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    api_key_override: Option<String>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, api_key_override: Option<String>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            api_key_override,
        }
    }

    /// Read, override, validate and convert.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(api_key) = self.api_key_override.clone() {
            file_config.auth.api_key = Some(api_key);
        }

        self.validate(&file_config)?;
        let credential = credential(file_config.auth)?;

        let mut listener = ListenerConfig::default()
            .with_max_tries(file_config.listener.max_tries)
            .with_read_delay(Duration::from_millis(file_config.listener.read_delay_ms));
        if let Some(url) = file_config.server.websocket_url {
            listener = listener.with_websocket_url(url);
        }

        Ok(LoadedConfig {
            jeedom: JeedomConfig::new(file_config.server.json_rpc_url).with_listener(listener),
            credential,
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        check_scheme("server.json_rpc_url", &config.server.json_rpc_url, &["http", "https"])?;
        if let Some(url) = &config.server.websocket_url {
            check_scheme("server.websocket_url", url, &["ws", "wss"])?;
        }
        if config.listener.max_tries == 0 {
            return Err(ConfigError::ValidationError(
                "listener.max_tries must be at least 1".into(),
            ));
        }
        if config.listener.read_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "listener.read_delay_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn check_scheme(field: &str, url: &Url, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&url.scheme()) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must use one of {allowed:?}, got {}",
            url.scheme()
        )))
    }
}

/// An API key wins over login and password.
fn credential(auth: AuthConfig) -> Result<Credential, ConfigError> {
    match auth {
        AuthConfig {
            api_key: Some(key), ..
        } if !key.is_empty() => Ok(Credential::ApiKey(ApiKey::new(key))),
        AuthConfig {
            login: Some(login),
            password: Some(password),
            ..
        } => Ok(Credential::Login { login, password }),
        _ => Err(ConfigError::ValidationError(
            "auth needs either api_key, or login and password".into(),
        )),
    }
}
