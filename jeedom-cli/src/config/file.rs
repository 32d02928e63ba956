//! TOML file configuration structures.
//!
//! These structs directly map to the `jeedom.toml` file format.

use serde::Deserialize;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Where the Jeedom box lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// JSON-RPC endpoint, e.g. `http://jeedom.local/core/api/jeeApi.php`.
    pub json_rpc_url: Url,
    /// Push endpoint. Leave out to poll only.
    #[serde(default)]
    pub websocket_url: Option<Url>,
}

/// Listener tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_tries: default_max_tries(),
            read_delay_ms: default_read_delay_ms(),
        }
    }
}

fn default_max_tries() -> u32 {
    jeedom_core::config::DEFAULT_MAX_TRIES
}

fn default_read_delay_ms() -> u64 {
    jeedom_core::config::DEFAULT_READ_DELAY.as_millis() as u64
}

/// Credentials. Either an API key, or a login and password exchanged for
/// one at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
