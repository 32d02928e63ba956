//! Listener configuration.

use std::time::Duration;

use url::Url;

/// Reconnection attempts before the live channel gives up and falls back to
/// polling.
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Delay between two polls in continuous fallback mode.
pub const DEFAULT_READ_DELAY: Duration = Duration::from_secs(5);

/// Configuration of an [`EventListener`](crate::EventListener).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Push endpoint. `None` means events are only ever polled.
    pub websocket_url: Option<Url>,
    /// Abnormal closures tolerated before switching to polling for good.
    pub max_tries: u32,
    /// Delay between polls in continuous mode.
    pub read_delay: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            websocket_url: None,
            max_tries: DEFAULT_MAX_TRIES,
            read_delay: DEFAULT_READ_DELAY,
        }
    }
}

impl ListenerConfig {
    pub fn with_websocket_url(mut self, url: Url) -> Self {
        self.websocket_url = Some(url);
        self
    }

    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    pub fn with_read_delay(mut self, read_delay: Duration) -> Self {
        self.read_delay = read_delay;
        self
    }
}

/// Everything needed to talk to one Jeedom box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JeedomConfig {
    /// `core/api/jeeApi.php` endpoint.
    pub json_rpc_url: Url,
    pub listener: ListenerConfig,
}

impl JeedomConfig {
    pub fn new(json_rpc_url: Url) -> Self {
        Self {
            json_rpc_url,
            listener: ListenerConfig::default(),
        }
    }

    pub fn with_listener(mut self, listener: ListenerConfig) -> Self {
        self.listener = listener;
        self
    }

    /// A JSON-RPC client for [`json_rpc_url`](Self::json_rpc_url), without
    /// credential.
    pub fn client(&self) -> jeedom_sdk::client::JeedomClient {
        jeedom_sdk::client::JeedomClient::new(self.json_rpc_url.clone())
    }
}
