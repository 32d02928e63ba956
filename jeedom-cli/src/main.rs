//! Jeedom event listener
//!
//! Connects to a Jeedom box, follows its event stream (live socket with a
//! polling fallback) and logs every command and summary change.

mod config;
mod shutdown;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::{ConfigLoader, Credential};
use jeedom_core::{EventListener, MemoryStore, NetworkStatus};
use shutdown::shutdown_signal;
use sink::LoggingSink;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Follow the event stream of a Jeedom box
#[derive(Parser, Debug)]
#[command(name = "jeedom-listen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./jeedom.toml")]
    config: PathBuf,

    /// API key, overrides the `[auth]` section
    #[arg(long, env = "JEEDOM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log the visible objects and their equipments before listening
    #[arg(long, default_value = "false")]
    list_objects: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting jeedom-listen v{}", env!("CARGO_PKG_VERSION"));

    let loaded = ConfigLoader::new(&args.config, args.api_key)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let client = Arc::new(loaded.jeedom.client());
    let api_key = match loaded.credential {
        Credential::ApiKey(key) => key,
        Credential::Login { login, password } => {
            tracing::info!(%login, "Logging in...");
            client.get_api_key(&login, &password).await?
        }
    };
    client.set_api_key(api_key);

    if args.list_objects {
        for object in client.get_objects().await? {
            tracing::info!(
                id = %object.id,
                name = %object.name,
                equipments = object.eq_logics.len(),
                summary = ?object.summary_keys,
                "Object"
            );
        }
    }

    let store = Arc::new(MemoryStore::new());
    store.set_authenticated(true);
    let network = NetworkStatus::new(true);
    let listener = EventListener::new(
        loaded.jeedom.listener.clone(),
        client.clone(),
        Arc::new(network),
        Arc::new(LoggingSink::new(store.clone())),
    );

    listener.start(true, true);

    let result = shutdown_signal().await;

    tracing::info!("Closing events listener...");
    listener.close();
    tracing::info!(
        commands = store.command_count(),
        cursor = %listener.cursor(),
        "Shutdown complete"
    );

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jeedom_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
