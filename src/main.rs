//! Keywarden key service.
//!
//! Usage:
//!   keywarden --port 3000 --webhook-url https://discord.com/api/webhooks/...
//!
//! Every flag can also be set through the environment variable named in
//! `--help`.

use clap::Parser;
use keywarden::config::{
    rotation_interval_from_hours, StoreConfig, StoreKind, DEFAULT_PORT,
};
use keywarden::http::{build_router, AppState};
use keywarden::manager::DEFAULT_KEY_DURATION_SECS;
use keywarden::notify::notifier_for;
use keywarden::store::open_store;
use keywarden::{KeyManager, KeyScheme, KeywardenConfig, KeywardenError, RotatingKey};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keywarden")]
#[command(about = "Short-lived access key issuance service")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Record store backend: memory or file
    #[arg(long, env = "KEYWARDEN_STORE", default_value_t = StoreKind::File)]
    store: StoreKind,

    /// Directory for the file store (defaults to the platform data dir)
    #[arg(long, env = "KEYWARDEN_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Webhook URL for key lifecycle notifications
    #[arg(long, env = "KEYWARDEN_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Lifetime in seconds of keys generated without a duration
    #[arg(long, env = "KEYWARDEN_DEFAULT_DURATION", default_value_t = DEFAULT_KEY_DURATION_SECS)]
    default_duration: i64,

    /// Format of issued keys: grouped or uuid
    #[arg(long, env = "KEYWARDEN_KEY_SCHEME", default_value_t = KeyScheme::Grouped)]
    key_scheme: KeyScheme,

    /// Hours between rotations of the key served at /key (0 disables it)
    #[arg(long, env = "KEYWARDEN_ROTATION_HOURS", default_value_t = 12)]
    rotation_hours: u64,

    /// Format of the rotating key: grouped or uuid
    #[arg(long, env = "KEYWARDEN_ROTATION_SCHEME", default_value_t = KeyScheme::Uuid)]
    rotation_scheme: KeyScheme,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<KeywardenConfig, KeywardenError> {
        let store = match self.store {
            StoreKind::Memory => StoreConfig::Memory,
            StoreKind::File => StoreConfig::File(self.store_dir),
        };
        let rotation_interval = rotation_interval_from_hours(self.rotation_hours)?;

        Ok(KeywardenConfig {
            store,
            webhook_url: self.webhook_url.filter(|url| !url.is_empty()),
            port: self.port,
            default_duration_secs: self.default_duration,
            key_scheme: self.key_scheme,
            rotation_interval,
            rotation_scheme: self.rotation_scheme,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), KeywardenError> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config()?;
    config.validate()?;

    info!("Keywarden starting...");
    let store = open_store(&config.store)?;
    let notifier = notifier_for(config.webhook_url.as_deref())?;
    if config.webhook_url.is_none() {
        info!("No webhook URL configured, notifications disabled");
    }

    let manager = Arc::new(KeyManager::new(store, notifier.clone(), config.key_scheme));
    let mut state = AppState::new(manager).with_default_duration(config.default_duration_secs);

    if let Some(interval) = config.rotation_interval {
        let rotation = Arc::new(RotatingKey::new(config.rotation_scheme, notifier));
        rotation.spawn(interval);
        info!(
            "Rotating key enabled (every {}h), current key: {}",
            interval.as_secs() / 3600,
            rotation.current_key()
        );
        state = state.with_rotation(rotation);
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| {
            KeywardenError::ConfigError(format!("Failed to bind port {}: {}", config.port, e))
        })?;
    info!("Key API listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| KeywardenError::Internal(format!("HTTP server failed: {}", e)))?;

    info!("Keywarden stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
