//! `tripvisord`: the Tripvisor social server binary.
//!
//! Usage:
//!   tripvisord -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/tripvisor/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use social::SocialModule;
use tripvisor_core::{Authenticator, JwtAuthenticator, Module, ServiceConfig};
use tripvisor_kv::{KVStore, RedbStore};

use config::ServerConfig;

/// Tripvisor social server.
#[derive(Parser, Debug)]
#[command(name = "tripvisord", about = "Tripvisor social server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    server_config.validate()?;

    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = ServiceConfig {
        data_dir: Some(data_dir),
        db_path: server_config.storage.db_path.as_ref().map(PathBuf::from),
        listen: cli.listen.clone(),
    };

    let db_path = core_config.resolve_db_path();
    let kv: Arc<dyn KVStore> = Arc::new(
        RedbStore::open(&db_path).map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("KV store opened at {}", db_path.display());

    let authenticator: Arc<dyn Authenticator> =
        Arc::new(JwtAuthenticator::from_secret(&server_config.jwt.secret));

    let social_module = SocialModule::new(kv, (&server_config.social).into(), authenticator);
    info!("Social module initialized");

    let module_routes = vec![(social_module.name(), social_module.routes())];
    let app = routes::build_router(module_routes);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("tripvisord listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("tripvisord stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
