//! Read-only HTTP projection of the leaderboard.

use core::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use eyre::{Result as EyreResult, WrapErr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use worboo_leaderboard::LeaderboardHandle;

mod handlers;
pub mod service;


#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Registry address reported by `/healthz`.
    pub registry: String,
    /// RPC endpoint reported by `/healthz`.
    pub rpc_url: String,
    /// Entries returned by `/leaderboard` without a `limit`.
    pub default_limit: usize,
}

impl ServerConfig {
    #[must_use]
    pub const fn new(
        listen: SocketAddr,
        registry: String,
        rpc_url: String,
        default_limit: usize,
    ) -> Self {
        Self {
            listen,
            registry,
            rpc_url,
            default_limit,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ServiceState {
    pub(crate) config: ServerConfig,
    pub(crate) leaderboard: LeaderboardHandle,
}

#[must_use]
pub fn router(config: ServerConfig, leaderboard: LeaderboardHandle) -> Router {
    let state = Arc::new(ServiceState {
        config,
        leaderboard,
    });

    Router::new()
        .route("/leaderboard", get(handlers::leaderboard_handler))
        .route("/players/:address", get(handlers::player_handler))
        .route("/healthz", get(handlers::health_handler))
        .with_state(state)
}

/// Serves the leaderboard until `shutdown` is cancelled.
pub async fn start(
    config: ServerConfig,
    leaderboard: LeaderboardHandle,
    shutdown: CancellationToken,
) -> EyreResult<()> {
    let listen = config.listen;

    let listener = TcpListener::bind(listen)
        .await
        .wrap_err_with(|| format!("failed to bind {listen}"))?;

    info!("Leaderboard API listening on 'http://{}'", listen);

    axum::serve(listener, router(config, leaderboard))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
