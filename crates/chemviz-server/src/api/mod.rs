//! Router assembly and the server loop.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{signal, sync::Notify};
use tower_http::compression::CompressionLayer;

use crate::auth::TokenService;
use crate::config::Config;
use crate::db;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::storage::Storage;

/// Handles shared by every route
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: SqlitePool,
    pub storage: Storage,
    pub tokens: TokenService,
}

impl AppState {
    pub async fn new(config: &Config, db: SqlitePool) -> anyhow::Result<Self> {
        Ok(Self {
            storage: Storage::new(&config.media).await?,
            tokens: TokenService::new(&config.auth),
            db,
        })
    }

    fn features(&self) -> FeatureState {
        FeatureState {
            db: self.db.clone(),
            storage: self.storage.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

/// `/health` stays open; everything under `/api` goes through the feature
/// router and its bearer guard.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let api = features::router(state.features());

    Router::new()
        .route("/health", get(health))
        .with_state(state)
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Serve until Ctrl+C or SIGTERM, then let in-flight requests finish for at
/// most `shutdown_timeout_secs`.
pub async fn serve(config: Config, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state, &config);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "chemviz server listening");

    let stop = Arc::new(Notify::new());
    let drained = {
        let stop = Arc::clone(&stop);
        async move { stop.notified().await }
    };
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(drained)
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        },
        () = shutdown_requested() => {},
    }

    let drain_limit = Duration::from_secs(config.server.shutdown_timeout_secs);
    tracing::info!(timeout_secs = drain_limit.as_secs(), "Draining connections");
    stop.notify_one();

    match tokio::time::timeout(drain_limit, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("Connections still open after shutdown timeout, aborting");
            server.abort();
        },
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "healthy", "version": env!("CARGO_PKG_VERSION")})),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy", "error": e.to_string()})),
            )
        },
    }
}

async fn shutdown_requested() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("Ctrl+C received"),
        () = terminate => tracing::info!("SIGTERM received"),
    }
}
