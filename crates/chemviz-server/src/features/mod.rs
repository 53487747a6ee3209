//! Feature modules implementing the chemviz API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions and the slice's error-to-response mapping
//!
//! # Features
//!
//! - **auth**: token pair issuing and access token refresh
//! - **datasets**: CSV upload, history, raw download, latest summary

pub mod auth;
pub mod datasets;

use axum::{middleware::from_fn_with_state, Router};
use sqlx::SqlitePool;

use crate::auth::TokenService;
use crate::middleware::auth::require_bearer;
use crate::storage::Storage;

/// Shared state for all feature routes
#[derive(Clone, Debug)]
pub struct FeatureState {
    /// SQLite connection pool for the dataset store
    pub db: SqlitePool,
    /// Media directory holding uploaded files
    pub storage: Storage,
    /// Issued tokens
    pub tokens: TokenService,
}

/// Creates the API router with all feature routes mounted
///
/// - `/token/`, `/token/refresh/` - open
/// - `/upload/`, `/datasets/`, `/download/:id/`, `/latest_summary/` - bearer token required
pub fn router(state: FeatureState) -> Router<()> {
    let datasets = datasets::datasets_routes()
        .route_layer(from_fn_with_state(state.tokens.clone(), require_bearer))
        .with_state(state.clone());

    Router::new()
        .merge(auth::auth_routes().with_state(state.tokens.clone()))
        .merge(datasets)
}
