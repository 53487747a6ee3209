//! chemviz server library
//!
//! REST surface for uploading chemical-equipment CSV datasets and reading
//! back their summaries.
//!
//! # Architecture
//!
//! - **features**: vertical slices (`commands/`, `queries/`, `routes.rs`)
//! - **db**: SQLite pool, migrations and the append-only dataset store
//! - **storage**: uploaded files on disk under the media root
//! - **auth**: in-memory access/refresh tokens
//! - **middleware**: CORS, request tracing, bearer authentication
//!
//! # Example
//!
//! ```no_run
//! use chemviz_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     db::run_migrations(&pool).await?;
//!     let state = api::AppState::new(&config, pool).await?;
//!     api::serve(config, state).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;

pub use error::{AppError, AppResult};
