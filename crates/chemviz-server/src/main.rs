//! chemviz server - main entry point

use anyhow::Result;
use chemviz_common::logging::{init_logging, LogConfig};
use tracing::info;

use chemviz_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("chemviz-server")
        .filter_directives("chemviz_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting chemviz server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let state = api::AppState::new(&config, pool).await?;
    api::serve(config, state).await
}
