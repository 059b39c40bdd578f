//! Migrate command - applies schema migrations to PostgreSQL and exits

use anyhow::Context;
use tracing::info;

use crate::infrastructure::storage::{connect_pool, run_migrations};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let pg_config = crate::postgres_config(&config.storage)
        .context("The migrate command needs storage.database_url")?;
    let pool = connect_pool(&pg_config).await?;

    let applied = run_migrations(&pool).await?;
    info!(applied, "Migrations complete");

    pool.close().await;
    Ok(())
}
