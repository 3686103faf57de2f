use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    log::info!("Database connected");

    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 关闭连接池，在 HTTP 服务停止后调用
pub async fn close_pool(pool: DbPool) -> AppResult<()> {
    pool.close().await?;
    log::info!("Database connection closed");
    Ok(())
}
