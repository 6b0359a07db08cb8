//! Database migration runner.

use sea_orm_migration::MigratorTrait;
use tracing::info;

use canebooks_db::migration::Migrator;
use canebooks_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canebooks=info".into()),
        )
        .init();

    let config = AppConfig::load().expect("Failed to load configuration");
    let db = canebooks_db::connect(&config.database).await?;

    info!("Running migrations");
    Migrator::up(&db, None).await?;
    info!("Migrations complete");

    Ok(())
}
