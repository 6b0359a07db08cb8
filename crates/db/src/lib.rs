//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{ApprovalRepository, JournalRepository, ReportQueryRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use canebooks_shared::config::DatabaseConfig;

/// Establishes a pooled connection per the database configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
