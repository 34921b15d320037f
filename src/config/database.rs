//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models,
//! including the unique cylinder number, the unique setting key and the foreign key
//! from consumption logs to cylinders.

use crate::entities::{ConsumptionLog, Cylinder, Setting};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Database used when neither `DATABASE_URL` nor `config.toml` name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/soda_tracker.sqlite?mode=rwc";

/// Creates the directory a file-backed `SQLite` URL points into.
///
/// `sqlite::memory:` and URLs without a parent directory are left alone.
pub fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating database directory {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Establishes a connection to the database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    ensure_sqlite_parent_dir(database_url)?;
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Cylinders are created before consumption logs so the foreign key target exists.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut cylinder_table = schema.create_table_from_entity(Cylinder);
    let mut log_table = schema.create_table_from_entity(ConsumptionLog);
    let mut setting_table = schema.create_table_from_entity(Setting);

    db.execute(builder.build(cylinder_table.if_not_exists()))
        .await?;
    db.execute(builder.build(log_table.if_not_exists())).await?;
    db.execute(builder.build(setting_table.if_not_exists()))
        .await?;

    info!("Database tables ensured");
    Ok(())
}
