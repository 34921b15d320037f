//! Shared test utilities for the soda tracker.
//!
//! Helpers for an in-memory database and for creating cylinders and logs with
//! sensible defaults.

use crate::{
    core::{
        consumption_log::{self, NewLog},
        cylinder::{self, NewCylinder},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database-backed tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date in tests.
///
/// # Panics
/// On an invalid date.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates an inactive test cylinder.
pub async fn create_test_cylinder(
    db: &DatabaseConnection,
    number: i32,
    cost: f64,
) -> Result<entities::CylinderModel> {
    cylinder::create_cylinder(db, NewCylinder { number, cost }).await
}

/// Records a log with derived volume and pushes.
///
/// # Arguments
/// * `db` - Database connection
/// * `cylinder_id` - Cylinder to draw from
/// * `date` - Day of the log
/// * `bottle_size` - `"1L"` or `"0.5L"`
/// * `bottle_count` - Number of bottles
pub async fn create_test_log(
    db: &DatabaseConnection,
    cylinder_id: i32,
    date: NaiveDate,
    bottle_size: &str,
    bottle_count: i32,
) -> Result<entities::ConsumptionLogModel> {
    let created = consumption_log::create_log(
        db,
        NewLog {
            date,
            bottle_size: bottle_size.to_string(),
            bottle_count,
            cylinder_id,
            co2_pushes: None,
        },
    )
    .await?;
    Ok(created.log)
}

/// Creates a fresh database holding a single test cylinder (#1, cost 3000).
pub async fn setup_with_cylinder() -> Result<(DatabaseConnection, entities::CylinderModel)> {
    let db = setup_test_db().await?;
    let cylinder = create_test_cylinder(&db, 1, 3000.0).await?;
    Ok((db, cylinder))
}
