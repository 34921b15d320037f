//! Consumption log business logic.
//!
//! Every write derives `volume_ml` and `co2_pushes` from the bottle size and count,
//! using the pushes-per-bottle settings. A caller may pin `co2_pushes` explicitly;
//! an explicit value always wins over the derived one.

use crate::{
    core::{
        calculation::{Dispensed, compute_with},
        cylinder::get_cylinder_by_id,
        settings::get_push_rates,
    },
    entities::{ConsumptionLog, Cylinder, consumption_log, cylinder},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default page size for [`list_logs`]
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// A log together with the cylinder it draws from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogWithCylinder {
    /// The log row
    #[serde(flatten)]
    pub log: consumption_log::Model,
    /// Owning cylinder
    pub cylinder: cylinder::Model,
}

/// Input for recording bottles.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLog {
    /// Day the bottles were filled
    pub date: NaiveDate,
    /// `"1L"` or `"0.5L"`
    pub bottle_size: String,
    /// Number of bottles, at least 1
    pub bottle_count: i32,
    /// Cylinder the pushes were drawn from
    pub cylinder_id: i32,
    /// Explicit push count instead of the derived one
    #[serde(default)]
    pub co2_pushes: Option<i32>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogUpdate {
    /// New day
    pub date: Option<NaiveDate>,
    /// New bottle size
    pub bottle_size: Option<String>,
    /// New bottle count
    pub bottle_count: Option<i32>,
    /// Move the log to another cylinder
    pub cylinder_id: Option<i32>,
    /// Explicit push count
    pub co2_pushes: Option<i32>,
}

fn validate_count(bottle_count: i32) -> Result<()> {
    if bottle_count < 1 {
        return Err(Error::invalid_input("Bottle count must be a positive integer"));
    }
    Ok(())
}

fn validate_pushes(co2_pushes: Option<i32>) -> Result<()> {
    match co2_pushes {
        Some(pushes) if pushes < 0 => Err(Error::invalid_input("CO2 pushes cannot be negative")),
        _ => Ok(()),
    }
}

/// Derives volume and pushes with the configured push rates.
pub async fn dispense<C>(db: &C, bottle_size: &str, bottle_count: i32) -> Result<Dispensed>
where
    C: ConnectionTrait,
{
    let rates = get_push_rates(db).await?;
    compute_with(bottle_size, bottle_count, rates)
}

fn attach_cylinder(
    (log, cylinder): (consumption_log::Model, Option<cylinder::Model>),
) -> Result<LogWithCylinder> {
    let cylinder = cylinder.ok_or(Error::CylinderNotFound {
        id: log.cylinder_id,
    })?;
    Ok(LogWithCylinder { log, cylinder })
}

/// Lists logs in insertion order, `limit` rows after skipping `skip`.
pub async fn list_logs(
    db: &DatabaseConnection,
    skip: u64,
    limit: u64,
) -> Result<Vec<LogWithCylinder>> {
    ConsumptionLog::find()
        .order_by_asc(consumption_log::Column::Id)
        .find_also_related(Cylinder)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(attach_cylinder)
        .collect()
}

/// Retrieves one log with its cylinder.
///
/// # Errors
/// [`Error::LogNotFound`] if absent.
pub async fn get_log(db: &DatabaseConnection, log_id: i32) -> Result<LogWithCylinder> {
    ConsumptionLog::find_by_id(log_id)
        .find_also_related(Cylinder)
        .one(db)
        .await?
        .ok_or(Error::LogNotFound { id: log_id })
        .and_then(attach_cylinder)
}

/// Records bottles filled on a day.
///
/// # Errors
/// [`Error::InvalidBottleSize`] / [`Error::InvalidInput`] for bad input,
/// [`Error::CylinderNotFound`] if the cylinder does not exist.
#[instrument(skip(db))]
pub async fn create_log(db: &DatabaseConnection, new: NewLog) -> Result<LogWithCylinder> {
    validate_count(new.bottle_count)?;
    validate_pushes(new.co2_pushes)?;
    let dispensed = dispense(db, &new.bottle_size, new.bottle_count).await?;
    let cylinder = get_cylinder_by_id(db, new.cylinder_id).await?;

    let log = consumption_log::ActiveModel {
        date: Set(new.date),
        bottle_size: Set(new.bottle_size),
        bottle_count: Set(new.bottle_count),
        volume_ml: Set(dispensed.volume_ml),
        co2_pushes: Set(new.co2_pushes.unwrap_or(dispensed.co2_pushes)),
        cylinder_id: Set(cylinder.id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!("Created log {} ({} mL)", log.id, log.volume_ml);
    Ok(LogWithCylinder { log, cylinder })
}

/// Applies a partial update to a log.
///
/// Volume and pushes are recomputed when size or count is supplied; pushes supplied
/// in the same update take precedence over the recomputed value.
#[instrument(skip(db))]
pub async fn update_log(
    db: &DatabaseConnection,
    log_id: i32,
    changes: LogUpdate,
) -> Result<LogWithCylinder> {
    validate_pushes(changes.co2_pushes)?;
    if let Some(count) = changes.bottle_count {
        validate_count(count)?;
    }

    let existing = ConsumptionLog::find_by_id(log_id)
        .one(db)
        .await?
        .ok_or(Error::LogNotFound { id: log_id })?;

    let mut active_model: consumption_log::ActiveModel = existing.clone().into();

    if changes.bottle_size.is_some() || changes.bottle_count.is_some() {
        let bottle_size = changes
            .bottle_size
            .clone()
            .unwrap_or_else(|| existing.bottle_size.clone());
        let bottle_count = changes.bottle_count.unwrap_or(existing.bottle_count);
        let dispensed = dispense(db, &bottle_size, bottle_count).await?;

        active_model.bottle_size = Set(bottle_size);
        active_model.bottle_count = Set(bottle_count);
        active_model.volume_ml = Set(dispensed.volume_ml);
        active_model.co2_pushes = Set(dispensed.co2_pushes);
    }

    if let Some(pushes) = changes.co2_pushes {
        active_model.co2_pushes = Set(pushes);
    }
    if let Some(date) = changes.date {
        active_model.date = Set(date);
    }

    let cylinder_id = changes.cylinder_id.unwrap_or(existing.cylinder_id);
    let cylinder = get_cylinder_by_id(db, cylinder_id).await?;
    if changes.cylinder_id.is_some() {
        active_model.cylinder_id = Set(cylinder_id);
    }

    let log = if active_model.is_changed() {
        active_model.update(db).await?
    } else {
        existing
    };

    Ok(LogWithCylinder { log, cylinder })
}

/// Deletes a log.
///
/// # Errors
/// [`Error::LogNotFound`] if absent.
#[instrument(skip(db))]
pub async fn delete_log(db: &DatabaseConnection, log_id: i32) -> Result<()> {
    let existing = ConsumptionLog::find_by_id(log_id)
        .one(db)
        .await?
        .ok_or(Error::LogNotFound { id: log_id })?;
    existing.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::settings::set_default_pushes_1l;
    use crate::test_utils::*;

    fn new_log(cylinder_id: i32, size: &str, count: i32) -> NewLog {
        NewLog {
            date: ymd(2024, 1, 1),
            bottle_size: size.to_string(),
            bottle_count: count,
            cylinder_id,
            co2_pushes: None,
        }
    }

    #[tokio::test]
    async fn test_create_log_derives_volume_and_pushes() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;

        let created = create_log(&db, new_log(cylinder.id, "1L", 2)).await?;

        assert_eq!(created.log.volume_ml, 1680.0);
        assert_eq!(created.log.co2_pushes, 8);
        assert_eq!(created.log.date, ymd(2024, 1, 1));
        assert_eq!(created.cylinder, cylinder);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_log_explicit_pushes() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;

        let mut input = new_log(cylinder.id, "0.5L", 2);
        input.co2_pushes = Some(7);
        let created = create_log(&db, input).await?;

        assert_eq!(created.log.volume_ml, 910.0);
        assert_eq!(created.log.co2_pushes, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_log_uses_push_settings() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        set_default_pushes_1l(&db, 6).await?;

        let created = create_log(&db, new_log(cylinder.id, "1L", 2)).await?;
        assert_eq!(created.log.co2_pushes, 12);
        assert_eq!(created.log.volume_ml, 1680.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_log_rejects_bad_input() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;

        let bad_size = create_log(&db, new_log(cylinder.id, "2L", 1)).await;
        assert!(matches!(bad_size, Err(Error::InvalidBottleSize { .. })));

        let bad_count = create_log(&db, new_log(cylinder.id, "1L", 0)).await;
        assert!(matches!(bad_count, Err(Error::InvalidInput { .. })));

        let missing_cylinder = create_log(&db, new_log(999, "1L", 1)).await;
        assert!(matches!(
            missing_cylinder,
            Err(Error::CylinderNotFound { id: 999 })
        ));

        assert!(list_logs(&db, 0, DEFAULT_PAGE_LIMIT).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_bottle_count_rejected() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;

        let created = create_log(&db, new_log(cylinder.id, "1L", i32::MAX)).await;
        assert!(matches!(created, Err(Error::InvalidInput { .. })));
        assert!(list_logs(&db, 0, DEFAULT_PAGE_LIMIT).await?.is_empty());

        let existing = create_log(&db, new_log(cylinder.id, "1L", 1)).await?;
        let updated = update_log(
            &db,
            existing.log.id,
            LogUpdate {
                bottle_count: Some(i32::MAX),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(updated, Err(Error::InvalidInput { .. })));
        assert_eq!(get_log(&db, existing.log.id).await?.log.co2_pushes, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_logs_paginates() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        for count in 1..=5 {
            create_log(&db, new_log(cylinder.id, "1L", count)).await?;
        }

        let all = list_logs(&db, 0, DEFAULT_PAGE_LIMIT).await?;
        assert_eq!(all.len(), 5);

        let page: Vec<i32> = list_logs(&db, 1, 2)
            .await?
            .into_iter()
            .map(|entry| entry.log.bottle_count)
            .collect();
        assert_eq!(page, vec![2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_recomputes_on_count_change() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let created = create_log(&db, new_log(cylinder.id, "1L", 1)).await?;

        let updated = update_log(
            &db,
            created.log.id,
            LogUpdate {
                bottle_count: Some(3),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.log.bottle_size, "1L");
        assert_eq!(updated.log.volume_ml, 2520.0);
        assert_eq!(updated.log.co2_pushes, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_recomputes_on_size_change() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let created = create_log(&db, new_log(cylinder.id, "1L", 2)).await?;

        let updated = update_log(
            &db,
            created.log.id,
            LogUpdate {
                bottle_size: Some("0.5L".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.log.volume_ml, 910.0);
        assert_eq!(updated.log.co2_pushes, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_explicit_pushes_win() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let created = create_log(&db, new_log(cylinder.id, "1L", 2)).await?;

        let updated = update_log(
            &db,
            created.log.id,
            LogUpdate {
                bottle_count: Some(3),
                co2_pushes: Some(5),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.log.volume_ml, 2520.0);
        assert_eq!(updated.log.co2_pushes, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_date_only_keeps_derived_values() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let mut input = new_log(cylinder.id, "1L", 2);
        input.co2_pushes = Some(9);
        let created = create_log(&db, input).await?;

        let updated = update_log(
            &db,
            created.log.id,
            LogUpdate {
                date: Some(ymd(2024, 2, 2)),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.log.date, ymd(2024, 2, 2));
        assert_eq!(updated.log.co2_pushes, 9);
        assert_eq!(updated.log.volume_ml, 1680.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_moves_cylinder() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let other = create_test_cylinder(&db, 2, 1000.0).await?;
        let created = create_log(&db, new_log(cylinder.id, "1L", 1)).await?;

        let moved = update_log(
            &db,
            created.log.id,
            LogUpdate {
                cylinder_id: Some(other.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(moved.log.cylinder_id, other.id);
        assert_eq!(moved.cylinder, other);

        let dangling = update_log(
            &db,
            created.log.id,
            LogUpdate {
                cylinder_id: Some(999),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(dangling, Err(Error::CylinderNotFound { id: 999 })));
        assert_eq!(get_log(&db, created.log.id).await?.log.cylinder_id, other.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_log() -> Result<()> {
        let db = setup_test_db().await?;

        let updated = update_log(&db, 5, LogUpdate::default()).await;
        assert!(matches!(updated, Err(Error::LogNotFound { id: 5 })));

        let deleted = delete_log(&db, 5).await;
        assert!(matches!(deleted, Err(Error::LogNotFound { id: 5 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_log() -> Result<()> {
        let (db, cylinder) = setup_with_cylinder().await?;
        let created = create_log(&db, new_log(cylinder.id, "1L", 1)).await?;

        delete_log(&db, created.log.id).await?;

        assert!(matches!(
            get_log(&db, created.log.id).await,
            Err(Error::LogNotFound { .. })
        ));
        Ok(())
    }
}
