//! Cylinder business logic - registration, updates, guarded deletion and the
//! active-cylinder switch.
//!
//! The "at most one active cylinder" invariant is maintained here: both
//! [`change_active_cylinder`] and an update that sets `is_active` clear every other
//! flag inside the same database transaction.

use crate::{
    entities::{ConsumptionLog, Cylinder, consumption_log, cylinder},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Input for registering a cylinder.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCylinder {
    /// User-facing number, must be unique
    pub number: i32,
    /// Purchase cost
    #[serde(default)]
    pub cost: f64,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CylinderUpdate {
    /// New purchase cost
    pub cost: Option<f64>,
    /// New active flag
    pub is_active: Option<bool>,
}

/// First and last day a cylinder was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CylinderDateRange {
    /// Earliest log date, None without logs
    pub start_date: Option<NaiveDate>,
    /// Latest log date, None without logs
    pub end_date: Option<NaiveDate>,
}

fn validate_cost(cost: f64) -> Result<()> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(Error::invalid_input("Cylinder cost must be a non-negative number"));
    }
    Ok(())
}

/// Retrieves all cylinders ordered by number.
pub async fn get_all_cylinders(db: &DatabaseConnection) -> Result<Vec<cylinder::Model>> {
    Cylinder::find()
        .order_by_asc(cylinder::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a cylinder by id.
///
/// # Errors
/// [`Error::CylinderNotFound`] if no such cylinder exists.
pub async fn get_cylinder_by_id<C>(db: &C, cylinder_id: i32) -> Result<cylinder::Model>
where
    C: ConnectionTrait,
{
    Cylinder::find_by_id(cylinder_id)
        .one(db)
        .await?
        .ok_or(Error::CylinderNotFound { id: cylinder_id })
}

/// Finds a cylinder by its user-facing number.
pub async fn find_cylinder_by_number<C>(db: &C, number: i32) -> Result<Option<cylinder::Model>>
where
    C: ConnectionTrait,
{
    Cylinder::find()
        .filter(cylinder::Column::Number.eq(number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the active cylinder, if any.
pub async fn get_active_cylinder<C>(db: &C) -> Result<Option<cylinder::Model>>
where
    C: ConnectionTrait,
{
    Cylinder::find()
        .filter(cylinder::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a cylinder without checking the number first. Callers do the check.
async fn insert_cylinder<C>(db: &C, number: i32, cost: f64) -> Result<cylinder::Model>
where
    C: ConnectionTrait,
{
    let model = cylinder::ActiveModel {
        number: Set(number),
        cost: Set(cost),
        is_active: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Registers a new, inactive cylinder.
///
/// # Errors
/// [`Error::DuplicateCylinder`] if the number is taken, [`Error::InvalidInput`] for a
/// negative or non-finite cost.
#[instrument(skip(db))]
pub async fn create_cylinder(db: &DatabaseConnection, new: NewCylinder) -> Result<cylinder::Model> {
    validate_cost(new.cost)?;

    if find_cylinder_by_number(db, new.number).await?.is_some() {
        return Err(Error::DuplicateCylinder { number: new.number });
    }

    let created = insert_cylinder(db, new.number, new.cost).await?;
    info!("Registered cylinder #{}", created.number);
    Ok(created)
}

/// Returns the cylinder with `number`, creating it with cost 0 if it does not exist.
pub async fn find_or_create_cylinder<C>(db: &C, number: i32) -> Result<cylinder::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cylinder_by_number(db, number).await? {
        return Ok(existing);
    }
    info!("Auto-creating cylinder #{number}");
    insert_cylinder(db, number, 0.0).await
}

/// Clears `is_active` on every cylinder except `keep_id`.
async fn deactivate_others<C>(db: &C, keep_id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    Cylinder::update_many()
        .col_expr(cylinder::Column::IsActive, Expr::value(false))
        .filter(cylinder::Column::Id.ne(keep_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Applies a partial update to a cylinder.
///
/// Setting `is_active` to true deactivates every other cylinder in the same
/// transaction.
#[instrument(skip(db))]
pub async fn update_cylinder(
    db: &DatabaseConnection,
    cylinder_id: i32,
    changes: CylinderUpdate,
) -> Result<cylinder::Model> {
    if let Some(cost) = changes.cost {
        validate_cost(cost)?;
    }

    let txn = db.begin().await?;
    let existing = get_cylinder_by_id(&txn, cylinder_id).await?;

    if changes.is_active == Some(true) {
        deactivate_others(&txn, cylinder_id).await?;
    }

    let mut active_model: cylinder::ActiveModel = existing.clone().into();
    if let Some(cost) = changes.cost {
        active_model.cost = Set(cost);
    }
    if let Some(is_active) = changes.is_active {
        active_model.is_active = Set(is_active);
    }

    let updated = if active_model.is_changed() {
        active_model.update(&txn).await?
    } else {
        existing
    };

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a cylinder that no log refers to.
///
/// # Errors
/// [`Error::CylinderNotFound`] if absent, [`Error::CylinderInUse`] if any log
/// references it.
#[instrument(skip(db))]
pub async fn delete_cylinder(db: &DatabaseConnection, cylinder_id: i32) -> Result<()> {
    let existing = get_cylinder_by_id(db, cylinder_id).await?;

    let log_count = ConsumptionLog::find()
        .filter(consumption_log::Column::CylinderId.eq(cylinder_id))
        .count(db)
        .await?;
    if log_count > 0 {
        return Err(Error::CylinderInUse {
            id: cylinder_id,
            log_count,
        });
    }

    existing.delete(db).await?;
    info!("Deleted cylinder {cylinder_id}");
    Ok(())
}

/// Makes `cylinder_id` the only active cylinder.
///
/// The existence check, the clearing of every flag and the activation run in a
/// single transaction, so a missing target leaves all flags untouched.
#[instrument(skip(db))]
pub async fn change_active_cylinder(
    db: &DatabaseConnection,
    cylinder_id: i32,
) -> Result<cylinder::Model> {
    let txn = db.begin().await?;

    let target = get_cylinder_by_id(&txn, cylinder_id).await?;

    Cylinder::update_many()
        .col_expr(cylinder::Column::IsActive, Expr::value(false))
        .exec(&txn)
        .await?;

    let mut active_model: cylinder::ActiveModel = target.into();
    active_model.is_active = Set(true);
    let activated = active_model.update(&txn).await?;

    txn.commit().await?;
    info!("Cylinder #{} is now active", activated.number);
    Ok(activated)
}

async fn logs_for_cylinder(
    db: &DatabaseConnection,
    cylinder_id: i32,
) -> Result<Vec<consumption_log::Model>> {
    get_cylinder_by_id(db, cylinder_id).await?;
    ConsumptionLog::find()
        .filter(consumption_log::Column::CylinderId.eq(cylinder_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Earliest and latest log dates for a cylinder.
pub async fn get_cylinder_date_range(
    db: &DatabaseConnection,
    cylinder_id: i32,
) -> Result<CylinderDateRange> {
    let logs = logs_for_cylinder(db, cylinder_id).await?;
    Ok(CylinderDateRange {
        start_date: logs.iter().map(|log| log.date).min(),
        end_date: logs.iter().map(|log| log.date).max(),
    })
}

/// Sum of pushes drawn from a cylinder.
pub async fn get_cylinder_total_pushes(db: &DatabaseConnection, cylinder_id: i32) -> Result<i64> {
    let logs = logs_for_cylinder(db, cylinder_id).await?;
    Ok(logs.iter().map(|log| i64::from(log.co2_pushes)).sum())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_cylinder_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_cylinder(
            &db,
            NewCylinder {
                number: 1,
                cost: -5.0,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_cylinder(
            &db,
            NewCylinder {
                number: 1,
                cost: f64::INFINITY,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert!(get_all_cylinders(&db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_cylinder_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_test_cylinder(&db, 7, 3000.0).await?;

        assert_eq!(created.number, 7);
        assert_eq!(created.cost, 3000.0);
        assert!(!created.is_active);
        assert_eq!(get_cylinder_by_id(&db, created.id).await?, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_cylinder(&db, 1, 3000.0).await?;

        let result = create_cylinder(
            &db,
            NewCylinder {
                number: 1,
                cost: 10.0,
            },
        )
        .await;

        assert!(matches!(result, Err(Error::DuplicateCylinder { number: 1 })));
        assert_eq!(get_all_cylinders(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_number() -> Result<()> {
        let db = setup_test_db().await?;
        for number in [3, 1, 2] {
            create_test_cylinder(&db, number, 0.0).await?;
        }

        let numbers: Vec<i32> = get_all_cylinders(&db)
            .await?
            .into_iter()
            .map(|c| c.number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_cylinder() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_cylinder_by_id(&db, 42).await;
        assert!(matches!(result, Err(Error::CylinderNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_active_leaves_exactly_one() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_cylinder(&db, 1, 0.0).await?;
        let b = create_test_cylinder(&db, 2, 0.0).await?;
        let c = create_test_cylinder(&db, 3, 0.0).await?;

        for target in [&a, &c, &b, &b] {
            change_active_cylinder(&db, target.id).await?;

            let active: Vec<i32> = get_all_cylinders(&db)
                .await?
                .into_iter()
                .filter(|cyl| cyl.is_active)
                .map(|cyl| cyl.id)
                .collect();
            assert_eq!(active, vec![target.id]);
        }

        assert_eq!(get_active_cylinder(&db).await?.unwrap().id, b.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_change_active_to_missing_keeps_current() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_cylinder(&db, 1, 0.0).await?;
        change_active_cylinder(&db, a.id).await?;

        let result = change_active_cylinder(&db, 999).await;

        assert!(matches!(result, Err(Error::CylinderNotFound { id: 999 })));
        assert_eq!(get_active_cylinder(&db).await?.unwrap().id, a.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_cylinder_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let cyl = create_test_cylinder(&db, 1, 100.0).await?;

        let updated = update_cylinder(
            &db,
            cyl.id,
            CylinderUpdate {
                cost: Some(2500.0),
                is_active: None,
            },
        )
        .await?;

        assert_eq!(updated.cost, 2500.0);
        assert_eq!(updated.number, 1);
        assert!(!updated.is_active);

        // Empty update is a no-op
        let same = update_cylinder(&db, cyl.id, CylinderUpdate::default()).await?;
        assert_eq!(same, updated);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_is_active_keeps_invariant() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_cylinder(&db, 1, 0.0).await?;
        let b = create_test_cylinder(&db, 2, 0.0).await?;
        change_active_cylinder(&db, a.id).await?;

        update_cylinder(
            &db,
            b.id,
            CylinderUpdate {
                cost: None,
                is_active: Some(true),
            },
        )
        .await?;

        assert!(!get_cylinder_by_id(&db, a.id).await?.is_active);
        assert!(get_cylinder_by_id(&db, b.id).await?.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_guard() -> Result<()> {
        let db = setup_test_db().await?;
        let used = create_test_cylinder(&db, 1, 0.0).await?;
        let unused = create_test_cylinder(&db, 2, 0.0).await?;
        create_test_log(&db, used.id, ymd(2024, 1, 1), "1L", 1).await?;

        let result = delete_cylinder(&db, used.id).await;
        assert!(matches!(
            result,
            Err(Error::CylinderInUse { log_count: 1, .. })
        ));
        assert!(get_cylinder_by_id(&db, used.id).await.is_ok());

        delete_cylinder(&db, unused.id).await?;
        assert!(matches!(
            get_cylinder_by_id(&db, unused.id).await,
            Err(Error::CylinderNotFound { .. })
        ));

        let missing = delete_cylinder(&db, 999).await;
        assert!(matches!(missing, Err(Error::CylinderNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_or_create_cylinder() -> Result<()> {
        let db = setup_test_db().await?;
        let existing = create_test_cylinder(&db, 5, 3000.0).await?;

        let found = find_or_create_cylinder(&db, 5).await?;
        assert_eq!(found.id, existing.id);

        let created = find_or_create_cylinder(&db, 6).await?;
        assert_eq!(created.number, 6);
        assert_eq!(created.cost, 0.0);
        assert!(!created.is_active);
        assert_eq!(get_all_cylinders(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_date_range_and_total_pushes() -> Result<()> {
        let db = setup_test_db().await?;
        let cyl = create_test_cylinder(&db, 1, 0.0).await?;

        let empty = get_cylinder_date_range(&db, cyl.id).await?;
        assert_eq!(empty.start_date, None);
        assert_eq!(empty.end_date, None);
        assert_eq!(get_cylinder_total_pushes(&db, cyl.id).await?, 0);

        create_test_log(&db, cyl.id, ymd(2024, 3, 10), "1L", 2).await?;
        create_test_log(&db, cyl.id, ymd(2024, 1, 5), "0.5L", 3).await?;
        create_test_log(&db, cyl.id, ymd(2024, 2, 1), "1L", 1).await?;

        let range = get_cylinder_date_range(&db, cyl.id).await?;
        assert_eq!(range.start_date, Some(ymd(2024, 1, 5)));
        assert_eq!(range.end_date, Some(ymd(2024, 3, 10)));
        assert_eq!(get_cylinder_total_pushes(&db, cyl.id).await?, 8 + 6 + 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_date_range_and_total_pushes_unknown_cylinder() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            get_cylinder_date_range(&db, 42).await,
            Err(Error::CylinderNotFound { id: 42 })
        ));
        assert!(matches!(
            get_cylinder_total_pushes(&db, 42).await,
            Err(Error::CylinderNotFound { id: 42 })
        ));
        Ok(())
    }
}
