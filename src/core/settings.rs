//! Settings business logic - key/value store plus typed accessors.
//!
//! Generic operations work on raw strings. The typed accessors (`retail price`,
//! `initial cost`, pushes per bottle) fall back to a built-in default when the key is
//! absent, and upsert on write.

use crate::{
    core::calculation::{DEFAULT_PUSHES_05L, DEFAULT_PUSHES_1L, PushRates},
    entities::{Setting, setting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Upfront equipment cost added to every cost figure
pub const INITIAL_COST_KEY: &str = "initial_cost";
/// Reference price of 500 mL of bought sparkling water
pub const RETAIL_PRICE_KEY: &str = "retail_price_per_500ml";
/// Pushes used for a 1 L bottle
pub const DEFAULT_PUSHES_1L_KEY: &str = "default_pushes_1l";
/// Pushes used for a 0.5 L bottle
pub const DEFAULT_PUSHES_05L_KEY: &str = "default_pushes_05l";

/// Retail price used when none is stored
pub const DEFAULT_RETAIL_PRICE: f64 = 45.0;
/// Initial cost used when none is stored
pub const DEFAULT_INITIAL_COST: f64 = 0.0;

/// Returns every stored setting.
pub async fn get_all_settings(db: &DatabaseConnection) -> Result<Vec<setting::Model>> {
    Setting::find().all(db).await.map_err(Into::into)
}

/// Finds a setting by key, returning None if absent.
pub async fn find_setting<C>(db: &C, key: &str) -> Result<Option<setting::Model>>
where
    C: ConnectionTrait,
{
    Setting::find()
        .filter(setting::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the setting stored under `key`.
///
/// # Errors
/// [`Error::SettingNotFound`] when the key is absent.
pub async fn get_setting(db: &DatabaseConnection, key: &str) -> Result<setting::Model> {
    find_setting(db, key)
        .await?
        .ok_or_else(|| Error::SettingNotFound {
            key: key.to_string(),
        })
}

/// Creates a new setting.
///
/// # Errors
/// [`Error::DuplicateSetting`] when the key already exists.
#[instrument(skip(db))]
pub async fn create_setting(
    db: &DatabaseConnection,
    key: String,
    value: String,
) -> Result<setting::Model> {
    if key.trim().is_empty() {
        return Err(Error::invalid_input("Setting key cannot be empty"));
    }
    if find_setting(db, &key).await?.is_some() {
        return Err(Error::DuplicateSetting { key });
    }

    let model = setting::ActiveModel {
        key: Set(key),
        value: Set(value),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Writes `value` under `key`, creating the row if it does not exist.
#[instrument(skip(db))]
pub async fn upsert_setting<C>(db: &C, key: &str, value: String) -> Result<setting::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    if let Some(existing) = find_setting(db, key).await? {
        let mut active_model: setting::ActiveModel = existing.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await.map_err(Into::into)
    } else {
        debug!("Creating setting {key} on first write");
        let new_setting = setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_setting.insert(db).await.map_err(Into::into)
    }
}

/// Deletes the setting stored under `key`.
///
/// # Errors
/// [`Error::SettingNotFound`] when the key is absent.
#[instrument(skip(db))]
pub async fn delete_setting(db: &DatabaseConnection, key: &str) -> Result<()> {
    let existing = get_setting(db, key).await?;
    existing.delete(db).await?;
    Ok(())
}

/// Parses the stored value of `key`, or returns `default` if absent.
///
/// A value that does not parse is logged and treated as absent.
async fn get_parsed_or_default<C, T>(db: &C, key: &str, default: T) -> Result<T>
where
    C: ConnectionTrait,
    T: FromStr,
{
    let Some(stored) = find_setting(db, key).await? else {
        return Ok(default);
    };
    match stored.value.trim().parse() {
        Ok(value) => Ok(value),
        Err(_) => {
            warn!(
                "Setting {key} holds unparseable value {:?}, using default",
                stored.value
            );
            Ok(default)
        }
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid_input(format!(
            "{name} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Retail price per 500 mL, default 45.
pub async fn get_retail_price<C: ConnectionTrait>(db: &C) -> Result<f64> {
    get_parsed_or_default(db, RETAIL_PRICE_KEY, DEFAULT_RETAIL_PRICE).await
}

/// Stores the retail price per 500 mL.
pub async fn set_retail_price<C: ConnectionTrait>(db: &C, price: f64) -> Result<f64> {
    ensure_non_negative("Retail price", price)?;
    upsert_setting(db, RETAIL_PRICE_KEY, price.to_string()).await?;
    Ok(price)
}

/// Initial equipment cost, default 0.
pub async fn get_initial_cost<C: ConnectionTrait>(db: &C) -> Result<f64> {
    get_parsed_or_default(db, INITIAL_COST_KEY, DEFAULT_INITIAL_COST).await
}

/// Stores the initial equipment cost.
pub async fn set_initial_cost<C: ConnectionTrait>(db: &C, cost: f64) -> Result<f64> {
    ensure_non_negative("Initial cost", cost)?;
    upsert_setting(db, INITIAL_COST_KEY, cost.to_string()).await?;
    Ok(cost)
}

/// Pushes per 1 L bottle, default 4.
pub async fn get_default_pushes_1l<C: ConnectionTrait>(db: &C) -> Result<i32> {
    get_parsed_or_default(db, DEFAULT_PUSHES_1L_KEY, DEFAULT_PUSHES_1L).await
}

/// Stores the pushes per 1 L bottle.
pub async fn set_default_pushes_1l<C: ConnectionTrait>(db: &C, pushes: i32) -> Result<i32> {
    if pushes < 0 {
        return Err(Error::invalid_input("Pushes cannot be negative"));
    }
    upsert_setting(db, DEFAULT_PUSHES_1L_KEY, pushes.to_string()).await?;
    Ok(pushes)
}

/// Pushes per 0.5 L bottle, default 2.
pub async fn get_default_pushes_05l<C: ConnectionTrait>(db: &C) -> Result<i32> {
    get_parsed_or_default(db, DEFAULT_PUSHES_05L_KEY, DEFAULT_PUSHES_05L).await
}

/// Stores the pushes per 0.5 L bottle.
pub async fn set_default_pushes_05l<C: ConnectionTrait>(db: &C, pushes: i32) -> Result<i32> {
    if pushes < 0 {
        return Err(Error::invalid_input("Pushes cannot be negative"));
    }
    upsert_setting(db, DEFAULT_PUSHES_05L_KEY, pushes.to_string()).await?;
    Ok(pushes)
}

/// Drops a negative stored rate, which only the generic key/value endpoint can write.
fn non_negative_rate(key: &str, pushes: i32, default: i32) -> i32 {
    if pushes < 0 {
        warn!("Setting {key} holds negative push rate {pushes}, using default");
        default
    } else {
        pushes
    }
}

/// Push rates currently configured, used when logs are written.
pub async fn get_push_rates<C: ConnectionTrait>(db: &C) -> Result<PushRates> {
    Ok(PushRates {
        one_liter: non_negative_rate(
            DEFAULT_PUSHES_1L_KEY,
            get_default_pushes_1l(db).await?,
            DEFAULT_PUSHES_1L,
        ),
        half_liter: non_negative_rate(
            DEFAULT_PUSHES_05L_KEY,
            get_default_pushes_05l(db).await?,
            DEFAULT_PUSHES_05L,
        ),
    })
}
