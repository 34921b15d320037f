//! Analytics business logic.
//!
//! Aggregates consumption logs over a date window into volume totals, CO2 cost and
//! comparisons against buying bottled sparkling water. Cylinder cost is amortized over
//! a fixed number of pushes per cylinder. Every function takes `today` explicitly so
//! the windows are deterministic under test.

use crate::{
    core::{cylinder::get_active_cylinder, settings::get_initial_cost},
    entities::{ConsumptionLog, Cylinder, consumption_log, cylinder},
    errors::{Error, Result},
};
use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::{debug, instrument};

/// Estimated pushes a full cylinder delivers
pub const PUSHES_PER_CYLINDER: f64 = 500.0;
/// Reference retail price of 500 mL of bottled sparkling water
pub const RETAIL_PRICE_PER_500ML: f64 = 45.0;
/// Length of the dashboard's recent window in days
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Report window length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "180d")]
    Days180,
    #[serde(rename = "365d")]
    Days365,
}

impl Period {
    /// Number of days the window reaches back from today.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Days30 => 30,
            Self::Days90 => 90,
            Self::Days180 => 180,
            Self::Days365 => 365,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Days30 => "30d",
            Self::Days90 => "90d",
            Self::Days180 => "180d",
            Self::Days365 => "365d",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "30d" => Ok(Self::Days30),
            "90d" => Ok(Self::Days90),
            "180d" => Ok(Self::Days180),
            "365d" => Ok(Self::Days365),
            other => Err(Error::invalid_input(format!(
                "Invalid period '{other}', expected one of 30d, 90d, 180d, 365d"
            ))),
        }
    }
}

/// One day of the report's time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyConsumption {
    pub date: NaiveDate,
    pub volume_ml: f64,
    pub co2_cost: f64,
    /// What the same volume would have cost bottled
    pub retail_cost: f64,
    /// Volume up to and including this day
    pub cumulative_volume_ml: f64,
    /// Initial cost plus CO2 cost up to and including this day
    pub total_cost: f64,
}

/// General analytics report for a period ending today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub total_consumption_ml: f64,
    /// Total divided by the number of days that have at least one log
    pub average_daily_consumption_ml: f64,
    pub total_cost: f64,
    pub cost_per_liter: f64,
    pub period_days: i64,
    pub consumption_data: Vec<DailyConsumption>,
}

/// Volume for one day on the dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub volume_ml: f64,
}

/// Figures shown on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub today_consumption_ml: f64,
    /// Month-to-date CO2 cost plus the full initial cost
    pub this_month_cost: f64,
    pub savings_vs_retail: f64,
    pub active_cylinder: Option<cylinder::Model>,
    pub recent_consumption_data: Vec<DailyVolume>,
}

/// Cost of a single push from a cylinder bought at `cylinder_cost`.
#[must_use]
pub fn cost_per_push(cylinder_cost: f64) -> f64 {
    if cylinder_cost > 0.0 {
        cylinder_cost / PUSHES_PER_CYLINDER
    } else {
        0.0
    }
}

/// Retail price of `volume_ml` of bottled water.
#[must_use]
pub fn retail_cost(volume_ml: f64) -> f64 {
    volume_ml * RETAIL_PRICE_PER_500ML / 500.0
}

/// CO2 cost of one log; a log without a cylinder costs nothing.
fn co2_cost(log: &consumption_log::Model, cylinder: Option<&cylinder::Model>) -> f64 {
    let cost = cylinder.map_or(0.0, |c| c.cost);
    f64::from(log.co2_pushes) * cost_per_push(cost)
}

/// Adds up `values` from +0.0; `Iterator::sum` yields -0.0 when there is nothing to add.
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| acc + v)
}

type LogRow = (consumption_log::Model, Option<cylinder::Model>);

/// Logs dated within `[start, end]`, oldest first.
async fn logs_between(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<LogRow>> {
    ConsumptionLog::find()
        .filter(consumption_log::Column::Date.between(start, end))
        .order_by_asc(consumption_log::Column::Date)
        .order_by_asc(consumption_log::Column::Id)
        .find_also_related(Cylinder)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds the per-day series from logs sorted by date.
fn daily_series(rows: &[LogRow], initial_cost: f64) -> Vec<DailyConsumption> {
    let mut days: BTreeMap<NaiveDate, DailyConsumption> = BTreeMap::new();
    let mut cumulative_volume = 0.0;
    let mut cumulative_co2 = 0.0;

    for (log, cylinder) in rows {
        let log_co2 = co2_cost(log, cylinder.as_ref());
        cumulative_volume += log.volume_ml;
        cumulative_co2 += log_co2;

        let day = days.entry(log.date).or_insert_with(|| DailyConsumption {
            date: log.date,
            volume_ml: 0.0,
            co2_cost: 0.0,
            retail_cost: 0.0,
            cumulative_volume_ml: 0.0,
            total_cost: 0.0,
        });
        day.volume_ml += log.volume_ml;
        day.co2_cost += log_co2;
        day.retail_cost += retail_cost(log.volume_ml);
        day.cumulative_volume_ml = cumulative_volume;
        day.total_cost = initial_cost + cumulative_co2;
    }

    days.into_values().collect()
}

/// Generates the analytics report for `period` ending on `today`.
///
/// # Arguments
/// * `db` - Database connection
/// * `period` - How far back the window reaches
/// * `today` - Last day of the window (inclusive)
///
/// # Returns
/// Totals over `[today - period, today]` and a per-day series with running totals.
/// With no logs every figure is zero apart from `total_cost`, which is the initial cost.
#[instrument(skip(db))]
pub async fn generate_report(
    db: &DatabaseConnection,
    period: Period,
    today: NaiveDate,
) -> Result<AnalyticsReport> {
    let start = today - Duration::days(period.days());
    let rows = logs_between(db, start, today).await?;
    let initial_cost = get_initial_cost(db).await?;

    let total_consumption_ml = total(rows.iter().map(|(log, _)| log.volume_ml));
    let total_co2 = total(
        rows.iter()
            .map(|(log, cylinder)| co2_cost(log, cylinder.as_ref())),
    );
    let total_cost = initial_cost + total_co2;

    let consumption_data = daily_series(&rows, initial_cost);
    let data_days = consumption_data.len();

    #[allow(clippy::cast_precision_loss)]
    let average_daily_consumption_ml = if data_days > 0 {
        total_consumption_ml / data_days as f64
    } else {
        0.0
    };
    let cost_per_liter = if total_consumption_ml > 0.0 {
        total_cost / (total_consumption_ml / 1000.0)
    } else {
        0.0
    };

    debug!(
        "Report {period}: {} logs over {data_days} days, {total_consumption_ml} mL",
        rows.len()
    );

    Ok(AnalyticsReport {
        total_consumption_ml,
        average_daily_consumption_ml,
        total_cost,
        cost_per_liter,
        period_days: period.days(),
        consumption_data,
    })
}

/// Builds the dashboard summary as of `today`.
#[instrument(skip(db))]
pub async fn dashboard_summary(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let initial_cost = get_initial_cost(db).await?;

    let month_start = today.with_day(1).unwrap_or(today);
    let month_rows = logs_between(db, month_start, today).await?;

    let today_consumption_ml = total(
        month_rows
            .iter()
            .filter(|(log, _)| log.date == today)
            .map(|(log, _)| log.volume_ml),
    );
    let month_volume = total(month_rows.iter().map(|(log, _)| log.volume_ml));
    let month_co2 = total(
        month_rows
            .iter()
            .map(|(log, cylinder)| co2_cost(log, cylinder.as_ref())),
    );

    let this_month_cost = initial_cost + month_co2;
    let savings_vs_retail = retail_cost(month_volume) - this_month_cost;

    let recent_start = today - Duration::days(RECENT_WINDOW_DAYS);
    let mut recent: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (log, _) in logs_between(db, recent_start, today).await? {
        *recent.entry(log.date).or_insert(0.0) += log.volume_ml;
    }
    let recent_consumption_data = recent
        .into_iter()
        .map(|(date, volume_ml)| DailyVolume { date, volume_ml })
        .collect();

    Ok(DashboardSummary {
        today_consumption_ml,
        this_month_cost,
        savings_vs_retail,
        active_cylinder: get_active_cylinder(db).await?,
        recent_consumption_data,
    })
}
