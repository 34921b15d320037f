//! CSV import and export of consumption logs.
//!
//! Import is row-tolerant: a bad row is reported and skipped, the rest of the file still
//! lands. All accepted rows are written in a single transaction. Cylinders referenced
//! by number are created on the fly (cost 0, inactive) when they do not exist yet.

use crate::{
    core::{
        calculation::{PushRates, compute_with},
        cylinder::find_or_create_cylinder,
        settings::get_push_rates,
    },
    entities::{ConsumptionLog, Cylinder, consumption_log, cylinder},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Columns an import file must have (others are ignored)
pub const REQUIRED_COLUMNS: [&str; 4] = ["date", "bottle_size", "bottle_count", "cylinder_number"];
/// Columns written by [`export_csv`], in order
pub const EXPORT_COLUMNS: [&str; 8] = [
    "date",
    "bottle_size",
    "bottle_count",
    "volume_ml",
    "co2_pushes",
    "cylinder_number",
    "cylinder_cost",
    "created_at",
];
/// Download name for exports
pub const EXPORT_FILENAME: &str = "soda_consumption_export.csv";
/// Download name for the import template
pub const SAMPLE_FILENAME: &str = "sample_import.csv";
/// Row errors returned to the caller are capped at this many
pub const MAX_REPORTED_ERRORS: usize = 10;

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub imported_count: usize,
    /// First few row errors, formatted `Row N: <reason>`
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    date: String,
    bottle_size: String,
    bottle_count: String,
    cylinder_number: String,
}

#[derive(Debug, Serialize)]
struct SampleRow {
    date: &'static str,
    bottle_size: &'static str,
    bottle_count: i32,
    cylinder_number: i32,
}

#[derive(Debug, Serialize)]
struct ExportRow {
    date: String,
    bottle_size: String,
    bottle_count: i32,
    volume_ml: f64,
    co2_pushes: i32,
    cylinder_number: i32,
    cylinder_cost: f64,
    created_at: String,
}

impl ExportRow {
    fn new(log: consumption_log::Model, cylinder: &cylinder::Model) -> Self {
        Self {
            date: log.date.format("%Y-%m-%d").to_string(),
            bottle_size: log.bottle_size,
            bottle_count: log.bottle_count,
            volume_ml: log.volume_ml,
            co2_pushes: log.co2_pushes,
            cylinder_number: cylinder.number,
            cylinder_cost: cylinder.cost,
            created_at: log.created_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

/// Rejects uploads whose filename does not end in `.csv`.
pub fn ensure_csv_upload(filename: Option<&str>) -> Result<()> {
    match filename {
        Some(name) if name.ends_with(".csv") => Ok(()),
        _ => Err(Error::CsvFormat {
            message: "File must be a CSV".to_string(),
        }),
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, or a full timestamp (the time part is dropped).
fn parse_date(raw: &str) -> Result<NaiveDate> {
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(timestamp.date());
        }
    }
    Err(Error::invalid_input(format!("Invalid date '{raw}'")))
}

fn parse_int(field: &str, raw: &str) -> Result<i32> {
    raw.parse()
        .map_err(|_| Error::invalid_input(format!("Invalid {field} '{raw}'")))
}

/// Validates one row and stages its log inside `txn`.
async fn import_row(txn: &DatabaseTransaction, row: ImportRow, rates: PushRates) -> Result<()> {
    let date = parse_date(&row.date)?;
    let bottle_count = parse_int("bottle_count", &row.bottle_count)?;
    if bottle_count < 1 {
        return Err(Error::invalid_input("Bottle count must be a positive integer"));
    }
    let cylinder_number = parse_int("cylinder_number", &row.cylinder_number)?;
    let dispensed = compute_with(&row.bottle_size, bottle_count, rates)?;

    let cylinder = find_or_create_cylinder(txn, cylinder_number).await?;

    consumption_log::ActiveModel {
        date: Set(date),
        bottle_size: Set(row.bottle_size),
        bottle_count: Set(bottle_count),
        volume_ml: Set(dispensed.volume_ml),
        co2_pushes: Set(dispensed.co2_pushes),
        cylinder_id: Set(cylinder.id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn missing_columns(headers: &StringRecord) -> bool {
    REQUIRED_COLUMNS
        .iter()
        .any(|required| !headers.iter().any(|header| header == *required))
}

/// Imports consumption logs from CSV bytes.
///
/// # Errors
/// [`Error::CsvFormat`] if the file is not UTF-8 CSV or lacks a required column.
/// Row-level problems are reported in the summary instead.
#[instrument(skip(db, data), fields(bytes = data.len()))]
pub async fn import_csv(db: &DatabaseConnection, data: &[u8]) -> Result<ImportSummary> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| Error::CsvFormat {
            message: format!("Error processing CSV: {e}"),
        })?
        .clone();
    if missing_columns(&headers) {
        return Err(Error::CsvFormat {
            message: format!("CSV must contain columns: {}", REQUIRED_COLUMNS.join(", ")),
        });
    }

    let txn = db.begin().await?;
    let rates = get_push_rates(&txn).await?;

    let mut imported_count = 0;
    let mut errors = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let outcome = match record {
            Ok(record) => match record.deserialize::<ImportRow>(Some(&headers)) {
                Ok(row) => import_row(&txn, row, rates).await,
                Err(e) => Err(Error::from(e)),
            },
            Err(e) => Err(Error::from(e)),
        };

        match outcome {
            Ok(()) => imported_count += 1,
            Err(e) => {
                warn!("Skipping import row {row_number}: {e}");
                errors.push(format!("Row {row_number}: {e}"));
            }
        }
    }

    txn.commit().await?;
    info!(
        "Imported {imported_count} logs, {} rows rejected",
        errors.len()
    );

    errors.truncate(MAX_REPORTED_ERRORS);
    Ok(ImportSummary {
        message: format!("Successfully imported {imported_count} records"),
        imported_count,
        errors,
    })
}

/// Serializes every log with its cylinder, in storage order.
#[instrument(skip(db))]
pub async fn export_csv(db: &DatabaseConnection) -> Result<Vec<u8>> {
    let rows = ConsumptionLog::find()
        .order_by_asc(consumption_log::Column::Id)
        .find_also_related(Cylinder)
        .all(db)
        .await?;

    // Header is written by hand so an empty export still carries it.
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;

    for (log, cylinder) in rows {
        let Some(cylinder) = cylinder else {
            warn!("Log {} references missing cylinder {}", log.id, log.cylinder_id);
            continue;
        };
        writer.serialize(ExportRow::new(log, &cylinder))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// The downloadable import template.
pub fn sample_csv() -> Result<Vec<u8>> {
    let rows = [
        SampleRow {
            date: "2024-01-01",
            bottle_size: "1L",
            bottle_count: 2,
            cylinder_number: 1,
        },
        SampleRow {
            date: "2024-01-02",
            bottle_size: "0.5L",
            bottle_count: 1,
            cylinder_number: 1,
        },
    ];

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}
