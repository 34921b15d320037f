//! Unified error types for the soda tracker.
//!
//! Every fallible operation in the crate returns [`Result`]. The HTTP layer maps each
//! variant onto a status code in [`crate::api::error`].

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (config file, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer failure outside of per-row import handling
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No cylinder with this id
    #[error("Cylinder not found")]
    CylinderNotFound {
        /// Requested cylinder id
        id: i32,
    },

    /// No consumption log with this id
    #[error("Log not found")]
    LogNotFound {
        /// Requested log id
        id: i32,
    },

    /// No setting stored under this key
    #[error("Setting not found")]
    SettingNotFound {
        /// Requested key
        key: String,
    },

    /// Cylinder numbers are unique
    #[error("Cylinder number already exists")]
    DuplicateCylinder {
        /// The conflicting number
        number: i32,
    },

    /// Setting keys are unique
    #[error("Setting already exists")]
    DuplicateSetting {
        /// The conflicting key
        key: String,
    },

    /// A cylinder that still has logs cannot be removed
    #[error("Cannot delete cylinder with associated consumption logs")]
    CylinderInUse {
        /// Cylinder id
        id: i32,
        /// Number of logs referencing it
        log_count: u64,
    },

    /// Bottle size other than `"1L"` or `"0.5L"`
    #[error("Invalid bottle size: {size}")]
    InvalidBottleSize {
        /// The rejected size string
        size: String,
    },

    /// Any other rejected input value
    #[error("{message}")]
    InvalidInput {
        /// Human-readable reason
        message: String,
    },

    /// Uploaded CSV is unusable as a whole (wrong file type, missing columns)
    #[error("{message}")]
    CsvFormat {
        /// Human-readable reason
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
