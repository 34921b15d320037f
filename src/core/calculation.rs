//! Volume and CO2 push calculation.
//!
//! Maps a bottle size and bottle count onto the dispensed volume and the number of
//! carbonation pushes used. Everything here is pure.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Water actually dispensed into a 1 L bottle (fill line, not nominal volume)
pub const VOLUME_1L_ML: f64 = 840.0;
/// Water actually dispensed into a 0.5 L bottle
pub const VOLUME_05L_ML: f64 = 455.0;
/// Pushes per 1 L bottle when no setting overrides it
pub const DEFAULT_PUSHES_1L: i32 = 4;
/// Pushes per 0.5 L bottle when no setting overrides it
pub const DEFAULT_PUSHES_05L: i32 = 2;

/// Supported bottle sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BottleSize {
    /// `"1L"`
    #[serde(rename = "1L")]
    OneLiter,
    /// `"0.5L"`
    #[serde(rename = "0.5L")]
    HalfLiter,
}

impl BottleSize {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneLiter => "1L",
            Self::HalfLiter => "0.5L",
        }
    }

    /// Dispensed volume per bottle in mL.
    #[must_use]
    pub const fn volume_ml(self) -> f64 {
        match self {
            Self::OneLiter => VOLUME_1L_ML,
            Self::HalfLiter => VOLUME_05L_ML,
        }
    }
}

impl fmt::Display for BottleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BottleSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1L" => Ok(Self::OneLiter),
            "0.5L" => Ok(Self::HalfLiter),
            other => Err(Error::InvalidBottleSize {
                size: other.to_string(),
            }),
        }
    }
}

/// Pushes used per bottle, by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRates {
    /// Pushes per 1 L bottle
    pub one_liter: i32,
    /// Pushes per 0.5 L bottle
    pub half_liter: i32,
}

impl Default for PushRates {
    fn default() -> Self {
        Self {
            one_liter: DEFAULT_PUSHES_1L,
            half_liter: DEFAULT_PUSHES_05L,
        }
    }
}

impl PushRates {
    /// Pushes for a single bottle of `size`.
    #[must_use]
    pub const fn per_bottle(self, size: BottleSize) -> i32 {
        match size {
            BottleSize::OneLiter => self.one_liter,
            BottleSize::HalfLiter => self.half_liter,
        }
    }
}

/// Result of a calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispensed {
    /// Total volume in mL
    pub volume_ml: f64,
    /// Total carbonation pushes
    pub co2_pushes: i32,
}

/// Computes volume and pushes with the fixed 4/2 push table.
///
/// # Errors
/// [`Error::InvalidBottleSize`] for anything other than `"1L"` or `"0.5L"`.
pub fn compute(bottle_size: &str, bottle_count: i32) -> Result<Dispensed> {
    compute_with(bottle_size, bottle_count, PushRates::default())
}

/// Computes volume and pushes using caller-supplied push rates.
///
/// # Errors
/// [`Error::InvalidBottleSize`] for an unknown size, [`Error::InvalidInput`] when the
/// push total does not fit in an `i32`.
pub fn compute_with(bottle_size: &str, bottle_count: i32, rates: PushRates) -> Result<Dispensed> {
    let size: BottleSize = bottle_size.parse()?;
    let co2_pushes = rates
        .per_bottle(size)
        .checked_mul(bottle_count)
        .ok_or_else(|| Error::invalid_input("Bottle count too large"))?;
    Ok(Dispensed {
        volume_ml: size.volume_ml() * f64::from(bottle_count),
        co2_pushes,
    })
}
