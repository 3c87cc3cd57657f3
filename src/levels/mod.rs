//! DMX levels and the units operators type them in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod tables;
pub use self::tables::{LEVEL_PERCENT_TABLE, PERCENT_LEVEL_TABLE};

/// First addressable DMX channel, as operators count them.
pub const DMX_MIN: usize = 1;
/// Last addressable DMX channel.
pub const DMX_MAX: usize = 512;
pub const LEVEL_MIN: u8 = 0;
pub const LEVEL_MAX: u8 = 255;
/// Channels in one universe.
pub const UNIVERSE_SIZE: usize = 512;

/// Raw levels for one universe, indexed from 0.
pub type LevelBuffer = [u8; UNIVERSE_SIZE];

/// How levels are shown to and typed by the operator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Whole percentages, 0..=100.
    #[default]
    Percent,
    /// Raw levels, 0..=255.
    Decimal,
    /// Raw levels in base 16, 00..=FF.
    Hex,
}

impl DisplayMode {
    /// Radix typed level values are read in.
    pub fn radix(self) -> u32 {
        match self {
            DisplayMode::Hex => 16,
            DisplayMode::Percent | DisplayMode::Decimal => 10,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayMode::Percent => "percent",
            DisplayMode::Decimal => "decimal",
            DisplayMode::Hex => "hex",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown display mode: {0}")]
pub struct UnknownDisplayMode(pub String);

impl FromStr for DisplayMode {
    type Err = UnknownDisplayMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent" | "%" => Ok(DisplayMode::Percent),
            "decimal" | "dec" => Ok(DisplayMode::Decimal),
            "hex" => Ok(DisplayMode::Hex),
            _ => Err(UnknownDisplayMode(s.to_owned())),
        }
    }
}

/// Round a level in raw units and force it into 0..=255.
pub fn clamp_level(level: f64) -> u8 {
    // NaN falls through to 0 on the cast.
    level
        .round()
        .clamp(f64::from(LEVEL_MIN), f64::from(LEVEL_MAX)) as u8
}

/// Read a raw level in the units the operator is thinking in.
pub fn actual_to_user(level: u8, mode: DisplayMode) -> f64 {
    match mode {
        DisplayMode::Percent => f64::from(LEVEL_PERCENT_TABLE[level as usize]),
        DisplayMode::Decimal | DisplayMode::Hex => f64::from(level),
    }
}

/// Convert an operator value back to a raw level.
///
/// Whole percentages go through the table so that e.g. 1% is always the
/// same raw level no matter how it was reached. Fractional percentages (from
/// a `Thru` fade) and out-of-range ones use the linear formula.
pub fn user_to_actual(value: f64, mode: DisplayMode) -> u8 {
    match mode {
        DisplayMode::Percent => {
            if value.fract() == 0.0 && (0.0..=100.0).contains(&value) {
                PERCENT_LEVEL_TABLE[value as usize]
            } else {
                clamp_level(value / 100.0 * 255.0)
            }
        }
        DisplayMode::Decimal | DisplayMode::Hex => clamp_level(value),
    }
}

/// Format a raw level for display.
pub fn display_string(level: u8, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Percent => format!("{}%", LEVEL_PERCENT_TABLE[level as usize]),
        DisplayMode::Decimal => level.to_string(),
        DisplayMode::Hex => format!("{:02X}", level),
    }
}
