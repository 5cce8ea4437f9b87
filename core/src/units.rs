//! Display unit conversion for the rendered notes.
//!
//! All computations stay in mm / ml / mbar; these helpers only turn a value
//! into a number, a unit label and the number of decimals worth showing.

use std::fmt;

use serde::{Deserialize, Serialize};

const MM_PER_FOOT: f64 = 304.8;
const ML_PER_CUFT: f64 = 28_316.846_592;
const PSI_PER_MBAR: f64 = 0.014_503_773_8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    #[default]
    Liter,
    CubicFeet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum PressureUnit {
    #[default]
    Bar,
    Psi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct UnitPreferences {
    pub length: LengthUnit,
    pub volume: VolumeUnit,
    pub pressure: PressureUnit,
}

/// A converted value with its unit label and preferred precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayValue {
    pub value: f64,
    pub decimals: usize,
    pub unit: &'static str,
}

impl DisplayValue {
    pub fn with_decimals(self, decimals: usize) -> Self {
        Self { decimals, ..self }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}{}", self.decimals, self.value, self.unit)
    }
}

impl UnitPreferences {
    pub const METRIC: Self = Self {
        length: LengthUnit::Meters,
        volume: VolumeUnit::Liter,
        pressure: PressureUnit::Bar,
    };

    pub const IMPERIAL: Self = Self {
        length: LengthUnit::Feet,
        volume: VolumeUnit::CubicFeet,
        pressure: PressureUnit::Psi,
    };

    /// Shallow metric depths get one decimal; feet never do.
    pub fn depth(&self, mm: i64) -> DisplayValue {
        match self.length {
            LengthUnit::Meters => {
                let m = mm as f64 / 1000.0;
                DisplayValue {
                    value: m,
                    decimals: usize::from(m < 20.0),
                    unit: "m",
                }
            }
            LengthUnit::Feet => DisplayValue {
                value: mm as f64 / MM_PER_FOOT,
                decimals: 0,
                unit: "ft",
            },
        }
    }

    pub fn volume(&self, ml: f64) -> DisplayValue {
        match self.volume {
            VolumeUnit::Liter => DisplayValue {
                value: ml / 1000.0,
                decimals: 1,
                unit: "ℓ",
            },
            VolumeUnit::CubicFeet => DisplayValue {
                value: ml / ML_PER_CUFT,
                decimals: 2,
                unit: "cuft",
            },
        }
    }

    pub fn pressure(&self, mbar: f64) -> DisplayValue {
        match self.pressure {
            PressureUnit::Bar => DisplayValue {
                value: mbar / 1000.0,
                decimals: 0,
                unit: "bar",
            },
            PressureUnit::Psi => DisplayValue {
                value: mbar * PSI_PER_MBAR,
                decimals: 0,
                unit: "psi",
            },
        }
    }
}
