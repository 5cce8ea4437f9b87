//! Breathing gas mixes.
//!
//! Fractions are kept in permille so that mixes compare exactly and all
//! partial pressure arithmetic stays in integer millibar.
//!
//! # Example
//!
//! ```
//! use diveplan_compute::gas::{parse_gas, GasMix};
//!
//! let bottom = parse_gas("Tx21/35").expect("valid trimix label");
//! let deco = parse_gas("EAN50").expect("valid nitrox label");
//! assert!(bottom.is_distinct(&deco));
//! assert_eq!(deco.to_string(), "EAN50");
//! assert_eq!(GasMix::AIR.po2_mbar(2000), 418);
//! ```

pub mod law;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

pub use law::{compressibility_factor, isothermal_pressure, surface_volume_ml, Atmosphere};
pub use parser::parse_gas;

/// O2 content of air in permille. A stored O2 fraction of zero means air.
pub const AIR_O2_PERMILLE: u32 = 209;

/// A breathing gas: O2 and He in permille, the balance is N2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Record,
)]
pub struct GasMix {
    pub o2_permille: u32,
    pub he_permille: u32,
}

impl GasMix {
    pub const AIR: GasMix = GasMix::from_permille(AIR_O2_PERMILLE, 0);
    pub const OXYGEN: GasMix = GasMix::from_permille(1000, 0);

    /// Build a mix without validation. Intended for constants and tests.
    pub const fn from_permille(o2_permille: u32, he_permille: u32) -> Self {
        GasMix {
            o2_permille,
            he_permille,
        }
    }

    /// Build a mix, rejecting fractions that do not add up.
    pub fn new(o2_permille: u32, he_permille: u32) -> Result<Self, PlanError> {
        if o2_permille == 0 || o2_permille + he_permille > 1000 {
            return Err(PlanError::InvalidGas {
                o2_permille,
                he_permille,
            });
        }
        Ok(Self::from_permille(o2_permille, he_permille))
    }

    pub fn o2(&self) -> u32 {
        if self.o2_permille == 0 {
            AIR_O2_PERMILLE
        } else {
            self.o2_permille
        }
    }

    pub fn he(&self) -> u32 {
        self.he_permille
    }

    pub fn n2(&self) -> u32 {
        1000u32.saturating_sub(self.o2() + self.he())
    }

    pub fn has_helium(&self) -> bool {
        self.he() > 0
    }

    pub fn is_air(&self) -> bool {
        self.he() == 0 && (AIR_O2_PERMILLE - 1..=AIR_O2_PERMILLE + 1).contains(&self.o2())
    }

    /// Squared permille distance between two mixes.
    pub fn distance(&self, other: &GasMix) -> u32 {
        let d_o2 = self.o2().abs_diff(other.o2());
        let d_he = self.he().abs_diff(other.he());
        d_o2 * d_o2 + d_he * d_he
    }

    /// True when switching from `self` to `other` is a gas change.
    pub fn is_distinct(&self, other: &GasMix) -> bool {
        self.distance(other) > 0
    }

    /// O2 partial pressure in mbar at the given ambient pressure.
    pub fn po2_mbar(&self, ambient_mbar: u32) -> u32 {
        ((u64::from(self.o2()) * u64::from(ambient_mbar) + 500) / 1000) as u32
    }

    /// Display name: `air`, `oxygen`, `EAN32` or `21/35`.
    pub fn name(&self) -> String {
        let o2 = self.o2();
        let he = self.he();
        if self.is_air() {
            "air".to_string()
        } else if he == 0 && o2 >= 1000 {
            "oxygen".to_string()
        } else if he == 0 {
            format!("EAN{}", (o2 + 5) / 10)
        } else {
            format!("{}/{}", (o2 + 5) / 10, (he + 5) / 10)
        }
    }
}

impl fmt::Display for GasMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
