//! JSON plan files for the command-line front end.
//!
//! Same shape as [`DivePlan`], except that cylinder gases are written as
//! labels (`"EAN50"`, `"Tx21/35"`) and planner options may be embedded.

use std::path::Path;

use serde::Deserialize;

use crate::config::PlanOptions;
use crate::error::PlanError;
use crate::gas::{parse_gas, GasMix};
use crate::models::{Cylinder, CylinderUse, DiveMode, DivePlan, GradientFactors, Waypoint};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CylinderEntry {
    size_ml: u32,
    working_pressure_mbar: u32,
    start_mbar: u32,
    end_mbar: u32,
    gas: Option<String>,
    usage: CylinderUse,
    gas_used_ml: u32,
    deco_gas_used_ml: u32,
}

impl CylinderEntry {
    fn into_cylinder(self) -> Result<Cylinder, PlanError> {
        let gas = match self.gas.as_deref() {
            Some(label) => parse_gas(label)?,
            None => GasMix::AIR,
        };
        Ok(Cylinder {
            size_ml: self.size_ml,
            working_pressure_mbar: self.working_pressure_mbar,
            start_mbar: self.start_mbar,
            end_mbar: self.end_mbar,
            gas,
            usage: self.usage,
            gas_used_ml: self.gas_used_ml,
            deco_gas_used_ml: self.deco_gas_used_ml,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlanFile {
    waypoints: Vec<Waypoint>,
    cylinders: Vec<CylinderEntry>,
    dive_mode: DiveMode,
    surface_pressure_mbar: u32,
    salinity: u32,
    surface_interval_s: i64,
    effective_gf: Option<GradientFactors>,
    aborted: bool,
    options: Option<PlanOptions>,
}

/// A parsed plan file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFile {
    pub plan: DivePlan,
    /// Options embedded in the file, if any.
    pub options: Option<PlanOptions>,
}

impl PlanFile {
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let raw: RawPlanFile = serde_json::from_str(json)?;
        let cylinders = raw
            .cylinders
            .into_iter()
            .map(CylinderEntry::into_cylinder)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            plan: DivePlan {
                waypoints: raw.waypoints,
                cylinders,
                dive_mode: raw.dive_mode,
                surface_pressure_mbar: raw.surface_pressure_mbar,
                salinity: raw.salinity,
                surface_interval_s: raw.surface_interval_s,
                effective_gf: raw.effective_gf,
                aborted: raw.aborted,
            },
            options: raw.options,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
