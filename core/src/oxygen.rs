//! Oxygen partial pressure limits and toxicity exposure.

use serde::{Deserialize, Serialize};

use crate::config::PlanOptions;
use crate::gas::{Atmosphere, GasMix};
use crate::models::{DiveMode, DivePlan, Waypoint};

// ============================================================================
// Limits
// ============================================================================

/// Below this the mix is hypoxic (mbar).
pub const MIN_PO2_MBAR: u32 = 160;

/// Longest integration step for the exposure sums (seconds).
const EXPOSURE_STEP_S: u32 = 60;

/// pO2 below which no CNS or OTU accrues (mbar).
const EXPOSURE_THRESHOLD_MBAR: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum Po2Kind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct Po2Warning {
    pub kind: Po2Kind,
    pub time_s: u32,
    pub depth_mm: u32,
    pub gas: GasMix,
    pub po2_mbar: u32,
    /// The ceiling or floor that was crossed.
    pub limit_mbar: u32,
}

/// Checks every timed waypoint of an open-circuit plan against the pO2
/// ceiling for its phase and the hypoxic floor.
///
/// Closed-circuit plans hold a setpoint and are not checked.
pub fn check_po2(plan: &DivePlan, options: &PlanOptions) -> Vec<Po2Warning> {
    if plan.dive_mode == DiveMode::ClosedCircuit {
        return Vec::new();
    }
    let atm = plan.atmosphere();

    plan.waypoints
        .iter()
        .filter(|wp| wp.time_s != 0)
        .filter_map(|wp| {
            let gas = plan.gas_at(wp)?;
            let po2_mbar = gas.po2_mbar(atm.depth_to_mbar(wp.depth_mm));
            let ceiling = if wp.entered {
                options.bottom_po2_mbar
            } else {
                options.deco_po2_mbar
            };
            let (kind, limit_mbar) = if po2_mbar > ceiling {
                (Po2Kind::High, ceiling)
            } else if po2_mbar < MIN_PO2_MBAR {
                (Po2Kind::Low, MIN_PO2_MBAR)
            } else {
                return None;
            };
            Some(Po2Warning {
                kind,
                time_s: wp.time_s,
                depth_mm: wp.depth_mm,
                gas,
                po2_mbar,
                limit_mbar,
            })
        })
        .collect()
}

// ============================================================================
// CNS / OTU
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct OxygenExposure {
    /// Central nervous system toxicity, percent of the daily limit.
    pub cns_percent: f64,
    /// Oxygen tolerance units (pulmonary toxicity).
    pub otu: f64,
}

impl OxygenExposure {
    fn accumulate(&mut self, po2_mbar: f64, dt_s: f64) {
        if po2_mbar <= EXPOSURE_THRESHOLD_MBAR {
            return;
        }
        self.cns_percent += dt_s * cns_rate(po2_mbar) * 100.0;
        let po2_bar = po2_mbar / 1000.0;
        self.otu += dt_s / 60.0 * ((po2_bar - 0.5) / 0.5).powf(0.83);
    }
}

/// Fraction of the CNS limit accrued per second, exponential fits of the
/// NOAA exposure table below and above 1.5 bar.
fn cns_rate(po2_mbar: f64) -> f64 {
    if po2_mbar <= EXPOSURE_THRESHOLD_MBAR {
        0.0
    } else if po2_mbar <= 1500.0 {
        (-11.7853 + 0.00193873 * po2_mbar).exp()
    } else {
        (-23.6349 + 0.00980829 * po2_mbar).exp()
    }
}

fn inspired_po2_mbar(
    atm: &Atmosphere,
    mode: DiveMode,
    gas: &GasMix,
    setpoint_mbar: u32,
    depth_mm: f64,
) -> f64 {
    let ambient = atm.depth_to_mbar_f(depth_mm.round() as u32);
    if mode == DiveMode::ClosedCircuit && setpoint_mbar > 0 {
        f64::from(setpoint_mbar).min(ambient)
    } else {
        f64::from(gas.o2()) * ambient / 1000.0
    }
}

/// Integrates oxygen exposure along the plan, starting at the surface at
/// time zero and interpolating depth linearly between waypoints.
pub fn oxygen_exposure(plan: &DivePlan) -> OxygenExposure {
    let atm = plan.atmosphere();
    let mut exposure = OxygenExposure::default();
    let mut prev = Waypoint::default();

    for wp in plan.waypoints.iter().filter(|wp| wp.time_s != 0) {
        let Some(gas) = plan.gas_at(wp) else {
            continue;
        };
        let span = wp.time_s.saturating_sub(prev.time_s);
        let mut t = 0;
        while t < span {
            let dt = (span - t).min(EXPOSURE_STEP_S);
            let mid = (f64::from(t) + f64::from(dt) / 2.0) / f64::from(span);
            let depth = f64::from(prev.depth_mm)
                + (f64::from(wp.depth_mm) - f64::from(prev.depth_mm)) * mid;
            let po2 = inspired_po2_mbar(&atm, plan.dive_mode, &gas, wp.setpoint_mbar, depth);
            exposure.accumulate(po2, f64::from(dt));
            t += dt;
        }
        prev = *wp;
    }
    exposure
}
