//! Per-cylinder gas consumption, reserve warnings and minimum gas.
//!
//! Pressures are derived from the surface volumes the planner attributed to
//! each cylinder. Remaining and required gas go through the same real-gas
//! conversion so the minimum gas margin compares like with like.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DecoModel, PlanOptions};
use crate::gas::{isothermal_pressure, surface_volume_ml, GasMix};
use crate::models::{Cylinder, DiveMode, DivePlan, Waypoint};

/// End pressure below which the cylinder is considered overdrawn (mbar).
const RESERVE_FLOOR_MBAR: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct PressureUsage {
    /// Start minus end pressure.
    pub used_mbar: u32,
    /// Pressure the planned ascent draws from the cylinder.
    pub ascent_mbar: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GasWarning {
    /// The plan breathes the cylinder below the reserve floor.
    MoreGasThanAvailable,
    /// What is left would not cover the ascent again for a buddy.
    NoReserveForGasSharing,
    /// The reserve needed from the last bottom waypoint is more than the
    /// cylinder starts with.
    MinimumGasExceedsStartPressure { required_mbar: u32 },
}

/// Gas needed to bring two divers up from the end of the bottom phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct MinimumGas {
    pub depth_mm: u32,
    pub sac_factor_percent: u32,
    pub problem_solving_time_s: u32,
    pub volume_ml: u32,
    pub required_mbar: u32,
    /// End pressure plus ascent pressure minus the requirement.
    pub margin_mbar: i32,
}

impl MinimumGas {
    pub fn is_sufficient(&self) -> bool {
        self.margin_mbar > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct CylinderConsumption {
    pub index: u32,
    pub gas: GasMix,
    pub gas_used_ml: u32,
    pub deco_gas_used_ml: u32,
    /// Absent when the cylinder size is unknown.
    pub pressure: Option<PressureUsage>,
    pub warning: Option<GasWarning>,
    pub minimum_gas: Option<MinimumGas>,
}

/// Computes the consumption rows for every non-empty cylinder slot.
///
/// `last_bottom` is the waypoint the minimum gas reserve is computed from;
/// only its cylinder gets a reserve figure.
pub fn evaluate(
    plan: &DivePlan,
    last_bottom: Option<&Waypoint>,
    options: &PlanOptions,
) -> Vec<CylinderConsumption> {
    plan.cylinders
        .iter()
        .enumerate()
        .filter(|(_, cyl)| !cyl.is_empty())
        .map(|(idx, cyl)| cylinder_consumption(plan, idx as u32, cyl, last_bottom, options))
        .collect()
}

fn cylinder_consumption(
    plan: &DivePlan,
    index: u32,
    cyl: &Cylinder,
    last_bottom: Option<&Waypoint>,
    options: &PlanOptions,
) -> CylinderConsumption {
    let mut row = CylinderConsumption {
        index,
        gas: cyl.gas,
        gas_used_ml: cyl.gas_used_ml,
        deco_gas_used_ml: cyl.deco_gas_used_ml,
        pressure: None,
        warning: None,
        minimum_gas: None,
    };
    if cyl.size_ml == 0 {
        debug!(index, "cylinder size unknown, volumes only");
        return row;
    }

    let size = f64::from(cyl.size_ml);
    let remaining_ml = surface_volume_ml(&cyl.gas, cyl.end_mbar, cyl.size_ml);
    // The volume round trip is not exact, so without deco gas the figure
    // would be rounding noise around zero.
    let ascent_mbar = if cyl.deco_gas_used_ml == 0 {
        0
    } else {
        let pressure = isothermal_pressure(
            &cyl.gas,
            1.0,
            remaining_ml.round() + f64::from(cyl.deco_gas_used_ml),
            size,
        ) * 1000.0
            - f64::from(cyl.end_mbar);
        pressure.round().max(0.0) as i32
    };
    row.pressure = Some(PressureUsage {
        used_mbar: cyl.start_mbar.saturating_sub(cyl.end_mbar),
        ascent_mbar,
    });

    if cyl.end_mbar < RESERVE_FLOOR_MBAR {
        row.warning = Some(GasWarning::MoreGasThanAvailable);
    } else if remaining_ml < f64::from(cyl.deco_gas_used_ml) {
        row.warning = Some(GasWarning::NoReserveForGasSharing);
    } else if let Some(bottom) = last_bottom.filter(|wp| {
        wp.cylinder == index
            && plan.dive_mode == DiveMode::OpenCircuit
            && options.deco_model != DecoModel::Recreational
    }) {
        let mingas = minimum_gas(plan, cyl, bottom, f64::from(ascent_mbar), options);
        if cyl.start_mbar > mingas.required_mbar {
            row.minimum_gas = Some(mingas);
        } else {
            row.warning = Some(GasWarning::MinimumGasExceedsStartPressure {
                required_mbar: mingas.required_mbar,
            });
        }
    }

    debug!(
        index,
        gas = %cyl.gas,
        used_ml = cyl.gas_used_ml,
        deco_ml = cyl.deco_gas_used_ml,
        warning = ?row.warning,
        "cylinder consumption"
    );
    row
}

fn minimum_gas(
    plan: &DivePlan,
    cyl: &Cylinder,
    bottom: &Waypoint,
    ascent_mbar: f64,
    options: &PlanOptions,
) -> MinimumGas {
    let factor = f64::from(options.sac_factor_percent) / 100.0;
    let problem_solving_min = f64::from(options.problem_solving_time_s) / 60.0;
    let ambient_bar = plan.atmosphere().depth_to_bar(bottom.depth_mm);

    let volume_ml = (factor * problem_solving_min * f64::from(options.bottom_sac_ml_min) * ambient_bar
        + factor * f64::from(cyl.deco_gas_used_ml))
    .round();
    let required_mbar =
        (isothermal_pressure(&cyl.gas, 1.0, volume_ml, f64::from(cyl.size_ml)) * 1000.0).round();
    let margin_mbar = (f64::from(cyl.end_mbar) + ascent_mbar - required_mbar).round();

    MinimumGas {
        depth_mm: bottom.depth_mm,
        sac_factor_percent: options.sac_factor_percent,
        problem_solving_time_s: options.problem_solving_time_s,
        volume_ml: volume_ml as u32,
        required_mbar: required_mbar as u32,
        margin_mbar: margin_mbar as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air_twelve(start_bar: u32, end_bar: u32, deco_l: u32) -> Cylinder {
        Cylinder {
            size_ml: 12_000,
            working_pressure_mbar: 232_000,
            start_mbar: start_bar * 1000,
            end_mbar: end_bar * 1000,
            gas: GasMix::AIR,
            gas_used_ml: 2_000_000,
            deco_gas_used_ml: deco_l * 1000,
            ..Default::default()
        }
    }

    fn bottom_at(depth_m: u32) -> Waypoint {
        Waypoint {
            time_s: 1200,
            depth_mm: depth_m * 1000,
            cylinder: 0,
            setpoint_mbar: 0,
            entered: true,
        }
    }

    fn mingas_options() -> PlanOptions {
        PlanOptions {
            sac_factor_percent: 150,
            problem_solving_time_s: 60,
            ..Default::default()
        }
    }

    fn plan_with(cyl: Cylinder) -> DivePlan {
        DivePlan {
            cylinders: vec![cyl],
            ..Default::default()
        }
    }

    #[test]
    fn test_minimum_gas_positive_margin() {
        let plan = plan_with(air_twelve(200, 120, 600));
        let bottom = bottom_at(30);
        let rows = evaluate(&plan, Some(&bottom), &mingas_options());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].warning, None);

        let mingas = rows[0].minimum_gas.expect("minimum gas row");
        // 1.5 x 1 min x 20 l/min x ~4.04 bar + 1.5 x 600 l
        assert!((1_020_000..1_023_000).contains(&mingas.volume_ml), "{mingas:?}");
        assert!(mingas.required_mbar < 200_000);
        assert!(mingas.margin_mbar > 0);
        assert!(mingas.is_sufficient());
        assert_eq!(mingas.depth_mm, 30_000);
    }

    #[test]
    fn test_minimum_gas_exceeds_start_pressure() {
        let plan = plan_with(air_twelve(80, 60, 600));
        let bottom = bottom_at(30);
        let rows = evaluate(&plan, Some(&bottom), &mingas_options());
        assert_eq!(rows[0].minimum_gas, None);
        match rows[0].warning {
            Some(GasWarning::MinimumGasExceedsStartPressure { required_mbar }) => {
                assert!(required_mbar >= 80_000);
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[test]
    fn test_overdrawn_cylinder() {
        let plan = plan_with(air_twelve(200, 5, 600));
        let rows = evaluate(&plan, Some(&bottom_at(30)), &mingas_options());
        assert_eq!(rows[0].warning, Some(GasWarning::MoreGasThanAvailable));
        assert_eq!(rows[0].minimum_gas, None);
    }

    #[test]
    fn test_no_reserve_for_gas_sharing() {
        // 20 bar left in 12 l is ~240 l, less than the 600 l ascent.
        let plan = plan_with(air_twelve(200, 20, 600));
        let rows = evaluate(&plan, Some(&bottom_at(30)), &mingas_options());
        assert_eq!(rows[0].warning, Some(GasWarning::NoReserveForGasSharing));
    }

    #[test]
    fn test_pressure_usage() {
        let plan = plan_with(air_twelve(200, 120, 600));
        let rows = evaluate(&plan, None, &PlanOptions::default());
        let pressure = rows[0].pressure.unwrap();
        assert_eq!(pressure.used_mbar, 80_000);
        // 600 l into 12 l is ~50 bar.
        assert!((45_000..55_000).contains(&pressure.ascent_mbar), "{pressure:?}");
        assert_eq!(rows[0].minimum_gas, None);
    }

    #[test]
    fn test_no_deco_gas_means_no_ascent_pressure() {
        let plan = plan_with(air_twelve(200, 110, 0));
        let rows = evaluate(&plan, None, &PlanOptions::default());
        let pressure = rows[0].pressure.unwrap();
        assert_eq!(pressure.used_mbar, 90_000);
        assert_eq!(pressure.ascent_mbar, 0);
    }

    #[test]
    fn test_minimum_gas_skipped_for_recreational_and_ccr() {
        let bottom = bottom_at(30);
        let recreational = PlanOptions {
            deco_model: DecoModel::Recreational,
            ..mingas_options()
        };
        let plan = plan_with(air_twelve(200, 120, 600));
        assert_eq!(evaluate(&plan, Some(&bottom), &recreational)[0].minimum_gas, None);

        let mut ccr = plan_with(air_twelve(200, 120, 600));
        ccr.dive_mode = DiveMode::ClosedCircuit;
        assert_eq!(evaluate(&ccr, Some(&bottom), &mingas_options())[0].minimum_gas, None);
    }

    #[test]
    fn test_minimum_gas_only_for_bottom_cylinder() {
        let mut plan = plan_with(air_twelve(200, 120, 600));
        plan.cylinders.push(Cylinder {
            gas: GasMix::from_permille(500, 0),
            ..air_twelve(200, 150, 300)
        });
        let rows = evaluate(&plan, Some(&bottom_at(30)), &mingas_options());
        assert!(rows[0].minimum_gas.is_some());
        assert!(rows[1].minimum_gas.is_none());
    }

    #[test]
    fn test_unknown_size_keeps_volumes() {
        let plan = plan_with(Cylinder {
            size_ml: 0,
            gas_used_ml: 1_500_000,
            deco_gas_used_ml: 400_000,
            ..Default::default()
        });
        let rows = evaluate(&plan, Some(&bottom_at(30)), &mingas_options());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gas_used_ml, 1_500_000);
        assert_eq!(rows[0].pressure, None);
        assert_eq!(rows[0].warning, None);
        assert_eq!(rows[0].minimum_gas, None);
    }

    #[test]
    fn test_empty_slots_are_skipped() {
        let mut plan = plan_with(air_twelve(200, 120, 600));
        plan.cylinders.insert(0, Cylinder::default());
        let rows = evaluate(&plan, None, &PlanOptions::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 1);
    }
}
