//! Structured dive plan notes.
//!
//! [`generate_report`] runs the reducer and every evaluator over one plan
//! and returns plain data. Nothing here formats text; see [`crate::render`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DecoModel, PlanOptions};
use crate::consumption::{self, CylinderConsumption};
use crate::icd::{self, IcdTable};
use crate::models::{DiveMode, DivePlan, GradientFactors};
use crate::oxygen::{self, OxygenExposure, Po2Warning};
use crate::reducer::{self, PlanLine};

/// Surface intervals from this long on are reported as a fresh start (s).
const LONG_LAYOFF_S: i64 = 48 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceIntervalBanner {
    /// The plan starts before the previous dive ended.
    Overlapping,
    LongLayoff,
    Interval { interval_s: i64 },
}

impl SurfaceIntervalBanner {
    pub fn classify(interval_s: i64) -> Self {
        if interval_s < 0 {
            SurfaceIntervalBanner::Overlapping
        } else if interval_s >= LONG_LAYOFF_S {
            SurfaceIntervalBanner::LongLayoff
        } else {
            SurfaceIntervalBanner::Interval { interval_s }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DecoModelSummary {
    Buhlmann {
        gf: GradientFactors,
    },
    Vpmb {
        conservatism: u32,
        effective_gf: Option<GradientFactors>,
    },
    Recreational {
        gf: GradientFactors,
    },
}

impl DecoModelSummary {
    fn new(options: &PlanOptions, effective_gf: Option<GradientFactors>) -> Self {
        let gf = GradientFactors {
            low: options.gf_low,
            high: options.gf_high,
        };
        match options.deco_model {
            DecoModel::Buhlmann => DecoModelSummary::Buhlmann { gf },
            DecoModel::Vpmb => DecoModelSummary::Vpmb {
                conservatism: options.vpmb_conservatism,
                effective_gf,
            },
            DecoModel::Recreational => DecoModelSummary::Recreational { gf },
        }
    }

    pub fn model(&self) -> DecoModel {
        match self {
            DecoModelSummary::Buhlmann { .. } => DecoModel::Buhlmann,
            DecoModelSummary::Vpmb { .. } => DecoModel::Vpmb,
            DecoModelSummary::Recreational { .. } => DecoModel::Recreational,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct AtmosphereSummary {
    pub surface_mbar: u32,
    pub altitude_mm: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct SacRates {
    pub bottom_ml_min: u32,
    pub deco_ml_min: u32,
}

/// Input problems that were worked around rather than reported as a plan
/// hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataWarning {
    /// The waypoint was dropped.
    UnknownCylinder { time_s: u32, cylinder: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct PlanReport {
    pub show_disclaimer: bool,
    pub banner: SurfaceIntervalBanner,
    pub runtime_min: u32,
    /// Leave a slot after the runtime for the caller's variation figures.
    pub show_variations: bool,
    pub verbatim: bool,
    pub display_duration: bool,
    pub display_runtime: bool,
    pub lines: Vec<PlanLine>,
    pub exposure: OxygenExposure,
    pub deco_model: DecoModelSummary,
    pub atmosphere: AtmosphereSummary,
    pub dive_mode: DiveMode,
    /// Absent on closed circuit, where the loop gas is not consumed at a SAC.
    pub sac: Option<SacRates>,
    pub consumption: Vec<CylinderConsumption>,
    /// Present when any open-circuit cylinder carries helium.
    pub icd: Option<IcdTable>,
    pub po2_warnings: Vec<Po2Warning>,
    pub data_warnings: Vec<DataWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanNotes {
    /// No waypoint with a known cylinder carries any time.
    NoPlan,
    /// The deco calculation gave up; nothing else is reported.
    Aborted,
    Report { report: PlanReport },
}

/// Drops waypoints whose cylinder does not exist.
fn sanitize(plan: &DivePlan) -> (DivePlan, Vec<DataWarning>) {
    let mut warnings = Vec::new();
    let mut clean = plan.clone();
    clean.waypoints.retain(|wp| {
        if plan.cylinder(wp).is_some() {
            return true;
        }
        warn!(
            time_s = wp.time_s,
            cylinder = wp.cylinder,
            cylinders = plan.cylinders.len(),
            "waypoint references unknown cylinder, dropping"
        );
        warnings.push(DataWarning::UnknownCylinder {
            time_s: wp.time_s,
            cylinder: wp.cylinder,
        });
        false
    });
    (clean, warnings)
}

/// Builds the notes for a computed plan.
///
/// This never fails: data problems degrade into warnings inside the
/// report, and only an empty or aborted plan yields a different outcome.
pub fn generate_report(plan: &DivePlan, options: &PlanOptions) -> PlanNotes {
    let (plan, data_warnings) = sanitize(plan);
    if plan.is_empty() {
        debug!(
            dropped = data_warnings.len(),
            "no timed waypoints, nothing to report"
        );
        return PlanNotes::NoPlan;
    }
    if plan.aborted {
        warn!("decompression calculation aborted");
        return PlanNotes::Aborted;
    }

    let atmosphere = plan.atmosphere();
    let reduced = reducer::reduce(&plan.waypoints, &plan.cylinders, options);

    let icd = plan
        .has_oc_helium()
        .then(|| icd::evaluate(&reduced.gas_changes, &atmosphere));
    let consumption = consumption::evaluate(&plan, reduced.last_bottom.as_ref(), options);
    let po2_warnings = oxygen::check_po2(&plan, options);
    let exposure = oxygen::oxygen_exposure(&plan);

    let sac = (plan.dive_mode != DiveMode::ClosedCircuit).then_some(SacRates {
        bottom_ml_min: options.bottom_sac_ml_min,
        deco_ml_min: options.deco_sac_ml_min,
    });

    let report = PlanReport {
        show_disclaimer: options.show_disclaimer,
        banner: SurfaceIntervalBanner::classify(plan.surface_interval_s),
        runtime_min: plan.duration_min(),
        show_variations: options.display_variations
            && options.deco_model != DecoModel::Recreational,
        verbatim: options.verbatim,
        display_duration: options.display_duration,
        display_runtime: options.display_runtime,
        lines: reduced.lines,
        exposure,
        deco_model: DecoModelSummary::new(options, plan.effective_gf),
        atmosphere: AtmosphereSummary {
            surface_mbar: atmosphere.surface_mbar,
            altitude_mm: atmosphere.altitude_mm(),
        },
        dive_mode: plan.dive_mode,
        sac,
        consumption,
        icd,
        po2_warnings,
        data_warnings,
    };
    debug!(
        lines = report.lines.len(),
        cylinders = report.consumption.len(),
        po2_warnings = report.po2_warnings.len(),
        "plan notes generated"
    );
    PlanNotes::Report { report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::GasMix;
    use crate::models::{Cylinder, Waypoint};

    fn simple_plan() -> DivePlan {
        DivePlan {
            waypoints: vec![
                Waypoint {
                    time_s: 0,
                    depth_mm: 0,
                    cylinder: 0,
                    setpoint_mbar: 0,
                    entered: true,
                },
                Waypoint {
                    time_s: 1800,
                    depth_mm: 18_000,
                    cylinder: 0,
                    setpoint_mbar: 0,
                    entered: true,
                },
            ],
            cylinders: vec![Cylinder {
                size_ml: 12_000,
                start_mbar: 200_000,
                end_mbar: 110_000,
                gas: GasMix::AIR,
                gas_used_ml: 1_080_000,
                ..Default::default()
            }],
            surface_interval_s: 3 * 3600,
            ..Default::default()
        }
    }

    fn report(notes: PlanNotes) -> PlanReport {
        match notes {
            PlanNotes::Report { report } => report,
            other => panic!("expected a report, got {other:?}"),
        }
    }

    #[test]
    fn test_banner_classification() {
        assert_eq!(
            SurfaceIntervalBanner::classify(-1),
            SurfaceIntervalBanner::Overlapping
        );
        assert_eq!(
            SurfaceIntervalBanner::classify(LONG_LAYOFF_S),
            SurfaceIntervalBanner::LongLayoff
        );
        assert_eq!(
            SurfaceIntervalBanner::classify(LONG_LAYOFF_S - 1),
            SurfaceIntervalBanner::Interval {
                interval_s: LONG_LAYOFF_S - 1
            }
        );
        assert_eq!(
            SurfaceIntervalBanner::classify(0),
            SurfaceIntervalBanner::Interval { interval_s: 0 }
        );
    }

    #[test]
    fn test_empty_plan_is_no_plan() {
        let mut plan = simple_plan();
        plan.waypoints.truncate(1);
        assert_eq!(generate_report(&plan, &PlanOptions::default()), PlanNotes::NoPlan);
    }

    #[test]
    fn test_aborted_short_circuits() {
        let mut plan = simple_plan();
        plan.aborted = true;
        assert_eq!(generate_report(&plan, &PlanOptions::default()), PlanNotes::Aborted);
    }

    #[test]
    fn test_unknown_cylinder_is_dropped_with_warning() {
        let mut plan = simple_plan();
        plan.waypoints.insert(
            1,
            Waypoint {
                time_s: 60,
                depth_mm: 6_000,
                cylinder: 4,
                setpoint_mbar: 0,
                entered: true,
            },
        );
        let report = report(generate_report(&plan, &PlanOptions::default()));
        assert_eq!(
            report.data_warnings,
            vec![DataWarning::UnknownCylinder {
                time_s: 60,
                cylinder: 4
            }]
        );
        assert_eq!(report.lines.len(), 1);
    }

    #[test]
    fn test_only_unknown_cylinders_is_no_plan() {
        let mut plan = simple_plan();
        plan.waypoints[1].cylinder = 7;
        assert_eq!(generate_report(&plan, &PlanOptions::default()), PlanNotes::NoPlan);

        plan.aborted = true;
        assert_eq!(generate_report(&plan, &PlanOptions::default()), PlanNotes::NoPlan);
    }

    #[test]
    fn test_report_header_fields() {
        let options = PlanOptions {
            display_variations: true,
            ..Default::default()
        };
        let report = report(generate_report(&simple_plan(), &options));
        assert_eq!(report.runtime_min, 30);
        assert!(report.show_variations);
        assert_eq!(report.atmosphere.surface_mbar, 1013);
        assert_eq!(report.atmosphere.altitude_mm, 0);
        assert_eq!(
            report.deco_model,
            DecoModelSummary::Buhlmann {
                gf: GradientFactors { low: 30, high: 75 }
            }
        );
        assert_eq!(
            report.sac,
            Some(SacRates {
                bottom_ml_min: 20_000,
                deco_ml_min: 17_000
            })
        );
        assert!(report.icd.is_none());
    }

    #[test]
    fn test_recreational_hides_variations() {
        let options = PlanOptions {
            display_variations: true,
            deco_model: DecoModel::Recreational,
            ..Default::default()
        };
        let report = report(generate_report(&simple_plan(), &options));
        assert!(!report.show_variations);
        assert_eq!(report.deco_model.model(), DecoModel::Recreational);
    }

    #[test]
    fn test_vpmb_summary_carries_effective_gf() {
        let mut plan = simple_plan();
        plan.effective_gf = Some(GradientFactors { low: 42, high: 81 });
        let options = PlanOptions {
            deco_model: DecoModel::Vpmb,
            vpmb_conservatism: 2,
            ..Default::default()
        };
        let report = report(generate_report(&plan, &options));
        assert_eq!(
            report.deco_model,
            DecoModelSummary::Vpmb {
                conservatism: 2,
                effective_gf: Some(GradientFactors { low: 42, high: 81 })
            }
        );
    }

    #[test]
    fn test_closed_circuit_omits_sac() {
        let mut plan = simple_plan();
        plan.dive_mode = DiveMode::ClosedCircuit;
        let report = report(generate_report(&plan, &PlanOptions::default()));
        assert_eq!(report.sac, None);
    }
}
