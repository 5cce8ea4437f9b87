use serde::{Deserialize, Serialize};

use crate::gas::{Atmosphere, GasMix};

/// Breathing loop configuration of the dive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum DiveMode {
    #[default]
    OpenCircuit,
    ClosedCircuit,
    SemiClosed,
}

/// What a cylinder is used for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum CylinderUse {
    #[default]
    OcGas,
    Diluent,
    Oxygen,
    NotUsed,
}

/// A cylinder with its pressures and the gas usage attributed to it by the
/// planner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Cylinder {
    /// Water capacity (ml). Zero when unknown.
    pub size_ml: u32,
    pub working_pressure_mbar: u32,
    pub start_mbar: u32,
    pub end_mbar: u32,
    pub gas: GasMix,
    pub usage: CylinderUse,
    /// Surface volume used over the whole plan (ml).
    pub gas_used_ml: u32,
    /// Surface volume used during the planned ascent (ml).
    pub deco_gas_used_ml: u32,
}

impl Cylinder {
    /// A slot with no size, pressures or usage carries nothing to report.
    pub fn is_empty(&self) -> bool {
        self.size_ml == 0
            && self.start_mbar == 0
            && self.end_mbar == 0
            && self.gas_used_ml == 0
            && self.deco_gas_used_ml == 0
    }
}

/// A planned waypoint: the diver reaches `depth_mm` at `time_s` breathing
/// from `cylinder`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct Waypoint {
    /// Offset from the start of the dive (seconds).
    pub time_s: u32,
    pub depth_mm: u32,
    /// Index into [`DivePlan::cylinders`].
    pub cylinder: u32,
    /// Closed-circuit setpoint (mbar); zero on open circuit.
    pub setpoint_mbar: u32,
    /// Placed by the diver rather than generated by the deco algorithm.
    pub entered: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct GradientFactors {
    pub low: u32,
    pub high: u32,
}

/// A computed dive plan as handed over by the deco planner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DivePlan {
    /// Time-ordered waypoints. Zero-time entries after the first are
    /// placeholders.
    pub waypoints: Vec<Waypoint>,
    pub cylinders: Vec<Cylinder>,
    pub dive_mode: DiveMode,
    /// Zero means standard pressure.
    pub surface_pressure_mbar: u32,
    /// Water salinity (g per 10 l). Zero means sea water.
    pub salinity: u32,
    /// Time since the previous dive ended; negative when dives overlap.
    pub surface_interval_s: i64,
    /// Gradient factors equivalent to the VPM-B schedule, when known.
    pub effective_gf: Option<GradientFactors>,
    /// The deco calculation gave up before producing a schedule.
    pub aborted: bool,
}

impl DivePlan {
    pub fn atmosphere(&self) -> Atmosphere {
        Atmosphere::new(self.surface_pressure_mbar, self.salinity)
    }

    pub fn cylinder(&self, waypoint: &Waypoint) -> Option<&Cylinder> {
        self.cylinders.get(waypoint.cylinder as usize)
    }

    /// Gas breathed on the way to `waypoint`.
    pub fn gas_at(&self, waypoint: &Waypoint) -> Option<GasMix> {
        self.cylinder(waypoint).map(|c| c.gas)
    }

    /// Total runtime in whole minutes, rounded.
    pub fn duration_min(&self) -> u32 {
        let last = self.waypoints.iter().map(|w| w.time_s).max().unwrap_or(0);
        (last + 30) / 60
    }

    /// True when no waypoint after the start carries any time.
    pub fn is_empty(&self) -> bool {
        !self.waypoints.iter().any(|w| w.time_s > 0)
    }

    pub fn has_oc_helium(&self) -> bool {
        self.cylinders
            .iter()
            .any(|c| c.usage == CylinderUse::OcGas && c.gas.has_helium())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(time_s: u32, depth_mm: u32, cylinder: u32) -> Waypoint {
        Waypoint {
            time_s,
            depth_mm,
            cylinder,
            setpoint_mbar: 0,
            entered: true,
        }
    }

    #[test]
    fn test_duration_rounds_to_minutes() {
        let plan = DivePlan {
            waypoints: vec![waypoint(0, 0, 0), waypoint(89, 10_000, 0)],
            ..Default::default()
        };
        assert_eq!(plan.duration_min(), 1);

        let plan = DivePlan {
            waypoints: vec![waypoint(0, 0, 0), waypoint(90, 10_000, 0)],
            ..Default::default()
        };
        assert_eq!(plan.duration_min(), 2);
    }

    #[test]
    fn test_empty_plan() {
        assert!(DivePlan::default().is_empty());
        let plan = DivePlan {
            waypoints: vec![waypoint(0, 0, 0), waypoint(0, 0, 0)],
            ..Default::default()
        };
        assert!(plan.is_empty());
    }

    #[test]
    fn test_gas_lookup() {
        let plan = DivePlan {
            cylinders: vec![Cylinder {
                gas: GasMix::from_permille(320, 0),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            plan.gas_at(&waypoint(60, 0, 0)),
            Some(GasMix::from_permille(320, 0))
        );
        assert_eq!(plan.gas_at(&waypoint(60, 0, 3)), None);
    }

    #[test]
    fn test_has_oc_helium_ignores_diluent() {
        let mut plan = DivePlan {
            cylinders: vec![
                Cylinder {
                    gas: GasMix::from_permille(100, 700),
                    usage: CylinderUse::Diluent,
                    ..Default::default()
                },
                Cylinder {
                    gas: GasMix::from_permille(500, 0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert!(!plan.has_oc_helium());
        plan.cylinders[1].gas = GasMix::from_permille(210, 350);
        assert!(plan.has_oc_helium());
    }

    #[test]
    fn test_empty_cylinder_slot() {
        assert!(Cylinder::default().is_empty());
        let cyl = Cylinder {
            size_ml: 12_000,
            ..Default::default()
        };
        assert!(!cyl.is_empty());
    }
}
