//! Segment reducer: turns a dense waypoint sequence into the legs worth
//! reporting.
//!
//! The planner emits a waypoint for every step of the deco ladder. The
//! collapsed table keeps only entered legs, stops, gas changes and the final
//! leg; the verbatim listing keeps every transition and stay and spells out
//! each gas switch on its own line.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlanOptions;
use crate::gas::GasMix;
use crate::models::{Cylinder, Waypoint};

/// Waypoints closer than this to the previous leg at the same depth are
/// merged into it (seconds).
const MIN_LEG_DURATION_S: u32 = 10;

/// Shape of a reported leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Ascent,
    Descent,
    /// Constant depth, placed by the diver.
    Stay,
    /// Constant depth, computed by the deco algorithm.
    DecoStop,
}

impl LegKind {
    pub fn is_transition(&self) -> bool {
        matches!(self, LegKind::Ascent | LegKind::Descent)
    }
}

/// Which end of a leg a gas change is shown on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum GasChangeEdge {
    /// The leg is already breathed on the new gas.
    Leading,
    /// The switch happens when the leg ends.
    Trailing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct GasAnnotation {
    pub edge: GasChangeEdge,
    pub gas: GasMix,
    pub setpoint_mbar: u32,
}

/// One reported row of the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct Leg {
    pub kind: LegKind,
    pub depth_mm: u32,
    /// Time since the previous reported leg ended.
    pub duration_s: u32,
    /// Time at which this leg ends.
    pub runtime_s: u32,
    pub cylinder: u32,
    pub gas: GasMix,
    pub setpoint_mbar: u32,
    pub entered: bool,
    pub gas_change: Option<GasAnnotation>,
}

/// A gas switch spelled out on its own line (verbatim plans).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct GasSwitch {
    pub time_s: u32,
    pub depth_mm: u32,
    pub gas: GasMix,
    pub setpoint_mbar: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanLine {
    Segment { leg: Leg },
    Switch { gas_switch: GasSwitch },
}

impl PlanLine {
    pub fn time_s(&self) -> u32 {
        match self {
            PlanLine::Segment { leg } => leg.runtime_s,
            PlanLine::Switch { gas_switch } => gas_switch.time_s,
        }
    }

    pub fn as_leg(&self) -> Option<&Leg> {
        match self {
            PlanLine::Segment { leg } => Some(leg),
            PlanLine::Switch { .. } => None,
        }
    }
}

/// An open-circuit gas change as shown in the report, input to the
/// counterdiffusion check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasChangeEvent {
    pub time_s: u32,
    pub depth_mm: u32,
    pub from: GasMix,
    pub to: GasMix,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedPlan {
    pub lines: Vec<PlanLine>,
    /// Last entered waypoint before the computed ascent starts.
    pub last_bottom: Option<Waypoint>,
    pub gas_changes: Vec<GasChangeEvent>,
}

impl ReducedPlan {
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.lines.iter().filter_map(PlanLine::as_leg)
    }
}

/// State carried from one kept waypoint to the next.
struct Cursor {
    last_depth: u32,
    last_time: u32,
    last_print_depth: u32,
    new_depth: u32,
    last_setpoint: Option<u32>,
    last_print_setpoint: Option<u32>,
    last_print_gas: Option<GasMix>,
    last_entered: bool,
}

impl Cursor {
    fn new() -> Self {
        Self {
            last_depth: 0,
            last_time: 0,
            last_print_depth: 0,
            new_depth: 0,
            last_setpoint: None,
            last_print_setpoint: None,
            last_print_gas: None,
            last_entered: true,
        }
    }

    fn classify(&self, wp: &Waypoint) -> LegKind {
        if wp.depth_mm < self.last_depth {
            LegKind::Ascent
        } else if wp.depth_mm > self.last_depth {
            LegKind::Descent
        } else if wp.entered {
            LegKind::Stay
        } else {
            LegKind::DecoStop
        }
    }

    fn leg(&self, wp: &Waypoint, gas: GasMix, gas_change: Option<GasAnnotation>) -> Leg {
        Leg {
            kind: self.classify(wp),
            depth_mm: wp.depth_mm,
            duration_s: wp.time_s.saturating_sub(self.last_time),
            runtime_s: wp.time_s,
            cylinder: wp.cylinder,
            gas,
            setpoint_mbar: wp.setpoint_mbar,
            entered: wp.entered,
            gas_change,
        }
    }

    /// Every verbatim line names its gas, so it becomes the last one shown.
    fn printed(&mut self, gas: GasMix, setpoint_mbar: u32) {
        self.last_print_gas = Some(gas);
        self.last_print_setpoint = Some(setpoint_mbar);
    }

    /// Records a helium-relevant gas change leaving the last printed gas.
    fn gas_change_event(&self, time_s: u32, depth_mm: u32, to: GasMix) -> Option<GasChangeEvent> {
        self.last_print_gas
            .filter(|from| from.has_helium() && from.is_distinct(&to))
            .map(|from| GasChangeEvent {
                time_s,
                depth_mm,
                from,
                to,
            })
    }
}

/// Reduce `waypoints` to reportable lines.
///
/// Waypoints whose cylinder index is not in `cylinders` must have been
/// removed by the caller; should one slip through it is treated as air.
pub fn reduce(waypoints: &[Waypoint], cylinders: &[Cylinder], options: &PlanOptions) -> ReducedPlan {
    let gas_of = |wp: &Waypoint| {
        cylinders
            .get(wp.cylinder as usize)
            .map(|c| c.gas)
            .unwrap_or(GasMix::AIR)
    };

    let mut out = ReducedPlan::default();
    let mut cur = Cursor::new();

    for (idx, wp) in waypoints.iter().enumerate() {
        if wp.time_s == 0 {
            continue;
        }
        let next = waypoints[idx + 1..].iter().find(|w| w.time_s != 0);
        let gas = gas_of(wp);
        let next_gas = next.map(gas_of);
        let is_ascent = wp.depth_mm < cur.last_depth;
        let is_terminal = next.is_none();
        let next_depth_changes = next.is_some_and(|n| n.depth_mm != wp.depth_mm);

        let mut gaschange_after = next.is_some_and(|n| {
            gas.is_distinct(&gas_of(n)) || wp.setpoint_mbar != n.setpoint_mbar
        });
        let gaschange_before = cur.last_print_gas.map_or(true, |g| g.is_distinct(&gas))
            || cur.last_print_setpoint != Some(wp.setpoint_mbar);

        // A computed point on the way between two depths with no gas change
        // carries nothing worth a row.
        if !wp.entered
            && !is_terminal
            && wp.depth_mm != cur.last_depth
            && next_depth_changes
            && !gaschange_before
            && !gaschange_after
        {
            debug!(time_s = wp.time_s, depth_mm = wp.depth_mm, "skipping transient waypoint");
            continue;
        }
        if wp.time_s.saturating_sub(cur.last_time) < MIN_LEG_DURATION_S
            && cur.last_depth == wp.depth_mm
            && !(gaschange_after && next_depth_changes)
        {
            debug!(time_s = wp.time_s, depth_mm = wp.depth_mm, "merging short waypoint");
            continue;
        }

        if wp.entered && next.is_some_and(|n| !n.entered) {
            out.last_bottom = Some(*wp);
        }

        if options.verbatim {
            if wp.depth_mm != cur.last_print_depth {
                if options.display_transitions
                    || wp.entered
                    || is_terminal
                    || (gaschange_after && next_depth_changes)
                {
                    out.lines.push(PlanLine::Segment {
                        leg: cur.leg(wp, gas, None),
                    });
                    cur.printed(gas, wp.setpoint_mbar);
                }
                cur.new_depth = wp.depth_mm;
                cur.last_time = wp.time_s;
            } else if next_depth_changes || gaschange_after {
                out.lines.push(PlanLine::Segment {
                    leg: cur.leg(wp, gas, None),
                });
                cur.printed(gas, wp.setpoint_mbar);
                cur.new_depth = wp.depth_mm;
                cur.last_time = wp.time_s;
            }
        } else if options.display_transitions
            || wp.entered
            || is_terminal
            || next_depth_changes
            || (!is_ascent && gaschange_before && next_depth_changes)
            || (gaschange_after && cur.last_entered)
            || (gaschange_after && !is_ascent)
            || (is_ascent && gaschange_after && next_depth_changes)
            || (cur.last_entered && !wp.entered)
        {
            // A switch at the end of an ascent is shown there only when no
            // stop follows; otherwise the stop shows it as its new gas.
            let trailing = (is_ascent || wp.entered)
                && gaschange_after
                && next.is_some_and(|n| n.depth_mm != wp.depth_mm || n.entered);

            let annotation = match (trailing, next, next_gas) {
                (true, Some(n), Some(new_gas)) => {
                    if wp.setpoint_mbar == 0 && is_ascent {
                        out.gas_changes
                            .extend(cur.gas_change_event(wp.time_s, wp.depth_mm, new_gas));
                    }
                    cur.last_print_setpoint = Some(n.setpoint_mbar);
                    cur.last_print_gas = Some(new_gas);
                    gaschange_after = false;
                    Some(GasAnnotation {
                        edge: GasChangeEdge::Trailing,
                        gas: new_gas,
                        setpoint_mbar: n.setpoint_mbar,
                    })
                }
                _ if gaschange_before => {
                    if wp.setpoint_mbar == 0 {
                        out.gas_changes
                            .extend(cur.gas_change_event(cur.last_time, wp.depth_mm, gas));
                    }
                    cur.last_print_setpoint = Some(wp.setpoint_mbar);
                    cur.last_print_gas = Some(gas);
                    gaschange_after = false;
                    Some(GasAnnotation {
                        edge: GasChangeEdge::Leading,
                        gas,
                        setpoint_mbar: wp.setpoint_mbar,
                    })
                }
                _ => None,
            };

            out.lines.push(PlanLine::Segment {
                leg: cur.leg(wp, gas, annotation),
            });
            cur.new_depth = wp.depth_mm;
            cur.last_time = wp.time_s;
        }

        if gaschange_after && options.verbatim {
            if let (Some(n), Some(new_gas)) = (next, next_gas) {
                if cur.last_setpoint.is_some() {
                    if n.setpoint_mbar == 0 && is_ascent {
                        out.gas_changes
                            .extend(cur.gas_change_event(wp.time_s, wp.depth_mm, new_gas));
                    }
                    out.lines.push(PlanLine::Switch {
                        gas_switch: GasSwitch {
                            time_s: wp.time_s,
                            depth_mm: wp.depth_mm,
                            gas: new_gas,
                            setpoint_mbar: n.setpoint_mbar,
                        },
                    });
                }
                cur.printed(new_gas, n.setpoint_mbar);
            }
        }

        cur.last_print_depth = cur.new_depth;
        cur.last_depth = wp.depth_mm;
        cur.last_setpoint = Some(wp.setpoint_mbar);
        cur.last_entered = wp.entered;
    }

    debug!(
        waypoints = waypoints.len(),
        lines = out.lines.len(),
        gas_changes = out.gas_changes.len(),
        "reduced plan"
    );
    out
}
