//! Plain-text rendering of [`PlanNotes`].
//!
//! The report is data; how it reads is up to the renderer. [`TextRenderer`]
//! writes English notes suitable for a dive log's notes field.

use std::fmt::Write;

use tracing::warn;

use crate::config::DecoModel;
use crate::consumption::{CylinderConsumption, GasWarning};
use crate::icd::IcdTable;
use crate::oxygen::{Po2Kind, Po2Warning};
use crate::reducer::{GasAnnotation, Leg, LegKind, PlanLine};
use crate::report::{
    DataWarning, DecoModelSummary, PlanNotes, PlanReport, SurfaceIntervalBanner,
};
use crate::units::{DisplayValue, UnitPreferences};

/// Placeholder after the runtime that callers replace with their runtime
/// variation figures.
pub const VARIATIONS_MARKER: &str = "VARIATIONS";

pub trait Renderer {
    fn render(&self, notes: &PlanNotes) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    pub units: UnitPreferences,
}

impl TextRenderer {
    pub fn new(units: UnitPreferences) -> Self {
        Self { units }
    }
}

impl Renderer for TextRenderer {
    fn render(&self, notes: &PlanNotes) -> String {
        let mut out = String::new();
        match notes {
            PlanNotes::NoPlan => {}
            PlanNotes::Aborted => {
                out.push_str("Warning: Decompression calculation aborted due to excessive time\n");
            }
            PlanNotes::Report { report } => {
                if let Err(e) = self.write_report(&mut out, report) {
                    warn!(error = %e, "plan notes rendering stopped early");
                }
            }
        }
        out
    }
}

/// `m:ss` from seconds.
fn min_sec(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn rounded_min(seconds: u32) -> u32 {
    (seconds + 30) / 60
}

fn setpoint_suffix(setpoint_mbar: u32) -> String {
    if setpoint_mbar == 0 {
        String::new()
    } else {
        format!(" (SP = {:.1}bar)", f64::from(setpoint_mbar) / 1000.0)
    }
}

fn segment_symbol(kind: LegKind) -> char {
    match kind {
        LegKind::Ascent => '\u{279A}',
        LegKind::Descent => '\u{2798}',
        LegKind::Stay => '\u{2799}',
        LegKind::DecoStop => '-',
    }
}

impl TextRenderer {
    fn depth(&self, mm: u32) -> DisplayValue {
        self.units.depth(i64::from(mm))
    }

    fn write_report(&self, out: &mut String, report: &PlanReport) -> std::fmt::Result {
        if report.show_disclaimer {
            let algorithm = match report.deco_model.model() {
                DecoModel::Vpmb => "VPM-B",
                DecoModel::Buhlmann | DecoModel::Recreational => "BUHLMANN",
            };
            writeln!(
                out,
                "DISCLAIMER / WARNING: THIS IS A NEW IMPLEMENTATION OF THE {algorithm} \
                 ALGORITHM AND A DIVE PLANNER IMPLEMENTATION BASED ON THAT WHICH HAS \
                 RECEIVED ONLY A LIMITED AMOUNT OF TESTING. WE STRONGLY RECOMMEND NOT TO \
                 PLAN DIVES SIMPLY BASED ON THE RESULTS GIVEN HERE.\n"
            )?;
        }

        let title = concat!(env!("CARGO_PKG_NAME"), " (", env!("CARGO_PKG_VERSION"), ") dive plan");
        match report.banner {
            SurfaceIntervalBanner::Overlapping => {
                writeln!(out, "{title} (overlapping dives detected)")?;
                return Ok(());
            }
            SurfaceIntervalBanner::LongLayoff => writeln!(out, "{title}")?,
            SurfaceIntervalBanner::Interval { interval_s } => {
                let minutes = interval_s / 60;
                writeln!(
                    out,
                    "{title} (surface interval {}:{:02})",
                    minutes / 60,
                    minutes % 60
                )?
            }
        }
        write!(out, "Runtime: {}min", report.runtime_min)?;
        if report.show_variations {
            write!(out, " {VARIATIONS_MARKER}")?;
        }
        writeln!(out, "\n")?;

        if report.verbatim {
            self.write_verbatim(out, &report.lines)?;
        } else {
            self.write_table(out, report)?;
        }
        writeln!(out)?;

        writeln!(out, "CNS: {}%", report.exposure.cns_percent.round() as i64)?;
        writeln!(out, "OTU: {}\n", report.exposure.otu.round() as i64)?;

        self.write_deco_model(out, &report.deco_model)?;
        writeln!(
            out,
            "ATM pressure: {}mbar ({})\n",
            report.atmosphere.surface_mbar,
            self.units
                .depth(i64::from(report.atmosphere.altitude_mm))
                .with_decimals(0)
        )?;

        match report.sac {
            Some(sac) => {
                let bottom = self.units.volume(f64::from(sac.bottom_ml_min));
                let deco = self.units.volume(f64::from(sac.deco_ml_min));
                // Whole litres per minute, two decimals for cuft.
                let decimals = if bottom.decimals == 1 { 0 } else { bottom.decimals };
                writeln!(
                    out,
                    "Gas consumption (based on SAC {:.*}|{:.*}{}/min):",
                    decimals, bottom.value, decimals, deco.value, bottom.unit
                )?;
            }
            None => writeln!(out, "Gas consumption (CCR legs excluded):")?,
        }
        for row in &report.consumption {
            self.write_consumption(out, row)?;
        }

        if let Some(icd) = &report.icd {
            writeln!(out)?;
            self.write_icd(out, icd)?;
        }

        if !report.po2_warnings.is_empty() {
            writeln!(out)?;
            for warning in &report.po2_warnings {
                self.write_po2(out, warning)?;
            }
        }

        if !report.data_warnings.is_empty() {
            writeln!(out)?;
            for warning in &report.data_warnings {
                match warning {
                    DataWarning::UnknownCylinder { time_s, cylinder } => writeln!(
                        out,
                        "Warning: waypoint at {} uses unknown cylinder {cylinder} and was skipped",
                        min_sec(*time_s)
                    )?,
                }
            }
        }
        Ok(())
    }

    fn write_verbatim(&self, out: &mut String, lines: &[PlanLine]) -> std::fmt::Result {
        for line in lines {
            match line {
                PlanLine::Segment { leg } => {
                    let verb = if leg.kind.is_transition() {
                        "Transition to"
                    } else {
                        "Stay at"
                    };
                    let preposition = if leg.kind.is_transition() { "in" } else { "for" };
                    writeln!(
                        out,
                        "{verb} {} {preposition} {} min - runtime {} on {}{}",
                        self.depth(leg.depth_mm),
                        min_sec(leg.duration_s),
                        min_sec(leg.runtime_s),
                        leg.gas,
                        setpoint_suffix(leg.setpoint_mbar)
                    )?;
                }
                PlanLine::Switch { gas_switch } => {
                    writeln!(
                        out,
                        "Switch gas to {}{}",
                        gas_switch.gas,
                        setpoint_suffix(gas_switch.setpoint_mbar)
                    )?;
                }
            }
        }
        Ok(())
    }

    fn write_table(&self, out: &mut String, report: &PlanReport) -> std::fmt::Result {
        write!(out, "   {:>6}", "depth")?;
        if report.display_duration {
            write!(out, "  {:>8}", "duration")?;
        }
        if report.display_runtime {
            write!(out, "  {:>7}", "runtime")?;
        }
        writeln!(out, "  gas")?;

        for leg in report.lines.iter().filter_map(PlanLine::as_leg) {
            self.write_row(out, report, leg)?;
        }
        Ok(())
    }

    fn write_row(&self, out: &mut String, report: &PlanReport, leg: &Leg) -> std::fmt::Result {
        let depth = self.depth(leg.depth_mm).with_decimals(0).to_string();
        write!(out, " {} {:>6}", segment_symbol(leg.kind), depth)?;
        if report.display_duration {
            write!(out, "  {:>5}min", rounded_min(leg.duration_s))?;
        }
        if report.display_runtime {
            write!(out, "  {:>4}min", rounded_min(leg.runtime_s))?;
        }
        match leg.gas_change {
            Some(GasAnnotation {
                gas, setpoint_mbar, ..
            }) => writeln!(out, "  {gas}{}", setpoint_suffix(setpoint_mbar)),
            None => writeln!(out),
        }
    }

    fn write_deco_model(&self, out: &mut String, summary: &DecoModelSummary) -> std::fmt::Result {
        match summary {
            DecoModelSummary::Buhlmann { gf } => writeln!(
                out,
                "Deco model: Bühlmann ZHL-16C with GFLow = {}% and GFHigh = {}%",
                gf.low, gf.high
            ),
            DecoModelSummary::Vpmb {
                conservatism,
                effective_gf,
            } => {
                if *conservatism == 0 {
                    write!(out, "Deco model: VPM-B at nominal conservatism")?;
                } else {
                    write!(out, "Deco model: VPM-B at +{conservatism} conservatism")?;
                }
                if let Some(gf) = effective_gf {
                    write!(out, ", effective GF={}/{}", gf.low, gf.high)?;
                }
                writeln!(out)
            }
            DecoModelSummary::Recreational { gf } => writeln!(
                out,
                "Deco model: Recreational mode based on Bühlmann ZHL-16B with GFLow = {}% and GFHigh = {}%",
                gf.low, gf.high
            ),
        }
    }

    fn write_consumption(&self, out: &mut String, row: &CylinderConsumption) -> std::fmt::Result {
        let volume = self.units.volume(f64::from(row.gas_used_ml)).with_decimals(0);
        let deco_volume = self
            .units
            .volume(f64::from(row.deco_gas_used_ml))
            .with_decimals(0);
        let used_any = volume.value.round() > 0.0;

        match row.pressure {
            Some(pressure) => {
                let used = self.units.pressure(f64::from(pressure.used_mbar));
                let ascent = self.units.pressure(f64::from(pressure.ascent_mbar));
                write!(out, "{volume}/{used} of {}", row.gas)?;
                if used_any {
                    write!(out, " ({deco_volume}/{ascent} in planned ascent)")?;
                }
            }
            None => {
                write!(out, "{volume} of {}", row.gas)?;
                if used_any {
                    write!(out, " ({deco_volume} during planned ascent)")?;
                }
            }
        }
        writeln!(out)?;

        if let Some(warning) = row.warning {
            let text = match warning {
                GasWarning::MoreGasThanAvailable => {
                    "this is more gas than available in the specified cylinder!"
                }
                GasWarning::NoReserveForGasSharing => {
                    "not enough reserve for gas sharing on ascent!"
                }
                GasWarning::MinimumGasExceedsStartPressure { .. } => {
                    "required minimum gas for ascent already exceeding start pressure of cylinder!"
                }
            };
            writeln!(out, "  - Warning: {text}")?;
        }
        if let Some(mingas) = row.minimum_gas {
            writeln!(
                out,
                "  - Minimum gas (based on {:.1}xSAC/+{}min@{}): {}/{}/Δ:{:+.0}{}",
                f64::from(mingas.sac_factor_percent) / 100.0,
                rounded_min(mingas.problem_solving_time_s),
                self.depth(mingas.depth_mm).with_decimals(0),
                self.units.volume(f64::from(mingas.volume_ml)).with_decimals(0),
                self.units.pressure(f64::from(mingas.required_mbar)),
                self.units.pressure(f64::from(mingas.margin_mbar)).value,
                self.units.pressure(0.0).unit
            )?;
        }
        Ok(())
    }

    fn write_icd(&self, out: &mut String, icd: &IcdTable) -> std::fmt::Result {
        writeln!(out, "Isobaric counterdiffusion information:")?;
        writeln!(
            out,
            "{:>7}  {:<16} {:>9} {:>9} {:>9}",
            "runtime", "gaschange", "ΔHe", "ΔN₂", "max ΔN₂"
        )?;
        for entry in &icd.entries {
            let change = format!("{}\u{2799}{}", entry.from, entry.to);
            writeln!(
                out,
                "{:>4}min  {:<16} {:>+8.2}% {:>+8.2}% {:>+8.2}%{}",
                rounded_min(entry.time_s),
                change,
                entry.delta_he_percent(),
                entry.delta_n2_percent(),
                entry.max_delta_n2_percent(),
                if entry.violation { "  !" } else { "" }
            )?;
            writeln!(
                out,
                "{:>7}  {:<16} {:>+6.2}bar {:>+6.2}bar {:>+6.2}bar",
                "", "", entry.delta_he_bar, entry.delta_n2_bar, entry.max_delta_n2_bar
            )?;
        }
        if icd.warning {
            writeln!(out, "Warning: Isobaric counterdiffusion conditions exceeded")?;
        }
        Ok(())
    }

    fn write_po2(&self, out: &mut String, warning: &Po2Warning) -> std::fmt::Result {
        let level = match warning.kind {
            Po2Kind::High => "high",
            Po2Kind::Low => "low",
        };
        writeln!(
            out,
            "Warning: {level} pO₂ value {:.2} at {} with gas {} at depth {}",
            f64::from(warning.po2_mbar) / 1000.0,
            min_sec(warning.time_s),
            warning.gas,
            self.depth(warning.depth_mm)
        )
    }
}
