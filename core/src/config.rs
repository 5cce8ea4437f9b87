//! Planner preferences that shape the notes.
//!
//! [`PlanOptions`] carries everything the report generator reads: display
//! switches, the deco model description, and the gas reserve parameters.
//! It can be built from defaults, deserialized from a plan file, or
//! overlaid from `DIVEPLAN_*` environment variables (or a `.env` file via
//! `dotenvy`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Decompression model the schedule was computed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum DecoModel {
    #[default]
    Buhlmann,
    Vpmb,
    Recreational,
}

impl DecoModel {
    pub fn label(&self) -> &'static str {
        match self {
            DecoModel::Buhlmann => "BUHLMANN",
            DecoModel::Vpmb => "VPM-B",
            DecoModel::Recreational => "RECREATIONAL",
        }
    }
}

impl FromStr for DecoModel {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buhlmann" | "buehlmann" | "zhl16c" => Ok(DecoModel::Buhlmann),
            "vpmb" | "vpm-b" => Ok(DecoModel::Vpmb),
            "recreational" => Ok(DecoModel::Recreational),
            other => Err(PlanError::Config(format!("unknown deco model: {other}"))),
        }
    }
}

/// Preferences for one report generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct PlanOptions {
    /// Spell out every waypoint and gas switch as a sentence.
    pub verbatim: bool,
    /// Report ascents between stops as their own legs.
    pub display_transitions: bool,
    pub display_duration: bool,
    pub display_runtime: bool,
    /// Ask the renderer to leave room for runtime variations.
    pub display_variations: bool,
    pub show_disclaimer: bool,
    pub deco_model: DecoModel,
    /// Gradient factors (%) for the Bühlmann-based models.
    pub gf_low: u32,
    pub gf_high: u32,
    pub vpmb_conservatism: u32,
    /// Stress multiplier on the SAC for the minimum gas reserve (%).
    pub sac_factor_percent: u32,
    /// Time at the bottom to sort out a problem before ascending.
    pub problem_solving_time_s: u32,
    pub bottom_sac_ml_min: u32,
    pub deco_sac_ml_min: u32,
    /// pO2 ceiling on entered (bottom) waypoints.
    pub bottom_po2_mbar: u32,
    /// pO2 ceiling on computed (deco) waypoints.
    pub deco_po2_mbar: u32,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            verbatim: false,
            display_transitions: false,
            display_duration: true,
            display_runtime: true,
            display_variations: false,
            show_disclaimer: true,
            deco_model: DecoModel::Buhlmann,
            gf_low: 30,
            gf_high: 75,
            vpmb_conservatism: 3,
            sac_factor_percent: 400,
            problem_solving_time_s: 240,
            bottom_sac_ml_min: 20_000,
            deco_sac_ml_min: 17_000,
            bottom_po2_mbar: 1400,
            deco_po2_mbar: 1600,
        }
    }
}

impl PlanOptions {
    /// Loads options from `DIVEPLAN_*` environment variables.
    ///
    /// Unset or unparsable numeric and boolean variables keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Config`] if `DIVEPLAN_DECO_MODEL` names an
    /// unknown model or the resulting options fail [`PlanOptions::validate`].
    pub fn from_env() -> Result<Self, PlanError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let deco_model = match std::env::var("DIVEPLAN_DECO_MODEL") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.deco_model,
        };

        let options = Self {
            verbatim: parse_env_bool("DIVEPLAN_VERBATIM", defaults.verbatim),
            display_transitions: parse_env_bool(
                "DIVEPLAN_DISPLAY_TRANSITIONS",
                defaults.display_transitions,
            ),
            display_duration: parse_env_bool("DIVEPLAN_DISPLAY_DURATION", defaults.display_duration),
            display_runtime: parse_env_bool("DIVEPLAN_DISPLAY_RUNTIME", defaults.display_runtime),
            display_variations: parse_env_bool(
                "DIVEPLAN_DISPLAY_VARIATIONS",
                defaults.display_variations,
            ),
            show_disclaimer: parse_env_bool("DIVEPLAN_SHOW_DISCLAIMER", defaults.show_disclaimer),
            deco_model,
            gf_low: parse_env("DIVEPLAN_GF_LOW", defaults.gf_low),
            gf_high: parse_env("DIVEPLAN_GF_HIGH", defaults.gf_high),
            vpmb_conservatism: parse_env("DIVEPLAN_VPMB_CONSERVATISM", defaults.vpmb_conservatism),
            sac_factor_percent: parse_env("DIVEPLAN_SAC_FACTOR", defaults.sac_factor_percent),
            problem_solving_time_s: parse_env(
                "DIVEPLAN_PROBLEM_SOLVING_TIME_S",
                defaults.problem_solving_time_s,
            ),
            bottom_sac_ml_min: parse_env("DIVEPLAN_BOTTOM_SAC_ML_MIN", defaults.bottom_sac_ml_min),
            deco_sac_ml_min: parse_env("DIVEPLAN_DECO_SAC_ML_MIN", defaults.deco_sac_ml_min),
            bottom_po2_mbar: parse_env("DIVEPLAN_BOTTOM_PO2_MBAR", defaults.bottom_po2_mbar),
            deco_po2_mbar: parse_env("DIVEPLAN_DECO_PO2_MBAR", defaults.deco_po2_mbar),
        };
        options.validate()?;
        Ok(options)
    }

    /// Rejects settings no planner would produce.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.gf_low == 0 || self.gf_high == 0 {
            return Err(PlanError::Config("gradient factors must be positive".into()));
        }
        if self.gf_low > self.gf_high {
            return Err(PlanError::Config(format!(
                "gf_low ({}) must not exceed gf_high ({})",
                self.gf_low, self.gf_high
            )));
        }
        if self.sac_factor_percent == 0 {
            return Err(PlanError::Config("sac_factor_percent must be positive".into()));
        }
        if self.bottom_po2_mbar == 0 || self.deco_po2_mbar == 0 {
            return Err(PlanError::Config("pO2 limits must be positive".into()));
        }
        Ok(())
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
