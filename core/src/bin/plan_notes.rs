//! plan-notes: print the notes for a computed dive plan.
//!
//! Reads a JSON plan file, applies the planner options embedded in it (or
//! `DIVEPLAN_*` environment variables when it has none) and writes the
//! rendered notes, or the structured report with `--json`, to stdout.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueHint};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use diveplan_compute::plan_file::PlanFile;
use diveplan_compute::{
    generate_report, PlanError, PlanOptions, Renderer, TextRenderer, UnitPreferences,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dive plan notes and gas consumption report", long_about = None)]
struct Cli {
    /// JSON plan file
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Spell out every waypoint and gas switch
    #[arg(long, action = ArgAction::SetTrue)]
    verbatim: bool,

    /// Report ascents between stops as their own legs
    #[arg(long, action = ArgAction::SetTrue)]
    transitions: bool,

    /// Feet, cubic feet and psi
    #[arg(long, action = ArgAction::SetTrue)]
    imperial: bool,

    /// Leave out the disclaimer
    #[arg(long, action = ArgAction::SetTrue)]
    no_disclaimer: bool,

    /// Print the structured report as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "plan-notes failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PlanError> {
    let file = PlanFile::load(&cli.file)?;
    info!(
        path = %cli.file.display(),
        waypoints = file.plan.waypoints.len(),
        cylinders = file.plan.cylinders.len(),
        "loaded plan"
    );

    let mut options = match file.options {
        Some(options) => options,
        None => PlanOptions::from_env()?,
    };
    options.verbatim |= cli.verbatim;
    options.display_transitions |= cli.transitions;
    if cli.no_disclaimer {
        options.show_disclaimer = false;
    }
    options.validate()?;

    let notes = generate_report(&file.plan, &options);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else {
        let units = if cli.imperial {
            UnitPreferences::IMPERIAL
        } else {
            UnitPreferences::METRIC
        };
        print!("{}", TextRenderer::new(units).render(&notes));
    }
    Ok(())
}
