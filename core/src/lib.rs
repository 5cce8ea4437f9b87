pub mod config;
pub mod consumption;
pub mod error;
pub mod gas;
pub mod icd;
pub mod models;
pub mod oxygen;
pub mod plan_file;
pub mod reducer;
pub mod render;
pub mod report;
pub mod units;

uniffi::setup_scaffolding!();

pub use config::{DecoModel, PlanOptions};
pub use error::PlanError;
pub use gas::GasMix;
pub use models::{Cylinder, CylinderUse, DiveMode, DivePlan, GradientFactors, Waypoint};
pub use render::{Renderer, TextRenderer};
pub use report::{generate_report, PlanNotes, PlanReport};
pub use units::UnitPreferences;

/// Builds the structured notes for a computed plan.
#[uniffi::export]
pub fn generate_plan_notes(plan: DivePlan, options: PlanOptions) -> PlanNotes {
    generate_report(&plan, &options)
}

/// Renders notes as English plain text.
#[uniffi::export]
pub fn render_plan_notes(notes: PlanNotes, units: UnitPreferences) -> String {
    TextRenderer::new(units).render(&notes)
}

#[uniffi::export]
pub fn parse_gas_label(label: String) -> Result<GasMix, PlanError> {
    gas::parse_gas(&label)
}
