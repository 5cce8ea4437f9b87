use thiserror::Error;

/// Error type for plan input, gas labels and configuration.
///
/// Report generation itself never fails; these errors come from the edges
/// that turn user input into a [`DivePlan`](crate::models::DivePlan) and
/// [`PlanOptions`](crate::config::PlanOptions).
#[derive(Error, Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum PlanError {
    #[error("cannot parse gas '{input}': {message}")]
    GasParse { input: String, message: String },

    #[error("invalid gas mix: O2 {o2_permille}‰, He {he_permille}‰")]
    InvalidGas { o2_permille: u32, he_permille: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("plan file error: {0}")]
    Json(#[from] serde_json::Error),
}
