// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OsmoError {
    #[error("Invalid water composition: {0}")]
    InvalidComposition(String),

    #[error("Unknown membrane model: {0}")]
    UnknownMembrane(String),

    #[error("No feasible configuration: {0}")]
    NoFeasibleConfiguration(String),

    #[error("Chemistry engine failure: {0}")]
    ChemistryError(String),

    #[error("Feed pressure {computed_pa:.0} Pa exceeds membrane limit {limit_pa:.0} Pa")]
    PressureLimitExceeded { computed_pa: f64, limit_pa: f64 },

    #[error("Flux out of physical range: {0}")]
    FluxOutOfRange(String),

    #[error("Solver did not converge after {iterations} iterations: {message}")]
    ConvergenceFailure { iterations: usize, message: String },

    #[error("Cancelled: deadline exceeded")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OsmoResult<T> = Result<T, OsmoError>;
