// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Osmo Sim
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Stage-by-stage solution-diffusion performance simulator with
//! ion-specific rejection, temperature correction, concentration
//! polarization and a PHREEQC scaling pass on the concentrate.

pub mod osmotic;
pub mod polarization;
pub mod pressure;
pub mod simulator;
pub mod stage;
pub mod transport;

pub use simulator::{simulate, PerformanceResult, SimulationInput, SystemPerformance};
