// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — PHREEQC Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Text-level coupling to the PHREEQC aqueous-geochemistry engine.
//!
//! `deck` renders input decks, `output` parses SELECTED_OUTPUT tables,
//! `engine` defines the driver trait and the subprocess implementation,
//! `mock` is the deterministic in-process stand-in used by test suites.
//!
//! PHREEQC is the sole chemistry engine: a failed run is an error, never
//! an invitation to approximate.

pub mod deck;
pub mod engine;
pub mod mock;
pub mod output;

pub use engine::{ConcentrateRequest, ConcentrateReport, PhreeqcEngine, PhreeqcProcess};
pub use mock::MockPhreeqc;
