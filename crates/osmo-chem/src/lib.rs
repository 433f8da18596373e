// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Osmo Chem
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Water chemistry: composition validation, PHREEQC-backed concentration
//! and saturation-index evaluation, sustainable recovery, pH optimization.

pub mod composition;
pub mod ph;
pub mod phreeqc;
pub mod scaling;
pub mod sustainable;
