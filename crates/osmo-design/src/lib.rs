// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Osmo Design
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Vessel-array configuration optimizer: constrained enumeration over
//! stage counts and vessel splits, flux trimming, concentrate recycle.

pub mod optimizer;
pub mod recycle;
pub mod search;
pub mod stage;
pub mod trim;

pub use optimizer::{optimize, FeedChemistry, OptimizeRequest};
