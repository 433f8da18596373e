// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Scaling Evaluator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Concentrates a validated feed through the chemistry engine and scores
//! the resulting saturation indices against antiscalant-aware ceilings.

use osmo_types::config::{Mineral, SiThresholds};
use osmo_types::error::{OsmoError, OsmoResult};

use crate::composition::WaterComposition;
use crate::phreeqc::{ConcentrateRequest, ConcentrateReport, PhreeqcEngine};

/// Worst threshold violation in a report.
#[derive(Debug, Clone, Copy)]
pub struct SiViolation {
    pub mineral: Mineral,
    pub si: f64,
    pub limit: f64,
}

impl SiViolation {
    pub fn excess(&self) -> f64 {
        self.si - self.limit
    }
}

/// Chemistry-engine frontend for the design layers.
pub struct ScalingEvaluator<'e> {
    engine: &'e dyn PhreeqcEngine,
}

impl<'e> ScalingEvaluator<'e> {
    pub fn new(engine: &'e dyn PhreeqcEngine) -> Self {
        ScalingEvaluator { engine }
    }

    /// Concentrate the feed to the concentration factor implied by
    /// `recovery` and return the equilibrium report.
    pub fn concentrate_at_recovery(
        &self,
        feed: &WaterComposition,
        ph: f64,
        temperature_c: f64,
        recovery: f64,
        fixed_ph: bool,
    ) -> OsmoResult<ConcentrateReport> {
        if !(0.0..1.0).contains(&recovery) {
            return Err(OsmoError::ChemistryError(format!(
                "recovery {recovery} outside [0, 1)"
            )));
        }
        let request = ConcentrateRequest {
            composition: feed.clone(),
            temperature_c,
            ph,
            concentration_factor: 1.0 / (1.0 - recovery),
            fixed_ph,
        };
        self.engine.concentrate(&request)
    }

    /// Feed speciation without any water removal.
    pub fn speciate_feed(
        &self,
        feed: &WaterComposition,
        ph: f64,
        temperature_c: f64,
    ) -> OsmoResult<ConcentrateReport> {
        self.concentrate_at_recovery(feed, ph, temperature_c, 0.0, false)
    }

    /// The worst SI excess over the thresholds, if any mineral exceeds.
    pub fn worst_violation(
        report: &ConcentrateReport,
        thresholds: &SiThresholds,
    ) -> Option<SiViolation> {
        report
            .saturation_indices
            .iter()
            .map(|(mineral, si)| SiViolation {
                mineral: *mineral,
                si: *si,
                limit: thresholds.limit(*mineral),
            })
            .filter(|v| v.excess() > 0.0)
            .max_by(|a, b| a.excess().total_cmp(&b.excess()))
    }
}
