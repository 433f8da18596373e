// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Stage Evaluation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Single-stage hydraulic evaluation: a vessel count at a flux either
//! satisfies the permeate/concentrate constraints or it does not.

use osmo_types::config::ArrayDesignSettings;
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::StageDesign;

/// Flux probe points scanned across the tolerance band, high to low
/// (higher flux first maximizes stage recovery).
pub const FLUX_PROBES: usize = 10;

/// Per-stage constraint bundle, fixed for one optimizer run.
#[derive(Debug, Clone, Copy)]
pub struct StageContext {
    /// Membrane area of one vessel (m²).
    pub vessel_area_m2: f64,
    pub flux_target_lmh: f64,
    /// Normal band: (1−τ)·J* .. (1+τ)·J*.
    pub flux_lo_lmh: f64,
    pub flux_hi_lmh: f64,
    /// Emergency floor, used only when relaxation is the sole way to hit
    /// the recovery target.
    pub flux_floor_lmh: f64,
    /// Fouling minimum on concentrate per vessel (m³/h).
    pub min_concentrate_m3h: f64,
}

impl StageContext {
    pub fn from_settings(
        settings: &ArrayDesignSettings,
        membrane: &MembraneSpec,
        stage_index: usize,
    ) -> Self {
        let target = settings.flux_target(stage_index);
        StageContext {
            vessel_area_m2: membrane.vessel_area_m2(settings.elements_per_vessel),
            flux_target_lmh: target,
            flux_lo_lmh: (1.0 - settings.flux_tolerance) * target,
            flux_hi_lmh: (1.0 + settings.flux_tolerance) * target,
            flux_floor_lmh: settings.flux_floor_fraction * target,
            min_concentrate_m3h: settings.min_concentrate(stage_index),
        }
    }

    /// Upper bound on vessels from the fouling constraint alone.
    pub fn max_vessels(&self, feed_m3h: f64) -> usize {
        (feed_m3h / self.min_concentrate_m3h) as usize
    }
}

/// One admissible (vessel count, flux) operating point.
#[derive(Debug, Clone, Copy)]
pub struct StageCandidate {
    pub n_vessels: usize,
    pub flux_lmh: f64,
    pub permeate_m3h: f64,
    pub concentrate_m3h: f64,
    pub recovery: f64,
    pub concentrate_per_vessel_m3h: f64,
}

/// Evaluate a vessel count at a specific flux. `None` when the point
/// violates the permeate bound or the fouling minimum.
pub fn evaluate_at_flux(
    n_vessels: usize,
    feed_m3h: f64,
    flux_lmh: f64,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    if n_vessels == 0 {
        return None;
    }
    let permeate = flux_lmh * n_vessels as f64 * ctx.vessel_area_m2 / 1000.0;
    if permeate >= feed_m3h {
        return None;
    }
    let concentrate = feed_m3h - permeate;
    let per_vessel = concentrate / n_vessels as f64;
    if per_vessel < ctx.min_concentrate_m3h {
        return None;
    }
    Some(StageCandidate {
        n_vessels,
        flux_lmh,
        permeate_m3h: permeate,
        concentrate_m3h: concentrate,
        recovery: permeate / feed_m3h,
        concentrate_per_vessel_m3h: per_vessel,
    })
}

/// Best admissible point for a vessel count: scan the flux band high to
/// low and keep the highest recovery.
pub fn best_at_vessels(
    n_vessels: usize,
    feed_m3h: f64,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    let mut best: Option<StageCandidate> = None;
    for probe in 0..FLUX_PROBES {
        let t = probe as f64 / (FLUX_PROBES - 1) as f64;
        let flux = ctx.flux_hi_lmh - t * (ctx.flux_hi_lmh - ctx.flux_lo_lmh);
        if let Some(candidate) = evaluate_at_flux(n_vessels, feed_m3h, flux, ctx) {
            if best.map_or(true, |b| candidate.recovery > b.recovery) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// A stage candidate bound to its feed and constraints; the working
/// record mutated by the flux trim pass.
#[derive(Debug, Clone, Copy)]
pub struct StageWorking {
    pub ctx: StageContext,
    pub feed_m3h: f64,
    pub candidate: StageCandidate,
}

impl StageWorking {
    pub fn flux_ratio(&self) -> f64 {
        self.candidate.flux_lmh / self.ctx.flux_target_lmh
    }

    /// Freeze into the shared design record.
    pub fn to_design(&self, stage_number: usize, elements_per_vessel: usize) -> StageDesign {
        StageDesign {
            stage_number,
            n_vessels: self.candidate.n_vessels,
            elements_per_vessel,
            membrane_area_m2: self.candidate.n_vessels as f64 * self.ctx.vessel_area_m2,
            flux_target_lmh: self.ctx.flux_target_lmh,
            flux_lmh: self.candidate.flux_lmh,
            feed_flow_m3h: self.feed_m3h,
            permeate_flow_m3h: self.candidate.permeate_m3h,
            concentrate_flow_m3h: self.candidate.concentrate_m3h,
            stage_recovery: self.candidate.recovery,
            concentrate_per_vessel_m3h: self.candidate.concentrate_per_vessel_m3h,
            min_concentrate_per_vessel_m3h: self.ctx.min_concentrate_m3h,
        }
    }
}
