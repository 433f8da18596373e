// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Array State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Vessel-array design records produced by the configuration optimizer and
//! consumed read-only by the simulator and the economic model.
//!
//! Flow bookkeeping rule: `system_feed_flow_m3h` is ALWAYS the external
//! fresh feed. Under recycle the stage-1 feed is the blended (larger)
//! stream; system recovery, specific energy and disposal TDS are computed
//! on the system basis, never on stage-1 state.

use serde::{Deserialize, Serialize};

/// One stage of a vessel array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDesign {
    /// 1-based stage number.
    pub stage_number: usize,
    pub n_vessels: usize,
    pub elements_per_vessel: usize,
    /// vessels × elements × element area.
    pub membrane_area_m2: f64,
    pub flux_target_lmh: f64,
    /// Achieved design flux.
    pub flux_lmh: f64,
    pub feed_flow_m3h: f64,
    pub permeate_flow_m3h: f64,
    pub concentrate_flow_m3h: f64,
    /// permeate / feed for this stage.
    pub stage_recovery: f64,
    pub concentrate_per_vessel_m3h: f64,
    pub min_concentrate_per_vessel_m3h: f64,
}

impl StageDesign {
    pub fn flux_ratio(&self) -> f64 {
        self.flux_lmh / self.flux_target_lmh
    }

    pub fn n_elements(&self) -> usize {
        self.n_vessels * self.elements_per_vessel
    }

    /// Per-stage mass closure: feed = permeate + concentrate within 0.1%.
    pub fn mass_balance_residual(&self) -> f64 {
        (self.feed_flow_m3h - self.permeate_flow_m3h - self.concentrate_flow_m3h).abs()
            / self.feed_flow_m3h
    }
}

/// Concentrate-recycle loop bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecycleLoop {
    /// Flow routed from the final-stage concentrate back to the feed mixer
    /// (m³/h).
    pub recycle_flow_m3h: f64,
    /// Fraction of final-stage concentrate diverted back.
    pub recycle_split_ratio: f64,
    /// Concentrate leaving the plant (m³/h).
    pub disposal_flow_m3h: f64,
    /// TDS of the disposal stream, i.e. final-stage concentrate TDS before
    /// the split (mg/L).
    pub disposal_tds_mg_l: f64,
    /// Blended stage-1 feed flow = fresh + recycle (m³/h).
    pub blended_feed_flow_m3h: f64,
    /// Blended stage-1 feed TDS (mg/L).
    pub blended_feed_tds_mg_l: f64,
}

/// Non-fatal findings attached to a viable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DesignWarning {
    /// Achieved recovery exceeds the scaling-limited ceiling; adjust pH or
    /// lower the target.
    SustainableRecoveryExceeded { achieved: f64, sustainable_r_max: f64 },
    /// A single stage calls for an unusually large vessel bank.
    VesselCountExplosion { stage: usize, n_vessels: usize },
    /// Flux was relaxed below normal tolerance to reach the recovery
    /// target.
    FluxRelaxedBelowTolerance { stage: usize, flux_ratio: f64 },
    /// Caller pinned stage flux targets and supplied feed chemistry that
    /// caps recovery below the design target; configurations are returned
    /// unchanged.
    FluxTargetsConflictWithChemistry,
}

/// A complete viable vessel-array configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub membrane_model: String,
    /// External fresh feed (m³/h), never the blended stage-1 feed.
    pub system_feed_flow_m3h: f64,
    pub feed_tds_mg_l: f64,
    pub target_recovery: f64,
    /// External permeate / external feed.
    pub system_recovery: f64,
    pub total_permeate_flow_m3h: f64,
    pub stages: Vec<StageDesign>,
    pub recycle: Option<RecycleLoop>,
    /// Scaling-limited recovery ceiling, when feed chemistry was supplied.
    pub sustainable_r_max: Option<f64>,
    pub meets_target: bool,
    pub warnings: Vec<DesignWarning>,
}

impl TrainConfig {
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    /// Vessel counts joined stage-wise, e.g. `"22:11"`.
    pub fn array_notation(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.n_vessels.to_string())
            .collect::<Vec<_>>()
            .join(":")
    }

    pub fn total_vessels(&self) -> usize {
        self.stages.iter().map(|s| s.n_vessels).sum()
    }

    pub fn total_membrane_area_m2(&self) -> f64 {
        self.stages.iter().map(|s| s.membrane_area_m2).sum()
    }

    /// Flow entering stage 1: blended under recycle, fresh otherwise.
    pub fn stage_1_feed_flow_m3h(&self) -> f64 {
        match &self.recycle {
            Some(r) => r.blended_feed_flow_m3h,
            None => self.system_feed_flow_m3h,
        }
    }

    /// Concentrate flow leaving the plant.
    pub fn disposal_flow_m3h(&self) -> f64 {
        match &self.recycle {
            Some(r) => r.disposal_flow_m3h,
            None => self
                .stages
                .last()
                .map(|s| s.concentrate_flow_m3h)
                .unwrap_or(0.0),
        }
    }

    /// Deviation of achieved from target recovery.
    pub fn recovery_error(&self) -> f64 {
        (self.system_recovery - self.target_recovery).abs()
    }

    /// Largest per-stage mass-balance residual plus the system-level
    /// closure residual. Used by tests and by the simulator as a guard.
    pub fn mass_balance_residual(&self) -> f64 {
        let stage_res = self
            .stages
            .iter()
            .map(|s| s.mass_balance_residual())
            .fold(0.0_f64, f64::max);
        let system_res = (self.system_feed_flow_m3h
            - self.total_permeate_flow_m3h
            - self.disposal_flow_m3h())
        .abs()
            / self.system_feed_flow_m3h;
        stage_res.max(system_res)
    }
}
