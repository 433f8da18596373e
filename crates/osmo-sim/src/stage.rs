// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Stage Performance
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One stage of the solution-diffusion sweep: osmotic state, pressure
//! assembly, polarization, per-ion split.

use serde::{Deserialize, Serialize};

use osmo_chem::composition::WaterComposition;
use osmo_types::config::Mineral;
use osmo_types::constants::{lmh_to_m_s, PA_PER_BAR};
use osmo_types::error::OsmoResult;
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::StageDesign;

use crate::osmotic::{a_w_at, osmotic_pressure_pa};
use crate::polarization::{mass_transfer_coefficient, polarization_factor};
use crate::pressure::required_feed_pressure;
use crate::transport::split_stage;

/// Scaling snapshot of a stage concentrate (engine pass).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageScaling {
    pub ph: f64,
    pub saturation_indices: Vec<(Mineral, f64)>,
}

/// Operating record of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagePerformance {
    pub stage_number: usize,
    pub feed_flow_m3h: f64,
    pub permeate_flow_m3h: f64,
    pub concentrate_flow_m3h: f64,
    pub stage_recovery: f64,

    pub feed_tds_mg_l: f64,
    pub permeate_tds_mg_l: f64,
    pub concentrate_tds_mg_l: f64,
    pub feed_composition: WaterComposition,
    pub permeate_composition: WaterComposition,
    pub concentrate_composition: WaterComposition,

    pub feed_pressure_bar: f64,
    pub osmotic_pressure_bar: f64,
    pub net_driving_pressure_bar: f64,
    pub channel_drop_bar: f64,
    pub polarization_factor: f64,
    pub observed_flux_lmh: f64,

    /// Filled by the system sweep (first stage full lift, boosts after).
    pub pump_power_kw: f64,
    pub ion_rejection: Vec<(String, f64)>,
    /// Filled after convergence by the chemistry pass.
    pub scaling: Option<StageScaling>,
}

/// Evaluate one stage on its feed composition. Pump power and the
/// scaling pass are layered on by the simulator.
pub fn compute_stage(
    design: &StageDesign,
    feed: &WaterComposition,
    membrane: &MembraneSpec,
    temperature_c: f64,
) -> OsmoResult<StagePerformance> {
    let flux_m_s = lmh_to_m_s(design.flux_lmh);
    let avg_flow_per_vessel =
        (design.feed_flow_m3h + design.concentrate_flow_m3h) / 2.0 / design.n_vessels as f64;

    let k_mt = mass_transfer_coefficient(membrane, feed, avg_flow_per_vessel, temperature_c);
    let beta = polarization_factor(flux_m_s, k_mt);

    let pi_bulk = osmotic_pressure_pa(feed, temperature_c);
    let pi_wall = pi_bulk * beta;
    let a_w = a_w_at(membrane.a_w_m_s_pa, temperature_c);

    let pressure = required_feed_pressure(design, membrane, pi_wall, flux_m_s, a_w)?;

    let split = split_stage(
        feed,
        design.stage_recovery,
        membrane,
        flux_m_s,
        beta,
        temperature_c,
    );

    Ok(StagePerformance {
        stage_number: design.stage_number,
        feed_flow_m3h: design.feed_flow_m3h,
        permeate_flow_m3h: design.permeate_flow_m3h,
        concentrate_flow_m3h: design.concentrate_flow_m3h,
        stage_recovery: design.stage_recovery,
        feed_tds_mg_l: feed.tds_mg_l(),
        permeate_tds_mg_l: split.permeate.tds_mg_l(),
        concentrate_tds_mg_l: split.concentrate.tds_mg_l(),
        feed_composition: feed.clone(),
        permeate_composition: split.permeate,
        concentrate_composition: split.concentrate,
        feed_pressure_bar: pressure.feed_pressure_pa / PA_PER_BAR,
        osmotic_pressure_bar: pi_bulk / PA_PER_BAR,
        net_driving_pressure_bar: pressure.net_driving_pa / PA_PER_BAR,
        channel_drop_bar: pressure.channel_drop_pa / PA_PER_BAR,
        polarization_factor: beta,
        observed_flux_lmh: design.flux_lmh,
        pump_power_kw: 0.0,
        ion_rejection: split.rejection,
        scaling: None,
    })
}
