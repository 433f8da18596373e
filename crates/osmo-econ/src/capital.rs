// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Capital Cost
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Direct equipment costs plus the indirect multiplier.
//!
//! Pumps are priced piecewise: low-pressure service per L/s of flow,
//! high-pressure service per watt of mechanical work. The energy
//! recovery device switches class on brine flow (isobaric exchanger for
//! large brine streams, turbocharger below).

use log::debug;
use serde::{Deserialize, Serialize};

use osmo_sim::PerformanceResult;
use osmo_types::config::EconomicParams;
use osmo_types::constants::{m3h_to_m3s, PA_PER_BAR};
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::TrainConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalBreakdown {
    /// Per-stage pump capital, stage order.
    pub pumps_usd: Vec<f64>,
    pub membranes_usd: f64,
    pub erd_usd: f64,
    pub cartridge_filters_usd: f64,
    pub cip_system_usd: f64,
    pub direct_usd: f64,
    /// Direct × indirect factor.
    pub total_usd: f64,
}

fn pump_cost_usd(flow_m3h: f64, lift_bar: f64, params: &EconomicParams) -> f64 {
    if lift_bar < params.high_pressure_threshold_bar {
        let flow_lps = flow_m3h / 3.6;
        params.low_pressure_pump_cost_usd_lps * flow_lps
    } else {
        let mechanical_w = m3h_to_m3s(flow_m3h) * lift_bar * PA_PER_BAR;
        params.high_pressure_pump_cost_usd_w * mechanical_w
    }
}

/// Assemble the capital breakdown for a simulated train.
pub fn direct_and_indirect(
    config: &TrainConfig,
    performance: &PerformanceResult,
    membrane: &MembraneSpec,
    params: &EconomicParams,
) -> CapitalBreakdown {
    let pumps_usd: Vec<f64> = performance
        .stages
        .iter()
        .map(|s| pump_cost_usd(s.feed_flow_m3h, s.feed_pressure_bar, params))
        .collect();

    let membranes_usd =
        config.total_membrane_area_m2() * params.membrane_cost_usd_m2(membrane.grade);

    let last = performance.stages.last();
    let brine_flow = performance.system.disposal_flow_m3h;
    let brine_pressure_bar = last.map(|s| s.feed_pressure_bar).unwrap_or(0.0);
    let erd_usd = if params.auto_include_erd
        && brine_pressure_bar >= params.erd_pressure_threshold_bar
    {
        let unit_cost = if brine_flow >= params.erd_isobaric_min_brine_m3h {
            params.pressure_exchanger_cost_usd_m3h
        } else {
            params.turbocharger_cost_usd_m3h
        };
        unit_cost * brine_flow
    } else {
        0.0
    };

    let cartridge_filters_usd = if params.include_cartridge_filters {
        params.cartridge_filter_cost_usd_m3h * config.system_feed_flow_m3h
    } else {
        0.0
    };
    let cip_system_usd = if params.include_cip_system {
        params.cip_capital_cost_usd_m2 * config.total_membrane_area_m2()
    } else {
        0.0
    };

    let direct_usd = pumps_usd.iter().sum::<f64>()
        + membranes_usd
        + erd_usd
        + cartridge_filters_usd
        + cip_system_usd;
    let total_usd = direct_usd * params.indirect_cost_factor;

    debug!(
        "capital: pumps {:.0}, membranes {membranes_usd:.0}, ERD {erd_usd:.0}, total {total_usd:.0}",
        pumps_usd.iter().sum::<f64>()
    );

    CapitalBreakdown {
        pumps_usd,
        membranes_usd,
        erd_usd,
        cartridge_filters_usd,
        cip_system_usd,
        direct_usd,
        total_usd,
    }
}
