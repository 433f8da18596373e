// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Levelized Cost of Water
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! LCOW = (CRF · capital + annual opex) / annual production, reported
//! with each contribution separately.

use serde::{Deserialize, Serialize};

use osmo_types::config::EconomicParams;
use osmo_types::error::{OsmoError, OsmoResult};

use crate::capital::CapitalBreakdown;
use crate::operating::OperatingBreakdown;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcowBreakdown {
    pub capital_usd_m3: f64,
    pub electricity_usd_m3: f64,
    pub membrane_usd_m3: f64,
    pub chemicals_usd_m3: f64,
    pub fixed_om_usd_m3: f64,
    pub total_usd_m3: f64,
    pub capital_recovery_factor: f64,
}

/// Capital-recovery factor i(1+i)^N / ((1+i)^N − 1).
pub fn capital_recovery_factor(wacc: f64, lifetime_years: f64) -> OsmoResult<f64> {
    if wacc <= 0.0 || lifetime_years <= 0.0 {
        return Err(OsmoError::ConfigError(format!(
            "CRF undefined for WACC {wacc}, lifetime {lifetime_years}"
        )));
    }
    let growth = (1.0 + wacc).powf(lifetime_years);
    Ok(wacc * growth / (growth - 1.0))
}

/// Assemble the per-m³ contributions.
pub fn breakdown(
    capital: &CapitalBreakdown,
    operating: &OperatingBreakdown,
    annual_production_m3: f64,
    params: &EconomicParams,
) -> OsmoResult<LcowBreakdown> {
    if annual_production_m3 <= 0.0 {
        return Err(OsmoError::ConfigError(
            "annual production must be positive for LCOW".into(),
        ));
    }
    let crf = capital_recovery_factor(params.wacc, params.plant_lifetime_years)?;

    let capital_usd_m3 = crf * capital.total_usd / annual_production_m3;
    let electricity_usd_m3 = operating.electricity_usd_yr / annual_production_m3;
    let membrane_usd_m3 = operating.membrane_replacement_usd_yr / annual_production_m3;
    let chemicals_usd_m3 = (operating.antiscalant_usd_yr
        + operating.ph_chemicals_usd_yr
        + operating.cip_usd_yr)
        / annual_production_m3;
    let fixed_om_usd_m3 = operating.fixed_om_usd_yr / annual_production_m3;

    Ok(LcowBreakdown {
        capital_usd_m3,
        electricity_usd_m3,
        membrane_usd_m3,
        chemicals_usd_m3,
        fixed_om_usd_m3,
        total_usd_m3: capital_usd_m3
            + electricity_usd_m3
            + membrane_usd_m3
            + chemicals_usd_m3
            + fixed_om_usd_m3,
        capital_recovery_factor: crf,
    })
}
