//! Annual operating costs: energy, membrane replacement, chemicals,
//! fixed O&M percentage items.

use serde::{Deserialize, Serialize};

use osmo_sim::PerformanceResult;
use osmo_types::config::{ChemicalDosing, EconomicParams};
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::TrainConfig;

use crate::capital::CapitalBreakdown;

const HOURS_PER_YEAR: f64 = 8760.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingBreakdown {
    pub electricity_usd_yr: f64,
    pub membrane_replacement_usd_yr: f64,
    pub antiscalant_usd_yr: f64,
    pub ph_chemicals_usd_yr: f64,
    pub cip_usd_yr: f64,
    pub fixed_om_usd_yr: f64,
    pub total_usd_yr: f64,
}

/// Annual operating breakdown for a simulated train.
pub fn annual(
    config: &TrainConfig,
    performance: &PerformanceResult,
    membrane: &MembraneSpec,
    capital: &CapitalBreakdown,
    params: &EconomicParams,
    dosing: &ChemicalDosing,
) -> OperatingBreakdown {
    let operating_hours = HOURS_PER_YEAR * params.utilization_factor;

    // Energy on the net pump duty (ERD credit already taken when fitted).
    let net_power_kw = performance.system.total_pump_power_kw
        - performance.system.erd_recovered_kw.unwrap_or(0.0);
    let electricity_usd_yr = net_power_kw * operating_hours * params.electricity_cost_usd_kwh;

    let membrane_replacement_usd_yr =
        config.total_membrane_area_m2()
            * params.membrane_cost_usd_m2(membrane.grade)
            * params.membrane_replacement_factor;

    // Chemicals dose the FRESH feed; the recycle stream is already
    // treated water.
    let feed_m3_yr = config.system_feed_flow_m3h * operating_hours;
    let antiscalant_usd_yr = dosing.antiscalant_dose_mg_l * feed_m3_yr / 1.0e6
        * params.reagents.antiscalant_usd_kg;
    let ph_chemicals_usd_yr = (dosing.acid_dose_kg_m3 * params.reagents.hcl_usd_kg
        + dosing.base_dose_kg_m3 * params.reagents.naoh_usd_kg)
        * feed_m3_yr;

    let cip_kg_yr = dosing.cip_dose_kg_per_m2
        * config.total_membrane_area_m2()
        * dosing.cip_frequency_per_year;
    let cip_price_usd_kg = dosing.cip_surfactant_fraction * params.reagents.cip_surfactant_usd_kg
        + dosing.cip_acid_fraction * params.reagents.hcl_usd_kg
        + dosing.cip_base_fraction * params.reagents.naoh_usd_kg;
    let cip_usd_yr = cip_kg_yr * cip_price_usd_kg;

    let salaries = params.salaries_percent_fci * capital.total_usd;
    let fixed_om_usd_yr = salaries
        + params.benefit_percent_of_salary * salaries
        + params.maintenance_percent_fci * capital.total_usd
        + params.laboratory_percent_fci * capital.total_usd
        + params.insurance_percent_fci * capital.total_usd;

    let total_usd_yr = electricity_usd_yr
        + membrane_replacement_usd_yr
        + antiscalant_usd_yr
        + ph_chemicals_usd_yr
        + cip_usd_yr
        + fixed_om_usd_yr;

    OperatingBreakdown {
        electricity_usd_yr,
        membrane_replacement_usd_yr,
        antiscalant_usd_yr,
        ph_chemicals_usd_yr,
        cip_usd_yr,
        fixed_om_usd_yr,
        total_usd_yr,
    }
}
