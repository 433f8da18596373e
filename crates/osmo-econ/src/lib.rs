// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Osmo Econ
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Capital, operating and levelized cost of water for a simulated train.

pub mod capital;
pub mod lcow;
pub mod operating;

use serde::{Deserialize, Serialize};

use osmo_sim::PerformanceResult;
use osmo_types::config::{ChemicalDosing, EconomicParams};
use osmo_types::error::OsmoResult;
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::TrainConfig;

pub use capital::CapitalBreakdown;
pub use lcow::LcowBreakdown;
pub use operating::OperatingBreakdown;

/// Complete economic assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicResult {
    pub capital: CapitalBreakdown,
    pub operating: OperatingBreakdown,
    pub lcow: LcowBreakdown,
    pub annual_production_m3: f64,
}

/// Assemble the full cost picture for a configuration and its simulated
/// performance.
pub fn evaluate(
    config: &TrainConfig,
    performance: &PerformanceResult,
    membrane: &MembraneSpec,
    params: &EconomicParams,
    dosing: &ChemicalDosing,
) -> OsmoResult<EconomicResult> {
    params.validate()?;
    dosing.validate()?;

    let capital = capital::direct_and_indirect(config, performance, membrane, params);
    let operating = operating::annual(config, performance, membrane, &capital, params, dosing);

    let annual_production_m3 = performance.system.total_permeate_flow_m3h
        * 8760.0
        * params.utilization_factor;
    let lcow = lcow::breakdown(&capital, &operating, annual_production_m3, params)?;

    Ok(EconomicResult {
        capital,
        operating,
        lcow,
        annual_production_m3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmo_chem::composition::WaterComposition;
    use osmo_chem::phreeqc::MockPhreeqc;
    use osmo_design::{optimize, OptimizeRequest};
    use osmo_sim::simulator::{simulate, SimulationInput};
    use osmo_types::config::ArrayDesignSettings;
    use osmo_types::deadline::Deadline;
    use osmo_types::membrane::MembraneCatalog;

    fn brackish_case() -> (TrainConfig, PerformanceResult) {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = optimize(
            &OptimizeRequest {
                feed_flow_m3h: 100.0,
                target_recovery: 0.75,
                feed_tds_mg_l: 3050.0,
                membrane,
                settings: ArrayDesignSettings::default(),
                custom_flux_targets: false,
                chemistry: None,
            },
            None,
            &Deadline::none(),
        )
        .unwrap();
        let config = configs
            .iter()
            .find(|c| c.n_stages() == 2)
            .unwrap()
            .clone();

        let feed = WaterComposition::validate([("Na+", 1200.0), ("Cl-", 1850.0)], None)
            .unwrap()
            .composition;
        let engine = MockPhreeqc::new();
        let performance = simulate(
            &SimulationInput {
                config: &config,
                feed,
                feed_ph: 7.5,
                temperature_c: 25.0,
                membrane,
                pump_efficiency: 0.8,
                use_interstage_boost: false,
                erd: None,
            },
            &engine,
            &Deadline::none(),
        )
        .unwrap();
        (config, performance)
    }

    #[test]
    fn test_brackish_lcow_in_band() {
        let (config, performance) = brackish_case();
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let result = evaluate(
            &config,
            &performance,
            membrane,
            &EconomicParams::default(),
            &ChemicalDosing::default(),
        )
        .unwrap();

        assert!(
            (0.15..0.35).contains(&result.lcow.total_usd_m3),
            "LCOW = {}",
            result.lcow.total_usd_m3
        );
        assert!(result.capital.total_usd > result.capital.direct_usd);
        assert!(result.annual_production_m3 > 5.0e5);
    }

    #[test]
    fn test_lcow_components_sum() {
        let (config, performance) = brackish_case();
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let result = evaluate(
            &config,
            &performance,
            membrane,
            &EconomicParams::default(),
            &ChemicalDosing::default(),
        )
        .unwrap();

        let sum = result.lcow.capital_usd_m3
            + result.lcow.electricity_usd_m3
            + result.lcow.membrane_usd_m3
            + result.lcow.chemicals_usd_m3
            + result.lcow.fixed_om_usd_m3;
        assert!(
            (sum - result.lcow.total_usd_m3).abs() / result.lcow.total_usd_m3 < 0.01,
            "components {sum} vs total {}",
            result.lcow.total_usd_m3
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        let (config, performance) = brackish_case();
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let mut params = EconomicParams::default();
        params.wacc = 0.9;
        assert!(evaluate(
            &config,
            &performance,
            membrane,
            &params,
            &ChemicalDosing::default()
        )
        .is_err());
    }
}
