// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Osmo API
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The three caller-facing operations. Transport, logging setup and
//! report rendering live outside this workspace; the core is stateless
//! and every call returns a success payload or a typed failure.

use serde::{Deserialize, Serialize};

use osmo_chem::composition::WaterComposition;
use osmo_chem::phreeqc::PhreeqcEngine;
use osmo_design::{optimize, FeedChemistry, OptimizeRequest};
use osmo_econ::EconomicResult;
use osmo_sim::simulator::{simulate, ErdSettings, SimulationInput};
use osmo_sim::PerformanceResult;
use osmo_types::config::{
    AntiscalantTier, ArrayDesignSettings, ChemicalDosing, EconomicParams, SiThresholds,
};
use osmo_types::deadline::Deadline;
use osmo_types::error::OsmoResult;
use osmo_types::membrane::MembraneCatalog;
use osmo_types::state::TrainConfig;

pub use osmo_chem::phreeqc::{MockPhreeqc, PhreeqcProcess};
pub use osmo_types::error::OsmoError as Error;

const DEFAULT_FEED_PH: f64 = 7.5;
const DEFAULT_TEMPERATURE_C: f64 = 25.0;

/// Optional knobs for `optimize_ro_configuration`.
#[derive(Debug, Clone, Default)]
pub struct OptimizeOptions<'a> {
    pub allow_recycle: Option<bool>,
    pub max_recycle_ratio: Option<f64>,
    pub flux_targets_lmh: Option<Vec<f64>>,
    pub flux_tolerance: Option<f64>,
    /// When present, each configuration carries a sustainable-recovery
    /// ceiling computed through the chemistry engine.
    pub feed_ion_composition: Option<Vec<(&'a str, f64)>>,
    pub feed_temperature_c: Option<f64>,
    pub feed_ph: Option<f64>,
    /// Feed TDS when no composition is supplied (estimates only).
    pub feed_salinity_ppm: Option<f64>,
    pub antiscalant: Option<AntiscalantTier>,
}

/// Enumerate all viable vessel-array configurations.
pub fn optimize_ro_configuration(
    feed_flow_m3h: f64,
    water_recovery_fraction: f64,
    membrane_model: &str,
    options: &OptimizeOptions<'_>,
    engine: Option<&dyn PhreeqcEngine>,
    deadline: &Deadline,
) -> OsmoResult<Vec<TrainConfig>> {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.get(membrane_model)?;

    let mut settings = ArrayDesignSettings::default();
    if let Some(allow) = options.allow_recycle {
        settings.allow_recycle = allow;
    }
    if let Some(ratio) = options.max_recycle_ratio {
        settings.max_recycle_ratio = ratio;
    }
    let custom_flux_targets = options.flux_targets_lmh.is_some();
    if let Some(targets) = &options.flux_targets_lmh {
        settings.flux_targets_lmh = targets.clone();
    }
    if let Some(tolerance) = options.flux_tolerance {
        settings.flux_tolerance = tolerance;
    }

    let chemistry = match &options.feed_ion_composition {
        Some(raw) => {
            let validated = WaterComposition::validate(raw.iter().copied(), None)?;
            Some(FeedChemistry {
                composition: validated.composition,
                ph: options.feed_ph.unwrap_or(DEFAULT_FEED_PH),
                temperature_c: options.feed_temperature_c.unwrap_or(DEFAULT_TEMPERATURE_C),
                thresholds: SiThresholds::for_tier(
                    options.antiscalant.unwrap_or(AntiscalantTier::Standard),
                ),
            })
        }
        None => None,
    };

    let feed_tds_mg_l = chemistry
        .as_ref()
        .map(|c| c.composition.tds_mg_l())
        .or(options.feed_salinity_ppm)
        .unwrap_or(1000.0);

    let request = OptimizeRequest {
        feed_flow_m3h,
        target_recovery: water_recovery_fraction,
        feed_tds_mg_l,
        membrane,
        settings,
        custom_flux_targets,
        chemistry,
    };
    optimize(&request, engine, deadline)
}

/// Optional knobs for `simulate_ro_system`.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    pub feed_temperature_c: Option<f64>,
    pub feed_ph: Option<f64>,
    pub economic_params: Option<EconomicParams>,
    pub chemical_dosing: Option<ChemicalDosing>,
    /// `true`: each stage carries its own full-lift pump.
    pub use_interstage_boost: bool,
}

/// Simulate a configured train and cost it.
pub fn simulate_ro_system(
    configuration: &TrainConfig,
    feed_salinity_ppm: f64,
    feed_ion_composition: &[(&str, f64)],
    membrane_model: &str,
    options: &SimulateOptions,
    engine: &dyn PhreeqcEngine,
    deadline: &Deadline,
) -> OsmoResult<(PerformanceResult, EconomicResult)> {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.get(membrane_model)?;

    let validated = WaterComposition::validate(
        feed_ion_composition.iter().copied(),
        Some(feed_salinity_ppm),
    )?;

    let params = options
        .economic_params
        .clone()
        .unwrap_or_else(|| EconomicParams::default_for(membrane.grade));
    let dosing = options.chemical_dosing.clone().unwrap_or_default();

    let erd = params.auto_include_erd.then_some(ErdSettings {
        efficiency: params.erd_efficiency,
        min_pressure_bar: params.erd_pressure_threshold_bar,
    });

    let input = SimulationInput {
        config: configuration,
        feed: validated.composition,
        feed_ph: options.feed_ph.unwrap_or(DEFAULT_FEED_PH),
        temperature_c: options.feed_temperature_c.unwrap_or(DEFAULT_TEMPERATURE_C),
        membrane,
        pump_efficiency: params.pump_efficiency,
        use_interstage_boost: options.use_interstage_boost,
        erd,
    };

    let performance = simulate(&input, engine, deadline)?;
    let economics = osmo_econ::evaluate(configuration, &performance, membrane, &params, &dosing)?;
    Ok((performance, economics))
}

/// Default parameter records for a membrane model (or the brackish
/// defaults when no model is named).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    pub economic_params: EconomicParams,
    pub chemical_dosing: ChemicalDosing,
}

pub fn get_defaults(membrane_model: Option<&str>) -> OsmoResult<Defaults> {
    let catalog = MembraneCatalog::builtin();
    let grade = match membrane_model {
        Some(model) => catalog.get(model)?.grade,
        None => osmo_types::membrane::MembraneGrade::Brackish,
    };
    Ok(Defaults {
        economic_params: EconomicParams::default_for(grade),
        chemical_dosing: ChemicalDosing::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_defaults_by_grade() {
        let brackish = get_defaults(Some("BW30_PRO_400")).unwrap();
        let seawater = get_defaults(Some("SW30HRLE_440")).unwrap();
        assert!(
            (brackish.economic_params.membrane_cost_brackish_usd_m2 - 30.0).abs() < 1e-9
        );
        assert!(seawater.economic_params.auto_include_erd);
        assert!((brackish.chemical_dosing.antiscalant_dose_mg_l - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_membrane_everywhere() {
        assert!(matches!(
            get_defaults(Some("XX99")).unwrap_err(),
            Error::UnknownMembrane(_)
        ));
        let err = optimize_ro_configuration(
            100.0,
            0.75,
            "XX99",
            &OptimizeOptions::default(),
            None,
            &Deadline::none(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownMembrane(_)));
    }
}
