// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — System Simulator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Full-train steady-state sweep. Stages evaluate strictly in order
//! 1→K; under recycle the stage-1 composition is solved by direct
//! iteration on the recycle stream before the reported sweep.
//!
//! Reporting is on the SYSTEM basis: external feed, total permeate,
//! disposal flow, disposal TDS. The blended stage-1 feed never serves as
//! a recovery or energy denominator.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use osmo_chem::composition::WaterComposition;
use osmo_chem::phreeqc::PhreeqcEngine;
use osmo_chem::scaling::ScalingEvaluator;
use osmo_types::config::Mineral;
use osmo_types::constants::{m3h_to_m3s, PA_PER_BAR};
use osmo_types::deadline::Deadline;
use osmo_types::error::{OsmoError, OsmoResult};
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::TrainConfig;

use crate::stage::{compute_stage, StagePerformance, StageScaling};
use crate::transport::mixed_permeate;

/// Recycle composition iteration budget and tolerances.
const RECYCLE_MAX_ITERATIONS: usize = 20;
const RECYCLE_REL_TOL: f64 = 1e-3;
const RECYCLE_ABS_TOL_MG_L: f64 = 1.0;
/// Initial guess: recycle stream at this multiple of the fresh feed.
const RECYCLE_SEED_FACTOR: f64 = 3.0;

/// Energy-recovery device on the disposal brine. The credit engages
/// only when the brine pressure clears the device's service class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErdSettings {
    pub efficiency: f64,
    pub min_pressure_bar: f64,
}

/// One simulation invocation.
pub struct SimulationInput<'a> {
    pub config: &'a TrainConfig,
    /// Validated fresh feed composition.
    pub feed: WaterComposition,
    pub feed_ph: f64,
    pub temperature_c: f64,
    pub membrane: &'a MembraneSpec,
    pub pump_efficiency: f64,
    /// `true`: every stage carries its own full-lift pump. `false`: the
    /// first stage lifts, later stages pay only the positive pressure
    /// differential.
    pub use_interstage_boost: bool,
    pub erd: Option<ErdSettings>,
}

/// Convergence record of the recycle composition loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecycleConvergence {
    pub iterations: usize,
    pub final_relative_change: f64,
    pub blended_feed_tds_mg_l: f64,
}

/// System-basis totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPerformance {
    /// External fresh feed (m³/h).
    pub system_feed_flow_m3h: f64,
    pub total_permeate_flow_m3h: f64,
    /// Total permeate / external feed.
    pub system_recovery: f64,
    pub permeate_tds_mg_l: f64,
    pub permeate_composition: WaterComposition,
    pub disposal_flow_m3h: f64,
    /// Final-stage concentrate TDS, pre-split.
    pub disposal_tds_mg_l: f64,
    pub total_pump_power_kw: f64,
    pub specific_energy_kwh_m3: f64,
    /// Net of the ERD credit, when one is configured.
    pub specific_energy_net_kwh_m3: Option<f64>,
    pub erd_recovered_kw: Option<f64>,
    /// Per-ion rejection against the fresh feed.
    pub ion_rejection: Vec<(String, f64)>,
}

/// Scaling state of the final brine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingAssessment {
    pub brine_ph: f64,
    pub saturation_indices: Vec<(Mineral, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub stages: Vec<StagePerformance>,
    pub system: SystemPerformance,
    pub scaling: ScalingAssessment,
    pub recycle: Option<RecycleConvergence>,
}

/// Run the steady-state simulation of a configured train.
pub fn simulate(
    input: &SimulationInput<'_>,
    engine: &dyn PhreeqcEngine,
    deadline: &Deadline,
) -> OsmoResult<PerformanceResult> {
    let config = input.config;
    if config.stages.is_empty() {
        return Err(OsmoError::ConfigError("configuration has no stages".into()));
    }
    if config.membrane_model != input.membrane.model {
        return Err(OsmoError::ConfigError(format!(
            "configuration was sized for {} but {} was supplied",
            config.membrane_model, input.membrane.model
        )));
    }
    if input.temperature_c > input.membrane.max_temperature_c {
        return Err(OsmoError::ConfigError(format!(
            "feed temperature {} °C exceeds membrane limit {} °C",
            input.temperature_c, input.membrane.max_temperature_c
        )));
    }

    // Stage-1 composition: solve the recycle stream when one exists.
    let (stages, recycle_convergence) = match &config.recycle {
        Some(loop_info) => {
            let (stages, convergence) =
                solve_recycle_composition(input, loop_info.recycle_flow_m3h, deadline)?;
            (stages, Some(convergence))
        }
        None => (run_stages(input, &input.feed, deadline)?, None),
    };
    let mut stages = stages;

    // Pump duty: first stage lifts the full (possibly blended) feed;
    // later stages pay the boost.
    let mut total_pump_kw = 0.0;
    let mut previous_pressure_bar = 0.0;
    for stage in stages.iter_mut() {
        let lift_bar = if stage.stage_number == 1 || input.use_interstage_boost {
            stage.feed_pressure_bar
        } else {
            (stage.feed_pressure_bar - previous_pressure_bar).max(0.0)
        };
        stage.pump_power_kw = pump_power_kw(
            stage.feed_flow_m3h,
            lift_bar * PA_PER_BAR,
            input.pump_efficiency,
        );
        total_pump_kw += stage.pump_power_kw;
        previous_pressure_bar = stage.feed_pressure_bar;
    }

    // Chemistry pass, once per stage, after convergence.
    let evaluator = ScalingEvaluator::new(engine);
    for stage in stages.iter_mut() {
        deadline.check()?;
        let report = evaluator.concentrate_at_recovery(
            &stage.feed_composition,
            input.feed_ph,
            input.temperature_c,
            stage.stage_recovery,
            false,
        )?;
        stage.scaling = Some(StageScaling {
            ph: report.ph,
            saturation_indices: report.saturation_indices,
        });
    }

    // System totals on the fresh-feed basis.
    let system_feed = config.system_feed_flow_m3h;
    let permeate_flows: Vec<f64> = stages.iter().map(|s| s.permeate_flow_m3h).collect();
    let permeate_comps: Vec<WaterComposition> = stages
        .iter()
        .map(|s| s.permeate_composition.clone())
        .collect();
    let total_permeate: f64 = permeate_flows.iter().sum();
    let permeate_composition = mixed_permeate(&permeate_flows, &permeate_comps);

    let last = stages.last().expect("at least one stage");
    let disposal_flow = config.disposal_flow_m3h();
    let disposal_tds = last.concentrate_tds_mg_l;

    let system_recovery = total_permeate / system_feed;
    let specific_energy = total_pump_kw / total_permeate;

    let brine_pressure_bar = last.feed_pressure_bar - last.channel_drop_bar;
    let (erd_recovered_kw, specific_energy_net) = match input.erd {
        Some(erd) if brine_pressure_bar >= erd.min_pressure_bar => {
            let recovered = erd.efficiency
                * m3h_to_m3s(disposal_flow)
                * brine_pressure_bar
                * PA_PER_BAR
                / 1000.0;
            (
                Some(recovered),
                Some((total_pump_kw - recovered).max(0.0) / total_permeate),
            )
        }
        _ => (None, None),
    };

    let ion_rejection: Vec<(String, f64)> = input
        .feed
        .iter()
        .map(|(symbol, c_feed)| {
            let c_perm = permeate_composition.get(symbol);
            (
                symbol.to_string(),
                (1.0 - c_perm / c_feed.max(1e-12)).clamp(0.0, 1.0),
            )
        })
        .collect();

    // Salt closure sanity on the system basis (2% envelope; the slack
    // absorbs ion-specific rejection differences).
    let salt_in = system_feed * input.feed.tds_mg_l();
    let salt_out =
        total_permeate * permeate_composition.tds_mg_l() + disposal_flow * disposal_tds;
    let closure = (salt_in - salt_out).abs() / salt_in;
    if closure > 0.02 {
        warn!("system salt balance residual {:.2}% above envelope", closure * 100.0);
    }

    let scaling = ScalingAssessment {
        brine_ph: last.scaling.as_ref().map(|s| s.ph).unwrap_or(input.feed_ph),
        saturation_indices: last
            .scaling
            .as_ref()
            .map(|s| s.saturation_indices.clone())
            .unwrap_or_default(),
    };

    info!(
        "simulated {}-stage train: recovery {:.1}%, SEC {:.2} kWh/m³",
        stages.len(),
        system_recovery * 100.0,
        specific_energy
    );

    Ok(PerformanceResult {
        stages,
        system: SystemPerformance {
            system_feed_flow_m3h: system_feed,
            total_permeate_flow_m3h: total_permeate,
            system_recovery,
            permeate_tds_mg_l: permeate_composition.tds_mg_l(),
            permeate_composition,
            disposal_flow_m3h: disposal_flow,
            disposal_tds_mg_l: disposal_tds,
            total_pump_power_kw: total_pump_kw,
            specific_energy_kwh_m3: specific_energy,
            specific_energy_net_kwh_m3: specific_energy_net,
            erd_recovered_kw,
            ion_rejection,
        },
        scaling,
        recycle: recycle_convergence,
    })
}

/// Hydraulic pump power (kW).
fn pump_power_kw(flow_m3h: f64, pressure_pa: f64, efficiency: f64) -> f64 {
    m3h_to_m3s(flow_m3h) * pressure_pa / efficiency / 1000.0
}

/// Sweep all stages for a given stage-1 composition.
fn run_stages(
    input: &SimulationInput<'_>,
    stage_1_feed: &WaterComposition,
    deadline: &Deadline,
) -> OsmoResult<Vec<StagePerformance>> {
    let mut stages = Vec::with_capacity(input.config.stages.len());
    let mut current = stage_1_feed.clone();
    for design in &input.config.stages {
        deadline.check()?;
        let performance = compute_stage(design, &current, input.membrane, input.temperature_c)?;
        current = performance.concentrate_composition.clone();
        stages.push(performance);
    }
    Ok(stages)
}

/// Direct iteration on the recycle composition until the loop reaches
/// steady state.
fn solve_recycle_composition(
    input: &SimulationInput<'_>,
    recycle_flow_m3h: f64,
    deadline: &Deadline,
) -> OsmoResult<(Vec<StagePerformance>, RecycleConvergence)> {
    let fresh_flow = input.config.system_feed_flow_m3h;
    let mut recycle_comp = input.feed.scaled(RECYCLE_SEED_FACTOR);

    let mut last_change = f64::MAX;
    for iteration in 0..RECYCLE_MAX_ITERATIONS {
        let blended = WaterComposition::blend(
            fresh_flow,
            &input.feed,
            recycle_flow_m3h,
            &recycle_comp,
        );
        let stages = run_stages(input, &blended, deadline)?;
        let new_recycle = stages
            .last()
            .expect("at least one stage")
            .concentrate_composition
            .clone();

        let mut max_rel = 0.0_f64;
        let mut max_abs = 0.0_f64;
        for (symbol, new_val) in new_recycle.iter() {
            let old_val = recycle_comp.get(symbol);
            let abs = (new_val - old_val).abs();
            max_abs = max_abs.max(abs);
            max_rel = max_rel.max(abs / old_val.max(1.0));
        }
        last_change = max_rel;
        debug!(
            "recycle iteration {}: Δrel {max_rel:.2e}, Δabs {max_abs:.2} mg/L",
            iteration + 1
        );

        if max_rel < RECYCLE_REL_TOL && max_abs < RECYCLE_ABS_TOL_MG_L {
            return Ok((
                stages,
                RecycleConvergence {
                    iterations: iteration + 1,
                    final_relative_change: max_rel,
                    blended_feed_tds_mg_l: blended.tds_mg_l(),
                },
            ));
        }
        recycle_comp = new_recycle;
    }

    Err(OsmoError::ConvergenceFailure {
        iterations: RECYCLE_MAX_ITERATIONS,
        message: format!(
            "recycle composition change {last_change:.2e} above tolerance {RECYCLE_REL_TOL:.0e}"
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmo_chem::phreeqc::MockPhreeqc;
    use osmo_design::{optimize, OptimizeRequest};
    use osmo_types::config::ArrayDesignSettings;
    use osmo_types::membrane::MembraneCatalog;

    fn brackish_feed() -> WaterComposition {
        WaterComposition::validate([("Na+", 1200.0), ("Cl-", 1850.0)], None)
            .unwrap()
            .composition
    }

    fn configs_for(feed: f64, target: f64, tds: f64) -> Vec<TrainConfig> {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        optimize(
            &OptimizeRequest {
                feed_flow_m3h: feed,
                target_recovery: target,
                feed_tds_mg_l: tds,
                membrane,
                settings: ArrayDesignSettings::default(),
                custom_flux_targets: false,
                chemistry: None,
            },
            None,
            &Deadline::none(),
        )
        .unwrap()
    }

    fn input<'a>(
        config: &'a TrainConfig,
        membrane: &'a osmo_types::membrane::MembraneSpec,
    ) -> SimulationInput<'a> {
        SimulationInput {
            config,
            feed: brackish_feed(),
            feed_ph: 7.5,
            temperature_c: 25.0,
            membrane,
            pump_efficiency: 0.8,
            use_interstage_boost: false,
            erd: None,
        }
    }

    #[test]
    fn test_two_stage_brackish_sweep() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = configs_for(100.0, 0.75, 3050.0);
        let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
        let engine = MockPhreeqc::new();

        let result = simulate(&input(config, membrane), &engine, &Deadline::none()).unwrap();

        assert!((result.system.system_recovery - 0.75).abs() < 0.02);
        assert!(
            (0.5..2.0).contains(&result.system.specific_energy_kwh_m3),
            "SEC = {}",
            result.system.specific_energy_kwh_m3
        );
        assert!(result.system.permeate_tds_mg_l < 150.0);
        assert!(result.system.disposal_tds_mg_l > 3.0 * 3050.0);
        // Stage 2 sees stage 1's concentrate.
        assert!(
            (result.stages[1].feed_tds_mg_l - result.stages[0].concentrate_tds_mg_l).abs()
                < 1e-6
        );
        // Every stage got its chemistry pass.
        assert!(result.stages.iter().all(|s| s.scaling.is_some()));
    }

    #[test]
    fn test_system_salt_closure() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = configs_for(100.0, 0.75, 3050.0);
        let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
        let engine = MockPhreeqc::new();
        let result = simulate(&input(config, membrane), &engine, &Deadline::none()).unwrap();

        let salt_in = result.system.system_feed_flow_m3h * brackish_feed().tds_mg_l();
        let salt_out = result.system.total_permeate_flow_m3h * result.system.permeate_tds_mg_l
            + result.system.disposal_flow_m3h * result.system.disposal_tds_mg_l;
        assert!(
            (salt_in - salt_out).abs() / salt_in < 0.02,
            "closure {}",
            (salt_in - salt_out).abs() / salt_in
        );
    }

    #[test]
    fn test_recycle_uses_fresh_feed_basis() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = configs_for(100.0, 0.85, 3050.0);
        let config = configs
            .iter()
            .find(|c| c.n_stages() == 3 && c.recycle.is_some())
            .unwrap();
        let engine = MockPhreeqc::new();
        let result = simulate(&input(config, membrane), &engine, &Deadline::none()).unwrap();

        // The historical regression: recovery on the blended stage-1 feed
        // would read ~0.72 here, not 0.85.
        assert!(
            (result.system.system_recovery - 0.85).abs() < 0.03,
            "recovery {}",
            result.system.system_recovery
        );
        let blended_basis =
            result.system.total_permeate_flow_m3h / result.stages[0].feed_flow_m3h;
        assert!(result.system.system_recovery > blended_basis + 0.01);

        let convergence = result.recycle.expect("recycle loop must report");
        assert!(convergence.iterations <= RECYCLE_MAX_ITERATIONS);
        assert!(convergence.blended_feed_tds_mg_l > 3050.0);

        // Disposal TDS several times the feed, not the blended average.
        assert!(result.system.disposal_tds_mg_l > 3.0 * 3050.0);
    }

    #[test]
    fn test_erd_reduces_net_energy() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = configs_for(100.0, 0.75, 3050.0);
        let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
        let engine = MockPhreeqc::new();

        let mut sim_input = input(config, membrane);
        sim_input.erd = Some(ErdSettings {
            efficiency: 0.95,
            min_pressure_bar: 0.0,
        });
        let result = simulate(&sim_input, &engine, &Deadline::none()).unwrap();

        let net = result.system.specific_energy_net_kwh_m3.unwrap();
        assert!(net < result.system.specific_energy_kwh_m3);
        assert!(result.system.erd_recovered_kw.unwrap() > 0.0);
    }

    #[test]
    fn test_membrane_mismatch_rejected() {
        let catalog = MembraneCatalog::builtin();
        let other = catalog.get("SW30HRLE_440").unwrap();
        let configs = configs_for(100.0, 0.75, 3050.0);
        let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
        let engine = MockPhreeqc::new();
        let err = simulate(&input(config, other), &engine, &Deadline::none()).unwrap_err();
        assert!(matches!(err, OsmoError::ConfigError(_)));
    }

    #[test]
    fn test_chemistry_failure_surfaces() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let configs = configs_for(100.0, 0.75, 3050.0);
        let config = configs.iter().find(|c| c.n_stages() == 2).unwrap();
        let engine = MockPhreeqc::failing();
        let err = simulate(&input(config, membrane), &engine, &Deadline::none()).unwrap_err();
        assert!(matches!(err, OsmoError::ChemistryError(_)));
    }
}
