// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Configuration Optimizer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Enumerates every viable vessel-array configuration for a feed and
//! recovery target: stage counts 1–3 without recycle, the recycle fixed
//! point when single-pass designs under-deliver, a scaling-limited
//! recovery gate when feed chemistry is supplied.
//!
//! Per-split hydraulic failures prune silently; chemistry errors and
//! recycle convergence failures surface to the caller.

use log::{debug, info};
use std::collections::HashSet;

use osmo_chem::composition::WaterComposition;
use osmo_chem::phreeqc::PhreeqcEngine;
use osmo_chem::scaling::ScalingEvaluator;
use osmo_chem::sustainable::max_sustainable_recovery;
use osmo_types::config::{ArrayDesignSettings, SiThresholds};
use osmo_types::deadline::Deadline;
use osmo_types::error::{OsmoError, OsmoResult};
use osmo_types::membrane::{MembraneGrade, MembraneSpec};
use osmo_types::state::{DesignWarning, RecycleLoop, StageDesign, TrainConfig};

use crate::recycle;
use crate::search::{best_stage_max_recovery, single_stage_for_target};
use crate::stage::{StageContext, StageWorking};
use crate::trim::trim_to_target;

/// Fraction of feed salt escaping into permeate, used only for the
/// optimizer-level disposal/blend TDS estimates. The simulator computes
/// real compositions.
fn salt_passage(grade: MembraneGrade) -> f64 {
    match grade {
        MembraneGrade::Brackish => 0.015,
        MembraneGrade::Seawater => 0.005,
    }
}

/// Feed chemistry for the sustainable-recovery gate.
#[derive(Debug, Clone)]
pub struct FeedChemistry {
    pub composition: WaterComposition,
    pub ph: f64,
    pub temperature_c: f64,
    pub thresholds: SiThresholds,
}

/// One optimizer invocation.
pub struct OptimizeRequest<'a> {
    pub feed_flow_m3h: f64,
    pub target_recovery: f64,
    pub feed_tds_mg_l: f64,
    pub membrane: &'a MembraneSpec,
    pub settings: ArrayDesignSettings,
    /// Whether the caller pinned explicit flux targets (drives the
    /// chemistry-conflict warning).
    pub custom_flux_targets: bool,
    pub chemistry: Option<FeedChemistry>,
}

/// Enumerate all viable configurations, ordered by stage count then by
/// proximity of achieved to target recovery.
pub fn optimize(
    request: &OptimizeRequest<'_>,
    engine: Option<&dyn PhreeqcEngine>,
    deadline: &Deadline,
) -> OsmoResult<Vec<TrainConfig>> {
    request.settings.validate()?;
    request.membrane.validate()?;
    if request.feed_flow_m3h <= 0.0 || !request.feed_flow_m3h.is_finite() {
        return Err(OsmoError::ConfigError(format!(
            "feed flow {} m³/h must be positive",
            request.feed_flow_m3h
        )));
    }
    if !(0.0..1.0).contains(&request.target_recovery) || request.target_recovery <= 0.0 {
        return Err(OsmoError::ConfigError(format!(
            "target recovery {} outside (0, 1)",
            request.target_recovery
        )));
    }

    // Scaling-limited ceiling, once per request.
    let sustainable_r_max = match (&request.chemistry, engine) {
        (Some(chemistry), Some(engine)) => {
            let evaluator = ScalingEvaluator::new(engine);
            Some(
                max_sustainable_recovery(
                    &evaluator,
                    &chemistry.composition,
                    chemistry.ph,
                    chemistry.temperature_c,
                    &chemistry.thresholds,
                    false,
                    deadline,
                )?
                .r_max,
            )
        }
        (Some(_), None) => {
            return Err(OsmoError::ConfigError(
                "feed chemistry supplied without a chemistry engine".into(),
            ))
        }
        _ => None,
    };

    let settings = &request.settings;
    let contexts: Vec<StageContext> = (0..settings.max_stages)
        .map(|i| StageContext::from_settings(settings, request.membrane, i))
        .collect();

    let mut configs: Vec<TrainConfig> = Vec::new();

    // Single-pass arrays, every stage count.
    for k in 1..=settings.max_stages {
        deadline.check()?;
        if let Some(stages) = design_single_pass(request, &contexts[..k]) {
            configs.push(freeze_single_pass(request, stages, sustainable_r_max));
        }
    }

    let target_met = configs.iter().any(|c| {
        c.system_recovery >= request.target_recovery - settings.recovery_tolerance / 2.0
    });

    // Recycle only when every single-pass split under-delivers.
    if !target_met && settings.allow_recycle {
        debug!("single-pass under-delivers; solving recycle fixed point");
        for k in 1..=settings.max_stages {
            deadline.check()?;
            if let Some(design) = recycle::solve(
                request.feed_flow_m3h,
                request.target_recovery,
                &contexts[..k],
                settings,
                deadline,
            )? {
                configs.push(freeze_recycle(request, design, sustainable_r_max));
            }
        }
    }

    // Deduplicate identical vessel splits.
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    configs.retain(|c| {
        let key: Vec<usize> = c.stages.iter().map(|s| s.n_vessels).collect();
        seen.insert(key)
    });

    if configs.is_empty() {
        return Err(OsmoError::NoFeasibleConfiguration(format!(
            "target recovery {:.0}% cannot be reached within {} stages{}",
            request.target_recovery * 100.0,
            settings.max_stages,
            if settings.allow_recycle {
                ", even with maximum recycle"
            } else {
                " without recycle"
            }
        )));
    }

    configs.sort_by(|a, b| {
        a.n_stages()
            .cmp(&b.n_stages())
            .then(a.recovery_error().total_cmp(&b.recovery_error()))
    });

    info!(
        "found {} viable configuration(s) for {:.0}% recovery",
        configs.len(),
        request.target_recovery * 100.0
    );
    for c in &configs {
        debug!(
            "  {}-stage {}: recovery {:.1}%, recycle {}",
            c.n_stages(),
            c.array_notation(),
            c.system_recovery * 100.0,
            c.recycle.is_some()
        );
    }

    Ok(configs)
}

/// Greedy stage-by-stage design for one stage count; `None` when no
/// admissible split exists or a smaller stage count already covers the
/// target.
fn design_single_pass(
    request: &OptimizeRequest<'_>,
    contexts: &[StageContext],
) -> Option<Vec<StageWorking>> {
    let settings = &request.settings;
    let feed = request.feed_flow_m3h;
    let target = request.target_recovery;
    let k = contexts.len();

    let mut stages: Vec<StageWorking> = Vec::with_capacity(k);
    let mut current = feed;
    let mut total_permeate = 0.0;

    for (idx, ctx) in contexts.iter().enumerate() {
        let candidate = if k == 1 {
            single_stage_for_target(current, target, ctx)?
        } else {
            best_stage_max_recovery(current, ctx)?
        };
        stages.push(StageWorking {
            ctx: *ctx,
            feed_m3h: current,
            candidate,
        });
        total_permeate += candidate.permeate_m3h;
        current = candidate.concentrate_m3h;

        // Target already cleared with stages to spare: the shorter array
        // covers this split.
        if idx + 1 < k && total_permeate / feed > target + settings.recovery_tolerance {
            return None;
        }
    }

    let recovery = total_permeate / feed;
    if recovery < target {
        debug!("{k}-stage split tops out at {:.1}%", recovery * 100.0);
        return None;
    }
    if recovery > target + settings.recovery_tolerance {
        trim_to_target(&mut stages, feed, target, settings.recovery_tolerance);
    }
    Some(stages)
}

fn stage_designs(stages: &[StageWorking], elements_per_vessel: usize) -> Vec<StageDesign> {
    stages
        .iter()
        .enumerate()
        .map(|(i, s)| s.to_design(i + 1, elements_per_vessel))
        .collect()
}

fn common_warnings(
    request: &OptimizeRequest<'_>,
    stages: &[StageWorking],
    system_recovery: f64,
    sustainable_r_max: Option<f64>,
) -> Vec<DesignWarning> {
    let mut warnings = Vec::new();
    for (idx, s) in stages.iter().enumerate() {
        if s.candidate.n_vessels > request.settings.vessel_count_warning {
            warnings.push(DesignWarning::VesselCountExplosion {
                stage: idx + 1,
                n_vessels: s.candidate.n_vessels,
            });
        }
        if s.candidate.flux_lmh < s.ctx.flux_lo_lmh - 1e-9 {
            warnings.push(DesignWarning::FluxRelaxedBelowTolerance {
                stage: idx + 1,
                flux_ratio: s.flux_ratio(),
            });
        }
    }
    if let Some(r_max) = sustainable_r_max {
        if system_recovery > r_max {
            warnings.push(DesignWarning::SustainableRecoveryExceeded {
                achieved: system_recovery,
                sustainable_r_max: r_max,
            });
            if request.custom_flux_targets {
                warnings.push(DesignWarning::FluxTargetsConflictWithChemistry);
            }
        }
    }
    warnings
}

fn freeze_single_pass(
    request: &OptimizeRequest<'_>,
    stages: Vec<StageWorking>,
    sustainable_r_max: Option<f64>,
) -> TrainConfig {
    let total_permeate: f64 = stages.iter().map(|s| s.candidate.permeate_m3h).sum();
    let system_recovery = total_permeate / request.feed_flow_m3h;
    let warnings = common_warnings(request, &stages, system_recovery, sustainable_r_max);

    TrainConfig {
        membrane_model: request.membrane.model.clone(),
        system_feed_flow_m3h: request.feed_flow_m3h,
        feed_tds_mg_l: request.feed_tds_mg_l,
        target_recovery: request.target_recovery,
        system_recovery,
        total_permeate_flow_m3h: total_permeate,
        stages: stage_designs(&stages, request.settings.elements_per_vessel),
        recycle: None,
        sustainable_r_max,
        meets_target: system_recovery >= request.target_recovery - request.settings.recovery_tolerance,
        warnings,
    }
}

fn freeze_recycle(
    request: &OptimizeRequest<'_>,
    design: recycle::RecycleDesign,
    sustainable_r_max: Option<f64>,
) -> TrainConfig {
    let feed = request.feed_flow_m3h;
    let passage = salt_passage(request.membrane.grade);
    let total_permeate: f64 = design
        .stages
        .iter()
        .map(|s| s.candidate.permeate_m3h)
        .sum();

    // Loop salt balance with near-total rejection: everything the fresh
    // feed brings leaves through disposal, minus the permeate slip.
    let disposal_tds_mg_l =
        feed * request.feed_tds_mg_l * (1.0 - passage) / design.disposal_flow_m3h;
    let blended_feed_tds_mg_l = (feed * request.feed_tds_mg_l
        + design.recycle_flow_m3h * disposal_tds_mg_l)
        / design.blended_feed_m3h;

    let warnings = common_warnings(
        request,
        &design.stages,
        design.system_recovery,
        sustainable_r_max,
    );

    TrainConfig {
        membrane_model: request.membrane.model.clone(),
        system_feed_flow_m3h: feed,
        feed_tds_mg_l: request.feed_tds_mg_l,
        target_recovery: request.target_recovery,
        system_recovery: design.system_recovery,
        total_permeate_flow_m3h: total_permeate,
        stages: stage_designs(&design.stages, request.settings.elements_per_vessel),
        recycle: Some(RecycleLoop {
            recycle_flow_m3h: design.recycle_flow_m3h,
            recycle_split_ratio: design.split_ratio,
            disposal_flow_m3h: design.disposal_flow_m3h,
            disposal_tds_mg_l,
            blended_feed_flow_m3h: design.blended_feed_m3h,
            blended_feed_tds_mg_l,
        }),
        sustainable_r_max,
        meets_target: design.system_recovery
            >= request.target_recovery - request.settings.recovery_tolerance,
        warnings,
    }
}
