// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Concentrate Recycle
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Concentrate-recycle fixed point.
//!
//! The recycle loop makes the flow graph cyclic: the blended stage-1
//! feed depends on the final-stage concentrate, which depends on the
//! blended feed. Solved as a damped fixed point on the single scalar
//! Q_conc_N, never as a general flowsheet.
//!
//! Basis discipline: the SYSTEM recovery is (Q_f − Q_disposal)/Q_f on
//! the fresh feed Q_f. The blended stage-1 feed is larger; using it as
//! the recovery denominator is the historical bug this module's outputs
//! are shaped to prevent.

use log::debug;

use osmo_math::fixed_point;
use osmo_types::config::ArrayDesignSettings;
use osmo_types::deadline::Deadline;
use osmo_types::error::{OsmoError, OsmoResult};

use crate::search::best_stage_max_recovery;
use crate::stage::{StageContext, StageWorking};
use crate::trim::trim_to_target;

/// Under-relaxation for the Q_conc_N iteration.
const RELAXATION: f64 = 0.5;
/// Relative convergence tolerance on Q_conc_N.
const REL_TOL: f64 = 1e-3;
const MAX_ITERATIONS: usize = 50;
/// Recovery tolerance handed to the flux trim inside the loop. Tight,
/// so the array lands on the effective target and the concentrate flow
/// the fixed point sees is smooth in the iterate.
const INNER_TRIM_TOL: f64 = 0.001;

/// A converged recycle design for one stage count.
#[derive(Debug, Clone)]
pub struct RecycleDesign {
    pub stages: Vec<StageWorking>,
    pub recycle_flow_m3h: f64,
    /// Fraction of final-stage concentrate diverted back to the feed.
    pub split_ratio: f64,
    pub disposal_flow_m3h: f64,
    pub blended_feed_m3h: f64,
    /// System recovery on the fresh-feed basis.
    pub system_recovery: f64,
    pub iterations: usize,
}

/// Design the K-stage array for a blended feed, greedy then trimmed to
/// the effective recovery target. `None` when any stage is infeasible.
fn design_stages(
    blended_feed_m3h: f64,
    effective_target: f64,
    contexts: &[StageContext],
) -> Option<Vec<StageWorking>> {
    let mut stages = Vec::with_capacity(contexts.len());
    let mut current = blended_feed_m3h;
    for ctx in contexts {
        let candidate = best_stage_max_recovery(current, ctx)?;
        stages.push(StageWorking {
            ctx: *ctx,
            feed_m3h: current,
            candidate,
        });
        current = candidate.concentrate_m3h;
    }
    let total: f64 = stages.iter().map(|s| s.candidate.permeate_m3h).sum();
    if total / blended_feed_m3h > effective_target {
        trim_to_target(&mut stages, blended_feed_m3h, effective_target, INNER_TRIM_TOL);
    }
    Some(stages)
}

/// Solve the recycle fixed point for a K-stage array.
///
/// Returns `Ok(None)` when the loop is hydraulically infeasible (pruned
/// silently by the caller); `ConvergenceFailure` when the fixed point
/// does not settle within budget.
pub fn solve(
    fresh_feed_m3h: f64,
    target_recovery: f64,
    contexts: &[StageContext],
    settings: &ArrayDesignSettings,
    deadline: &Deadline,
) -> OsmoResult<Option<RecycleDesign>> {
    let required_permeate = fresh_feed_m3h * target_recovery;
    let required_disposal = fresh_feed_m3h - required_permeate;
    let max_split = settings.max_recycle_ratio;

    let recycle_for = |conc_n: f64| -> f64 {
        (conc_n - required_disposal).clamp(0.0, max_split * conc_n)
    };

    // One fixed-point step: assume a final concentrate flow, size the
    // recycle from the disposal requirement, redesign the array on the
    // blended feed, observe the concentrate it actually produces.
    let step = |conc_n: f64| -> OsmoResult<f64> {
        deadline.check()?;
        let recycle = recycle_for(conc_n);
        let blended = fresh_feed_m3h + recycle;
        let effective_target = required_permeate / blended;
        let stages = design_stages(blended, effective_target, contexts)
            .ok_or_else(|| {
                OsmoError::NoFeasibleConfiguration(format!(
                    "no {}-stage design for blended feed {blended:.1} m³/h",
                    contexts.len()
                ))
            })?;
        let conc_out = stages
            .last()
            .map(|s| s.candidate.concentrate_m3h)
            .unwrap_or(0.0);
        debug!(
            "recycle step: conc {conc_n:.2} → recycle {recycle:.2} → conc {conc_out:.2}"
        );
        Ok(conc_out)
    };

    let solution = match fixed_point::solve_damped(
        2.0 * required_disposal,
        RELAXATION,
        REL_TOL,
        MAX_ITERATIONS,
        step,
    ) {
        Ok(solution) => solution,
        // Hydraulic infeasibility prunes this stage count quietly.
        Err(OsmoError::NoFeasibleConfiguration(_)) => return Ok(None),
        Err(other) => return Err(other),
    };

    // Freeze the converged design.
    let recycle = recycle_for(solution.x);
    let blended = fresh_feed_m3h + recycle;
    let effective_target = required_permeate / blended;
    let stages = match design_stages(blended, effective_target, contexts) {
        Some(stages) => stages,
        None => return Ok(None),
    };
    let conc_n = stages
        .last()
        .map(|s| s.candidate.concentrate_m3h)
        .unwrap_or(0.0);
    if conc_n <= 0.0 || recycle >= conc_n {
        return Ok(None);
    }

    let disposal = conc_n - recycle;
    let system_recovery = (fresh_feed_m3h - disposal) / fresh_feed_m3h;
    if system_recovery < target_recovery - settings.recovery_tolerance {
        // Even at the converged split this stage count under-delivers.
        return Ok(None);
    }

    Ok(Some(RecycleDesign {
        stages,
        recycle_flow_m3h: recycle,
        split_ratio: recycle / conc_n,
        disposal_flow_m3h: disposal,
        blended_feed_m3h: blended,
        system_recovery,
        iterations: solution.iterations,
    }))
}
