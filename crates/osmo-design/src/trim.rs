// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Global Flux Trim
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Redistributes flux across stages after the greedy per-stage pass, so
//! the array lands on the recovery target instead of overshooting, with
//! each stage as close to its flux target as the balance allows.
//!
//! Adjustments are weighted by per-stage flexibility (distance to the
//! lower band edge) and damped. The emergency floor below the normal
//! band opens only once the band itself is exhausted. Downstream feed
//! flows are re-propagated after every adjustment.

use log::debug;

use crate::stage::{evaluate_at_flux, StageWorking};

const MAX_TRIM_ITERATIONS: usize = 30;
/// Damping when the array is still overshooting beyond tolerance.
const DAMPING_AGGRESSIVE: f64 = 0.9;
const DAMPING_CONSERVATIVE: f64 = 0.7;

/// Outcome of a trim pass.
#[derive(Debug, Clone, Copy)]
pub struct TrimReport {
    pub iterations: usize,
    pub final_recovery: f64,
    /// Stages left below the normal flux band, 0-based indices as bits.
    pub relaxed_stages: u8,
}

/// Trim the array toward `target` overall recovery on `base_feed`,
/// stopping once the error is within `tolerance / 2`.
///
/// Only shrinks overshoot; an undershooting array is returned unchanged
/// (the greedy pass already ran every stage at its band top).
pub fn trim_to_target(
    stages: &mut [StageWorking],
    base_feed_m3h: f64,
    target: f64,
    tolerance: f64,
) -> TrimReport {
    let mut iterations = 0;
    let mut relaxed: u8 = 0;

    for iteration in 0..MAX_TRIM_ITERATIONS {
        iterations = iteration;
        let total_permeate: f64 = stages.iter().map(|s| s.candidate.permeate_m3h).sum();
        let recovery = total_permeate / base_feed_m3h;
        let error = recovery - target;

        if error.abs() <= tolerance / 2.0 {
            break;
        }
        // The greedy pass is already the recovery ceiling; a fresh
        // undershoot has nothing to restore.
        if error < 0.0 && iteration == 0 {
            break;
        }
        let reducing = error > 0.0;

        // Flexibility toward the needed direction, inside the normal
        // band first.
        let band_flex: Vec<f64> = stages
            .iter()
            .map(|s| {
                let room = if reducing {
                    s.candidate.flux_lmh - s.ctx.flux_lo_lmh
                } else {
                    s.ctx.flux_hi_lmh - s.candidate.flux_lmh
                };
                room.max(0.0) / s.ctx.flux_target_lmh
            })
            .collect();
        let band_total: f64 = band_flex.iter().sum();

        // The floor opens only for cuts, and only when the band is spent.
        let use_floor = reducing && band_total <= 1e-12;
        let (weights, weight_total): (Vec<f64>, f64) = if use_floor {
            let floor_flex: Vec<f64> = stages
                .iter()
                .map(|s| {
                    (s.candidate.flux_lmh - s.ctx.flux_floor_lmh).max(0.0)
                        / s.ctx.flux_target_lmh
                })
                .collect();
            let total: f64 = floor_flex.iter().sum();
            (floor_flex, total)
        } else {
            (band_flex, band_total)
        };
        if weight_total <= 1e-12 {
            break;
        }

        let required_permeate_change = -error * base_feed_m3h;
        let damping = if error.abs() > tolerance {
            DAMPING_AGGRESSIVE
        } else {
            DAMPING_CONSERVATIVE
        };

        for idx in 0..stages.len() {
            let weight = weights[idx] / weight_total;
            if weight <= 0.0 {
                continue;
            }
            let stage = stages[idx];
            let permeate_change = required_permeate_change * weight * damping;
            let flux_change = permeate_change * 1000.0
                / (stage.candidate.n_vessels as f64 * stage.ctx.vessel_area_m2);

            let lower_bound = if use_floor || stage.candidate.flux_lmh < stage.ctx.flux_lo_lmh
            {
                stage.ctx.flux_floor_lmh
            } else {
                stage.ctx.flux_lo_lmh
            };
            let new_flux = (stage.candidate.flux_lmh + flux_change)
                .clamp(lower_bound, stage.ctx.flux_hi_lmh);

            if let Some(candidate) = evaluate_at_flux(
                stage.candidate.n_vessels,
                stage.feed_m3h,
                new_flux,
                &stage.ctx,
            ) {
                stages[idx].candidate = candidate;
                if new_flux < stage.ctx.flux_lo_lmh - 1e-9 {
                    relaxed |= 1 << idx;
                }
                // Mass balance: the next stage eats this concentrate.
                if idx + 1 < stages.len() {
                    propagate_feed(stages, idx + 1, candidate.concentrate_m3h);
                }
            }
        }
    }

    let total_permeate: f64 = stages.iter().map(|s| s.candidate.permeate_m3h).sum();
    let report = TrimReport {
        iterations: iterations + 1,
        final_recovery: total_permeate / base_feed_m3h,
        relaxed_stages: relaxed,
    };
    debug!(
        "flux trim: {} iterations, recovery {:.4}",
        report.iterations, report.final_recovery
    );
    report
}

/// Re-evaluate stage `idx` (and everything downstream) on a new feed.
fn propagate_feed(stages: &mut [StageWorking], idx: usize, feed_m3h: f64) {
    if idx >= stages.len() {
        return;
    }
    stages[idx].feed_m3h = feed_m3h;
    if let Some(candidate) = evaluate_at_flux(
        stages[idx].candidate.n_vessels,
        feed_m3h,
        stages[idx].candidate.flux_lmh,
        &stages[idx].ctx,
    ) {
        stages[idx].candidate = candidate;
        if idx + 1 < stages.len() {
            propagate_feed(stages, idx + 1, candidate.concentrate_m3h);
        }
    }
}
