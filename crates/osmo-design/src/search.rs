// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Vessel Search Strategies
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scale-aware search over vessel counts.
//!
//! Small banks are enumerated exhaustively; medium banks use a geometric
//! ladder with linear refinement; large banks use binary search on the
//! (monotone) recovery-vs-vessels relation.

use log::debug;

use crate::stage::{best_at_vessels, evaluate_at_flux, StageCandidate, StageContext};

/// Exhaustive enumeration ceiling.
const EXHAUSTIVE_LIMIT: usize = 100;
/// Geometric-ladder ceiling; binary search above.
const GEOMETRIC_LIMIT: usize = 1000;

/// Best stage candidate maximizing recovery, strategy chosen by scale.
pub fn best_stage_max_recovery(feed_m3h: f64, ctx: &StageContext) -> Option<StageCandidate> {
    let max_vessels = ctx.max_vessels(feed_m3h);
    if max_vessels == 0 {
        return None;
    }
    if max_vessels <= EXHAUSTIVE_LIMIT {
        exhaustive_max_recovery(feed_m3h, max_vessels, ctx)
    } else if max_vessels <= GEOMETRIC_LIMIT {
        debug!("geometric search over {max_vessels} potential vessels");
        geometric_max_recovery(feed_m3h, max_vessels, ctx)
    } else {
        debug!("binary search over {max_vessels} potential vessels");
        binary_max_recovery(feed_m3h, max_vessels, ctx)
    }
}

fn exhaustive_max_recovery(
    feed_m3h: f64,
    max_vessels: usize,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    let mut best: Option<StageCandidate> = None;
    for n in (1..=max_vessels).rev() {
        if let Some(candidate) = best_at_vessels(n, feed_m3h, ctx) {
            if best.map_or(true, |b| candidate.recovery > b.recovery) {
                best = Some(candidate);
            }
        }
    }
    best
}

fn geometric_max_recovery(
    feed_m3h: f64,
    max_vessels: usize,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    // Coarse pass: powers of two up to the bound.
    let mut ladder: Vec<usize> = Vec::new();
    let mut n = 1usize;
    while n < max_vessels {
        ladder.push(n);
        n *= 2;
    }
    ladder.push(max_vessels);

    let mut best: Option<StageCandidate> = None;
    let mut best_idx = 0usize;
    for (idx, &n) in ladder.iter().enumerate() {
        if let Some(candidate) = best_at_vessels(n, feed_m3h, ctx) {
            if best.map_or(true, |b| candidate.recovery > b.recovery) {
                best = Some(candidate);
                best_idx = idx;
            }
        }
    }
    best?;

    // Refinement: linear probes around the best rung.
    let lo = if best_idx > 0 { ladder[best_idx - 1] } else { 1 };
    let hi = *ladder.get(best_idx + 1).unwrap_or(&max_vessels);
    let span = hi.saturating_sub(lo);
    let step = (span / 10).max(1);
    let mut n = lo;
    while n <= hi {
        if let Some(candidate) = best_at_vessels(n, feed_m3h, ctx) {
            if best.map_or(true, |b| candidate.recovery > b.recovery) {
                best = Some(candidate);
            }
        }
        n += step;
    }
    best
}

fn binary_max_recovery(
    feed_m3h: f64,
    max_vessels: usize,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    // Recovery grows with vessel count until the fouling constraint bites;
    // find the largest admissible count.
    let mut lo = 1usize;
    let mut hi = max_vessels;
    let mut best: Option<StageCandidate> = None;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        match best_at_vessels(mid, feed_m3h, ctx) {
            Some(candidate) => {
                if best.map_or(true, |b| candidate.recovery > b.recovery) {
                    best = Some(candidate);
                }
                lo = mid + 1;
            }
            None => {
                // Above the admissible region.
                hi = mid - 1;
            }
        }
    }
    best
}

/// Single-stage design for a specific recovery target.
///
/// Picks the vessel count whose exact-target flux lands nearest the
/// stage target inside the band; for targets too small for even one
/// vessel inside the band, falls back to one vessel at the bottom of the
/// band (minimal overshoot).
pub fn single_stage_for_target(
    feed_m3h: f64,
    target_recovery: f64,
    ctx: &StageContext,
) -> Option<StageCandidate> {
    let max_vessels = ctx.max_vessels(feed_m3h);
    if max_vessels == 0 {
        return None;
    }

    let required_permeate = feed_m3h * target_recovery;
    let n_ideal = (required_permeate * 1000.0 / (ctx.flux_target_lmh * ctx.vessel_area_m2))
        .round()
        .max(1.0) as usize;

    let mut best: Option<(f64, StageCandidate)> = None;
    let lo = n_ideal.saturating_sub(3).max(1);
    let hi = (n_ideal + 3).min(max_vessels);
    for n in lo..=hi {
        let flux_exact = required_permeate * 1000.0 / (n as f64 * ctx.vessel_area_m2);
        if flux_exact < ctx.flux_lo_lmh || flux_exact > ctx.flux_hi_lmh {
            continue;
        }
        if let Some(candidate) = evaluate_at_flux(n, feed_m3h, flux_exact, ctx) {
            let deviation = (flux_exact / ctx.flux_target_lmh - 1.0).abs();
            if best.as_ref().map_or(true, |(d, _)| deviation < *d) {
                best = Some((deviation, candidate));
            }
        }
    }
    if let Some((_, candidate)) = best {
        return Some(candidate);
    }

    // Tiny targets: one vessel at the bottom of the band still overshoots;
    // return the minimal-overshoot point if it at least meets the target.
    let minimal = evaluate_at_flux(1, feed_m3h, ctx.flux_lo_lmh, ctx)?;
    (minimal.recovery >= target_recovery).then_some(minimal)
}
