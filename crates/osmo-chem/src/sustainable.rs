// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Sustainable Recovery
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Maximum recovery at which every mineral SI stays within its ceiling.
//!
//! Bisection over recovery; each probe is one full engine run, so the
//! search costs O(log(1/ε)) ≈ 7–10 chemistry evaluations.

use log::debug;
use osmo_math::bisect::{self, Boundary};
use osmo_types::config::{Mineral, SiThresholds};
use osmo_types::deadline::Deadline;
use osmo_types::error::OsmoResult;

use crate::composition::WaterComposition;
use crate::scaling::ScalingEvaluator;

/// Search bracket and resolution (spec'd: [0.1, 0.99] at 0.01).
const R_MIN: f64 = 0.10;
const R_MAX: f64 = 0.99;
const R_RESOLUTION: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SustainableRecovery {
    /// Largest recovery meeting every ceiling. 0.0 when even the lower
    /// bracket violates.
    pub r_max: f64,
    /// The mineral that capped the search, if any did.
    pub limiting_mineral: Option<Mineral>,
    /// Saturation indices at `r_max`.
    pub si_at_max: Vec<(Mineral, f64)>,
}

/// Find the maximum sustainable recovery for a feed.
///
/// `fixed_ph` holds the feed pH through the concentration step (used by
/// the pH optimizer); otherwise pH floats to its equilibrium value.
pub fn max_sustainable_recovery(
    evaluator: &ScalingEvaluator<'_>,
    feed: &WaterComposition,
    ph: f64,
    temperature_c: f64,
    thresholds: &SiThresholds,
    fixed_ph: bool,
    deadline: &Deadline,
) -> OsmoResult<SustainableRecovery> {
    let mut limiting: Option<Mineral> = None;

    let boundary = bisect::max_feasible(R_MIN, R_MAX, R_RESOLUTION, |recovery| {
        deadline.check()?;
        let report =
            evaluator.concentrate_at_recovery(feed, ph, temperature_c, recovery, fixed_ph)?;
        match ScalingEvaluator::worst_violation(&report, thresholds) {
            Some(violation) => {
                debug!(
                    "R={recovery:.3}: {:?} SI {:.2} exceeds {:.2}",
                    violation.mineral, violation.si, violation.limit
                );
                limiting = Some(violation.mineral);
                Ok(false)
            }
            None => Ok(true),
        }
    })?;

    let r_max = match boundary {
        Boundary::AllInfeasible => 0.0,
        Boundary::AllFeasible(r) | Boundary::At(r) => r,
    };

    let si_at_max = if r_max > 0.0 {
        evaluator
            .concentrate_at_recovery(feed, ph, temperature_c, r_max, fixed_ph)?
            .saturation_indices
    } else {
        evaluator
            .speciate_feed(feed, ph, temperature_c)?
            .saturation_indices
    };

    debug!(
        "sustainable recovery {:.2} (limited by {:?})",
        r_max, limiting
    );

    Ok(SustainableRecovery {
        r_max,
        limiting_mineral: limiting,
        si_at_max,
    })
}
