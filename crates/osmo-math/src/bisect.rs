// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Monotone Bisection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bisection for the feasibility boundary of a monotone predicate.
//!
//! Used to find the largest x in [lo, hi] for which `feasible(x)` holds,
//! assuming feasibility is contiguous from `lo` upward (true below the
//! boundary, false above). Each probe may be expensive (a full chemistry
//! run), so the probe count is O(log((hi-lo)/resolution)).

use osmo_types::error::OsmoResult;

/// Outcome of a feasibility bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Even the lower bound is infeasible.
    AllInfeasible,
    /// The whole interval is feasible; value is `hi`.
    AllFeasible(f64),
    /// Largest feasible value found at the stated resolution.
    At(f64),
}

impl Boundary {
    /// The largest feasible value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Boundary::AllInfeasible => None,
            Boundary::AllFeasible(x) | Boundary::At(x) => Some(*x),
        }
    }
}

/// Find the largest feasible x in [lo, hi] to within `resolution`.
///
/// The predicate may fail (engine error); failures propagate immediately.
pub fn max_feasible<F>(
    lo: f64,
    hi: f64,
    resolution: f64,
    mut feasible: F,
) -> OsmoResult<Boundary>
where
    F: FnMut(f64) -> OsmoResult<bool>,
{
    debug_assert!(lo < hi);
    debug_assert!(resolution > 0.0);

    if !feasible(lo)? {
        return Ok(Boundary::AllInfeasible);
    }
    if feasible(hi)? {
        return Ok(Boundary::AllFeasible(hi));
    }

    let mut lo = lo;
    let mut hi = hi;
    while hi - lo > resolution {
        let mid = 0.5 * (lo + hi);
        if feasible(mid)? {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(Boundary::At(lo))
}
