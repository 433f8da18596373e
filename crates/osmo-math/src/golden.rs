// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Golden-Section Search
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Derivative-free 1-D maximization on a bracket.
//!
//! One objective evaluation per iteration after the first; the objective
//! here is typically a full sustainable-recovery computation, so probe
//! economy matters more than convergence order.

use osmo_types::error::OsmoResult;

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Maximize `f` on [a, b] to a bracket width of `tol`.
///
/// Returns the best probe point and its objective value.
pub fn maximize<F>(a: f64, b: f64, tol: f64, max_iter: usize, mut f: F) -> OsmoResult<(f64, f64)>
where
    F: FnMut(f64) -> OsmoResult<f64>,
{
    debug_assert!(a < b);
    let mut lo = a;
    let mut hi = b;

    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = f(x1)?;
    let mut f2 = f(x2)?;

    for _ in 0..max_iter {
        if hi - lo <= tol {
            break;
        }
        if f1 >= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = f(x1)?;
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = f(x2)?;
        }
    }

    if f1 >= f2 {
        Ok((x1, f1))
    } else {
        Ok((x2, f2))
    }
}
