// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Deadline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cooperative request deadline.
//!
//! The core is single-threaded per request; long-running loops (vessel
//! search, bisection, golden-section, recycle fixed point, stage sweep)
//! call `check()` at iteration boundaries and surface `Cancelled` on
//! expiry.

use std::time::{Duration, Instant};

use crate::error::{OsmoError, OsmoResult};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// No deadline; `check()` always succeeds.
    pub fn none() -> Self {
        Deadline { expires_at: None }
    }

    /// Deadline a duration from now.
    pub fn within(budget: Duration) -> Self {
        Deadline {
            expires_at: Some(Instant::now() + budget),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(t) if Instant::now() >= t)
    }

    pub fn check(&self) -> OsmoResult<()> {
        if self.is_expired() {
            Err(OsmoError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_expires() {
        let d = Deadline::none();
        assert!(!d.is_expired());
        d.check().unwrap();
    }

    #[test]
    fn test_zero_budget_expires_immediately() {
        let d = Deadline::within(Duration::from_secs(0));
        assert!(d.is_expired());
        assert!(matches!(d.check(), Err(OsmoError::Cancelled)));
    }

    #[test]
    fn test_generous_budget_not_expired() {
        let d = Deadline::within(Duration::from_secs(3600));
        d.check().unwrap();
    }
}
