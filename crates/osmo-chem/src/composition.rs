// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Water Composition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Validated ion composition (mg/L), immutable after construction.
//!
//! Validation order: label normalization → signed-equivalent charge
//! balance (auto-balance via the dominant counter-ion when the residual
//! exceeds 2%, refusal above 10%) → TDS reconciliation against the
//! reported value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use osmo_types::error::{OsmoError, OsmoResult};
use osmo_types::ions::{registry, IonRecord};

/// Residual above which the dominant counter-ion absorbs the imbalance.
const BALANCE_TRIGGER: f64 = 0.02;

/// Residual beyond which auto-balance is refused.
const BALANCE_LIMIT: f64 = 0.10;

/// Allowed relative disagreement between reported TDS and the ion sum.
const TDS_TOLERANCE: f64 = 0.10;

/// An ordered, normalized ion map in mg/L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterComposition {
    mg_l: BTreeMap<String, f64>,
}

/// Result of feed validation: the normalized composition plus what the
/// validator did to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedFeed {
    pub composition: WaterComposition,
    /// TDS after reconciliation (the ion sum).
    pub tds_mg_l: f64,
    /// Signed residual |Σeq| / Σ|eq| before any balancing.
    pub charge_residual_reported: f64,
    /// Ion adjusted to absorb the imbalance, with the mg/L delta applied.
    pub auto_balanced: Option<(String, f64)>,
}

impl WaterComposition {
    /// Validate a raw caller-supplied ion map (C2 contract).
    pub fn validate<'a, I>(raw: I, reported_tds_mg_l: Option<f64>) -> OsmoResult<ValidatedFeed>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let reg = registry();
        let mut mg_l: BTreeMap<String, f64> = BTreeMap::new();

        for (label, conc) in raw {
            if !conc.is_finite() || conc < 0.0 {
                return Err(OsmoError::InvalidComposition(format!(
                    "concentration for '{label}' must be finite and >= 0, got {conc}"
                )));
            }
            let rec = reg.resolve(label)?;
            *mg_l.entry(rec.symbol.to_string()).or_insert(0.0) += conc;
        }
        if mg_l.is_empty() {
            return Err(OsmoError::InvalidComposition(
                "ion composition is empty".into(),
            ));
        }

        let mut composition = WaterComposition { mg_l };
        let residual = composition.charge_imbalance();

        let mut auto_balanced = None;
        if residual.abs() > BALANCE_TRIGGER {
            if residual.abs() > BALANCE_LIMIT {
                return Err(OsmoError::InvalidComposition(format!(
                    "charge imbalance {:.1}% exceeds the {:.0}% auto-balance limit",
                    residual * 100.0,
                    BALANCE_LIMIT * 100.0
                )));
            }
            auto_balanced = Some(composition.balance_dominant_counter_ion()?);
        }

        let tds = composition.tds_mg_l();
        if let Some(reported) = reported_tds_mg_l {
            if reported <= 0.0 || !reported.is_finite() {
                return Err(OsmoError::InvalidComposition(format!(
                    "reported TDS must be positive, got {reported}"
                )));
            }
            if (reported - tds).abs() / tds > TDS_TOLERANCE {
                return Err(OsmoError::InvalidComposition(format!(
                    "reported TDS {reported:.0} mg/L disagrees with ion sum {tds:.0} mg/L by more than {:.0}%",
                    TDS_TOLERANCE * 100.0
                )));
            }
        }

        Ok(ValidatedFeed {
            composition,
            tds_mg_l: tds,
            charge_residual_reported: residual,
            auto_balanced,
        })
    }

    /// Build from already-canonical symbols without the validation pass.
    /// For internal producers (engine output, stage mass balances) whose
    /// inputs were validated upstream.
    pub fn from_canonical<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        WaterComposition {
            mg_l: entries.into_iter().filter(|(_, c)| *c > 0.0).collect(),
        }
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.mg_l.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.mg_l.iter().map(|(s, c)| (s.as_str(), *c))
    }

    /// Iterate with the resolved ion records.
    pub fn iter_records(&self) -> impl Iterator<Item = (&'static IonRecord, f64)> + '_ {
        self.mg_l.iter().map(|(s, c)| {
            let rec = registry()
                .resolve(s)
                .expect("canonical symbols always resolve");
            (rec, *c)
        })
    }

    pub fn len(&self) -> usize {
        self.mg_l.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mg_l.is_empty()
    }

    /// Sum of ion concentrations (mg/L).
    pub fn tds_mg_l(&self) -> f64 {
        self.mg_l.values().sum()
    }

    /// Total molar concentration of dissolved species (mol/L).
    pub fn molar_sum(&self) -> f64 {
        self.iter_records().map(|(r, c)| r.molar_mg_l(c)).sum()
    }

    /// Ionic strength I = ½ Σ mᵢ zᵢ² (mol/L).
    pub fn ionic_strength(&self) -> f64 {
        0.5 * self
            .iter_records()
            .map(|(r, c)| r.molar_mg_l(c) * (r.charge as f64).powi(2))
            .sum::<f64>()
    }

    /// Signed charge residual: Σ eqᵢ / Σ |eqᵢ|. Positive means cation
    /// excess.
    pub fn charge_imbalance(&self) -> f64 {
        let mut signed = 0.0;
        let mut total = 0.0;
        for (rec, conc) in self.iter_records() {
            let eq = rec.equivalents_mg_l(conc);
            signed += eq;
            total += eq.abs();
        }
        if total == 0.0 {
            0.0
        } else {
            signed / total
        }
    }

    /// Uniform concentration scaling (mass-balance CF). Speciation-free;
    /// concentrate chemistry for scaling purposes goes through PHREEQC.
    pub fn scaled(&self, factor: f64) -> Self {
        WaterComposition {
            mg_l: self
                .mg_l
                .iter()
                .map(|(s, c)| (s.clone(), c * factor))
                .collect(),
        }
    }

    /// Flow-weighted blend of two streams.
    pub fn blend(flow_a_m3h: f64, a: &Self, flow_b_m3h: f64, b: &Self) -> Self {
        let total = flow_a_m3h + flow_b_m3h;
        if total < 1e-9 {
            return a.clone();
        }
        let mut mg_l = BTreeMap::new();
        for (s, c) in a.mg_l.iter() {
            *mg_l.entry(s.clone()).or_insert(0.0) += flow_a_m3h * c;
        }
        for (s, c) in b.mg_l.iter() {
            *mg_l.entry(s.clone()).or_insert(0.0) += flow_b_m3h * c;
        }
        for c in mg_l.values_mut() {
            *c /= total;
        }
        WaterComposition { mg_l }
    }

    /// Restore electroneutrality by adjusting the dominant counter-ion.
    /// Returns the adjusted symbol and the mg/L delta applied.
    fn balance_dominant_counter_ion(&mut self) -> OsmoResult<(String, f64)> {
        let reg = registry();
        let signed_eq: f64 = self
            .iter_records()
            .map(|(r, c)| r.equivalents_mg_l(c))
            .sum();

        // Counter-ion: largest-magnitude species of opposite sign.
        let target = self
            .mg_l
            .iter()
            .filter_map(|(s, c)| {
                let rec = reg.resolve(s).ok()?;
                let eq = rec.equivalents_mg_l(*c);
                (eq * signed_eq < 0.0).then_some((s.clone(), rec, eq))
            })
            .max_by(|a, b| a.2.abs().total_cmp(&b.2.abs()));

        let (symbol, rec, _) = target.ok_or_else(|| {
            OsmoError::InvalidComposition(
                "cannot auto-balance: no counter-ion of opposite sign present".into(),
            )
        })?;

        // Δc such that the counter-ion absorbs the full signed excess.
        let delta_mg_l = signed_eq.abs() * rec.molar_mass / rec.charge.unsigned_abs() as f64;
        *self.mg_l.get_mut(&symbol).expect("target exists") += delta_mg_l;
        Ok((symbol, delta_mg_l))
    }

    /// A copy with electroneutrality restored, regardless of residual
    /// magnitude. Producers of derived streams (permeate, concentrate)
    /// use this to keep invariant compositions balanced.
    pub fn rebalanced(&self) -> Self {
        let mut out = self.clone();
        if out.charge_imbalance().abs() > 1e-9 {
            let _ = out.balance_dominant_counter_ion();
        }
        out
    }
}
