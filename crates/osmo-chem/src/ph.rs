// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — pH / Recovery Optimizer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One-dimensional search over feed pH maximizing sustainable recovery,
//! plus reagent dosing to reach a chosen pH.
//!
//! Each pH probe holds the probe value through the concentration step
//! (acid/base feed is assumed continuous) and runs the full
//! sustainable-recovery bisection, so a probe costs ~7–10 engine runs.

use log::debug;
use serde::{Deserialize, Serialize};

use osmo_math::golden;
use osmo_types::config::{ReagentPrices, SiThresholds};
use osmo_types::deadline::Deadline;
use osmo_types::error::{OsmoError, OsmoResult};

use crate::composition::WaterComposition;
use crate::scaling::ScalingEvaluator;
use crate::sustainable::{max_sustainable_recovery, SustainableRecovery};

/// Chemically sensible feed-pH window for polyamide RO.
const PH_LO: f64 = 5.5;
const PH_HI: f64 = 9.0;

/// Bracket width at which the golden-section search stops.
const PH_TOL: f64 = 0.05;
const PH_MAX_ITER: usize = 16;

#[derive(Debug, Clone)]
pub struct PhOptimum {
    pub optimal_ph: f64,
    /// Sustainable recovery at the optimal pH.
    pub r_max: f64,
    /// Sustainable recovery at the unadjusted feed pH, for comparison.
    pub baseline: SustainableRecovery,
}

/// Golden-section search over feed pH for the largest sustainable
/// recovery.
pub fn maximize_sustainable_recovery(
    evaluator: &ScalingEvaluator<'_>,
    feed: &WaterComposition,
    feed_ph: f64,
    temperature_c: f64,
    thresholds: &SiThresholds,
    deadline: &Deadline,
) -> OsmoResult<PhOptimum> {
    let baseline = max_sustainable_recovery(
        evaluator,
        feed,
        feed_ph,
        temperature_c,
        thresholds,
        false,
        deadline,
    )?;

    let (optimal_ph, r_max) = golden::maximize(PH_LO, PH_HI, PH_TOL, PH_MAX_ITER, |ph| {
        deadline.check()?;
        let result = max_sustainable_recovery(
            evaluator,
            feed,
            ph,
            temperature_c,
            thresholds,
            true,
            deadline,
        )?;
        debug!("pH probe {ph:.2}: r_max {:.3}", result.r_max);
        Ok(result.r_max)
    })?;

    // Keep the native pH when adjustment buys nothing.
    if baseline.r_max >= r_max {
        return Ok(PhOptimum {
            optimal_ph: feed_ph,
            r_max: baseline.r_max,
            baseline,
        });
    }

    Ok(PhOptimum {
        optimal_ph,
        r_max,
        baseline,
    })
}

/// pH-adjustment reagents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reagent {
    NaOH,
    Lime,
    SodaAsh,
    HCl,
    H2SO4,
    CO2,
}

impl Reagent {
    /// Grams of reagent per mole of acid/base equivalent delivered.
    fn grams_per_equivalent(&self) -> f64 {
        match self {
            Reagent::NaOH => 40.00,
            Reagent::Lime => 74.09 / 2.0,
            Reagent::SodaAsh => 105.99,
            Reagent::HCl => 36.46,
            Reagent::H2SO4 => 98.08 / 2.0,
            Reagent::CO2 => 44.01,
        }
    }

    fn is_base(&self) -> bool {
        matches!(self, Reagent::NaOH | Reagent::Lime | Reagent::SodaAsh)
    }

    fn price_usd_kg(&self, prices: &ReagentPrices) -> f64 {
        match self {
            Reagent::NaOH => prices.naoh_usd_kg,
            Reagent::Lime => prices.lime_usd_kg,
            Reagent::SodaAsh => prices.soda_ash_usd_kg,
            Reagent::HCl => prices.hcl_usd_kg,
            Reagent::H2SO4 => prices.h2so4_usd_kg,
            Reagent::CO2 => prices.co2_usd_kg,
        }
    }
}

/// One reagent option for a pH move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseEstimate {
    pub reagent: Reagent,
    pub dose_mg_l: f64,
    pub cost_usd_m3: f64,
}

/// Sulfuric acid is excluded when the feed already carries this much
/// sulfate (gypsum risk outweighs the price advantage).
const H2SO4_SULFATE_LIMIT_MG_L: f64 = 250.0;

/// Reagent doses to move the feed from `current_ph` to `target_ph`,
/// ranked by cost per m³ of feed.
///
/// Dose via the bicarbonate buffer-capacity estimate; feasibility of the
/// target pH itself is the caller's concern (probe it through the
/// evaluator).
pub fn dose_to_reach(
    feed: &WaterComposition,
    current_ph: f64,
    target_ph: f64,
    prices: &ReagentPrices,
) -> OsmoResult<Vec<DoseEstimate>> {
    if !(2.0..=12.0).contains(&target_ph) {
        return Err(OsmoError::ChemistryError(format!(
            "target pH {target_ph} outside [2, 12]"
        )));
    }
    let delta = target_ph - current_ph;
    if delta.abs() < 0.1 {
        return Ok(vec![]);
    }

    // Buffer capacity (mmol per L per pH unit), dominated by alkalinity.
    let alkalinity_mg_l = feed.get("HCO3-") + feed.get("CO3-2") * 60.01 / 61.02;
    let buffer_mmol_l = 0.5 + alkalinity_mg_l / 100.0;
    let equivalents_mol_l = delta.abs() * buffer_mmol_l / 1000.0;

    let candidates: Vec<Reagent> = if delta > 0.0 {
        vec![Reagent::NaOH, Reagent::Lime, Reagent::SodaAsh]
    } else {
        let mut acids = vec![Reagent::HCl, Reagent::CO2];
        if feed.get("SO4-2") < H2SO4_SULFATE_LIMIT_MG_L {
            acids.push(Reagent::H2SO4);
        }
        acids
    };

    let mut estimates: Vec<DoseEstimate> = candidates
        .into_iter()
        .map(|reagent| {
            debug_assert_eq!(reagent.is_base(), delta > 0.0);
            let dose_mg_l = equivalents_mol_l * reagent.grams_per_equivalent() * 1000.0;
            // mg/L of feed is g/m³; price is $/kg.
            let cost_usd_m3 = dose_mg_l * reagent.price_usd_kg(prices) / 1000.0;
            DoseEstimate {
                reagent,
                dose_mg_l,
                cost_usd_m3,
            }
        })
        .collect();

    estimates.sort_by(|a, b| a.cost_usd_m3.total_cmp(&b.cost_usd_m3));
    Ok(estimates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phreeqc::MockPhreeqc;
    use osmo_types::config::AntiscalantTier;

    fn carbonate_water() -> WaterComposition {
        // Calcite-prone: Ca + alkalinity, balanced with Na/Cl.
        WaterComposition::validate(
            [
                ("Ca2+", 200.0),
                ("Na+", 150.0),
                ("HCO3-", 300.0),
                ("Cl-", 400.0),
                ("SO4-2", 150.0),
            ],
            None,
        )
        .unwrap()
        .composition
    }

    #[test]
    fn test_acidification_beats_native_ph() {
        let engine = MockPhreeqc::new();
        let evaluator = ScalingEvaluator::new(&engine);
        let thresholds = SiThresholds::for_tier(AntiscalantTier::Standard);
        let optimum = maximize_sustainable_recovery(
            &evaluator,
            &carbonate_water(),
            8.0,
            25.0,
            &thresholds,
            &Deadline::none(),
        )
        .unwrap();
        assert!(
            optimum.optimal_ph < 7.0,
            "calcite suppression wants acid, got pH {}",
            optimum.optimal_ph
        );
        assert!(
            optimum.r_max > optimum.baseline.r_max,
            "optimized {} must beat baseline {}",
            optimum.r_max,
            optimum.baseline.r_max
        );
    }

    #[test]
    fn test_downward_dose_ranked_by_cost() {
        let prices = ReagentPrices::default();
        let feed = carbonate_water();
        let estimates = dose_to_reach(&feed, 8.0, 6.5, &prices).unwrap();
        assert!(!estimates.is_empty());
        assert!(estimates.iter().all(|e| !e.reagent.is_base()));
        for pair in estimates.windows(2) {
            assert!(pair[0].cost_usd_m3 <= pair[1].cost_usd_m3);
        }
        // H2SO4 present (sulfate below the guard) and cheapest per eq.
        assert_eq!(estimates[0].reagent, Reagent::H2SO4);
    }

    #[test]
    fn test_h2so4_suppressed_on_sulfate_rich_feed() {
        let prices = ReagentPrices::default();
        let feed = WaterComposition::validate(
            [
                ("Na+", 700.0),
                ("SO4-2", 1200.0),
                ("Cl-", 180.0),
                ("HCO3-", 200.0),
            ],
            None,
        )
        .unwrap()
        .composition;
        let estimates = dose_to_reach(&feed, 8.0, 6.5, &prices).unwrap();
        assert!(estimates.iter().all(|e| e.reagent != Reagent::H2SO4));
    }

    #[test]
    fn test_upward_dose_uses_bases() {
        let prices = ReagentPrices::default();
        let estimates = dose_to_reach(&carbonate_water(), 6.5, 8.0, &prices).unwrap();
        assert!(!estimates.is_empty());
        assert!(estimates.iter().all(|e| e.reagent.is_base()));
    }

    #[test]
    fn test_no_dose_for_negligible_move() {
        let prices = ReagentPrices::default();
        let estimates = dose_to_reach(&carbonate_water(), 7.5, 7.55, &prices).unwrap();
        assert!(estimates.is_empty());
    }

    #[test]
    fn test_dose_scales_with_alkalinity() {
        let prices = ReagentPrices::default();
        let low_alk = WaterComposition::validate(
            [("Na+", 500.0), ("Cl-", 700.0), ("HCO3-", 60.0)],
            None,
        )
        .unwrap()
        .composition;
        let high_alk = WaterComposition::validate(
            [("Na+", 500.0), ("Cl-", 480.0), ("HCO3-", 400.0)],
            None,
        )
        .unwrap()
        .composition;
        let d_low = dose_to_reach(&low_alk, 8.0, 6.5, &prices).unwrap();
        let d_high = dose_to_reach(&high_alk, 8.0, 6.5, &prices).unwrap();
        assert!(d_high[0].dose_mg_l > d_low[0].dose_mg_l);
    }
}
