// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Mock Chemistry Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Deterministic in-process stand-in for the PHREEQC engine.
//!
//! Ideal-solution chemistry with Davies activity corrections against
//! fixed solubility products. Used by the test suites and for offline
//! development; the production code paths never select it implicitly.

use osmo_types::config::Mineral;
use osmo_types::error::{OsmoError, OsmoResult};
use osmo_types::ions::registry;

use crate::composition::WaterComposition;

use super::engine::{ConcentrateRequest, ConcentrateReport, PhreeqcEngine};

/// Carbonate system constants at 25 °C.
const PK1_CARBONIC: f64 = 6.35;
const PK2_CARBONIC: f64 = 10.33;

/// pH rise per decade of concentration when pH floats free (carbonate
/// buffering under CO2 loss).
const PH_DRIFT_PER_DECADE: f64 = 0.30;

/// Amorphous silica solubility at 25 °C, neutral pH (mol/L ≈ 116 mg/L).
const SILICA_SOLUBILITY_MOL_L: f64 = 1.94e-3;

/// log10 Ksp at 25 °C.
const LOG_KSP_CALCITE: f64 = -8.48;
const LOG_KSP_GYPSUM: f64 = -4.58;
const LOG_KSP_ANHYDRITE: f64 = -4.36;
const LOG_KSP_BARITE: f64 = -9.97;
const LOG_KSP_CELESTITE: f64 = -6.63;
const LOG_KSP_FLUORITE: f64 = -10.60;

#[derive(Debug, Clone, Default)]
pub struct MockPhreeqc {
    fail: bool,
}

impl MockPhreeqc {
    pub fn new() -> Self {
        MockPhreeqc { fail: false }
    }

    /// An engine that fails every run, for error-path tests.
    pub fn failing() -> Self {
        MockPhreeqc { fail: true }
    }
}

/// Davies equation: log10 γ = −A z² (√I/(1+√I) − 0.3 I).
fn davies_log_gamma(charge: i32, ionic_strength: f64) -> f64 {
    let sqrt_i = ionic_strength.max(0.0).sqrt();
    -0.509 * (charge * charge) as f64 * (sqrt_i / (1.0 + sqrt_i) - 0.3 * ionic_strength)
}

fn molar(composition: &WaterComposition, symbol: &str) -> f64 {
    let conc = composition.get(symbol);
    if conc <= 0.0 {
        return 0.0;
    }
    let rec = registry().resolve(symbol).expect("canonical symbol");
    rec.molar_mg_l(conc)
}

impl PhreeqcEngine for MockPhreeqc {
    fn concentrate(&self, request: &ConcentrateRequest) -> OsmoResult<ConcentrateReport> {
        request.validate()?;
        if self.fail {
            return Err(OsmoError::ChemistryError(
                "mock engine configured to fail".into(),
            ));
        }

        let cf = request.concentration_factor;
        let composition = request.composition.scaled(cf);
        let ph = if request.fixed_ph {
            request.ph
        } else {
            request.ph + PH_DRIFT_PER_DECADE * cf.log10()
        };

        let i = composition.ionic_strength();
        let lg1 = davies_log_gamma(1, i);
        let lg2 = davies_log_gamma(2, i);

        let ca = molar(&composition, "Ca2+");
        let ba = molar(&composition, "Ba2+");
        let sr = molar(&composition, "Sr2+");
        let so4 = molar(&composition, "SO4-2");
        let f = molar(&composition, "F-");
        let hco3 = molar(&composition, "HCO3-");
        let sio2 = molar(&composition, "SiO2");
        let co3 = hco3 * 10f64.powf(ph - PK2_CARBONIC);

        let mut saturation_indices = Vec::new();
        let mut push_si = |mineral: Mineral, log_iap: f64, log_ksp: f64, present: bool| {
            if present {
                saturation_indices.push((mineral, log_iap - log_ksp));
            }
        };

        push_si(
            Mineral::Calcite,
            2.0 * lg2 + (ca * co3).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_CALCITE,
            ca > 0.0 && co3 > 0.0,
        );
        push_si(
            Mineral::Gypsum,
            2.0 * lg2 + (ca * so4).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_GYPSUM,
            ca > 0.0 && so4 > 0.0,
        );
        push_si(
            Mineral::Anhydrite,
            2.0 * lg2 + (ca * so4).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_ANHYDRITE,
            ca > 0.0 && so4 > 0.0,
        );
        push_si(
            Mineral::Barite,
            2.0 * lg2 + (ba * so4).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_BARITE,
            ba > 0.0 && so4 > 0.0,
        );
        push_si(
            Mineral::Celestite,
            2.0 * lg2 + (sr * so4).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_CELESTITE,
            sr > 0.0 && so4 > 0.0,
        );
        push_si(
            Mineral::Fluorite,
            lg2 + 2.0 * lg1 + (ca * f * f).max(f64::MIN_POSITIVE).log10(),
            LOG_KSP_FLUORITE,
            ca > 0.0 && f > 0.0,
        );
        // Amorphous silica: pH-dependent solubility (silicate ionization
        // above ~pH 9), assessed purely as an SI.
        let silica_solubility =
            SILICA_SOLUBILITY_MOL_L * (1.0 + 10f64.powf(ph - 9.84));
        push_si(
            Mineral::AmorphousSilica,
            (sio2 / silica_solubility).max(f64::MIN_POSITIVE).log10(),
            0.0,
            sio2 > 0.0,
        );

        let dissolved_co2_mol_l = hco3 * 10f64.powf(PK1_CARBONIC - ph);

        Ok(ConcentrateReport {
            composition,
            ph,
            dissolved_co2_mol_l,
            saturation_indices,
        })
    }
}
