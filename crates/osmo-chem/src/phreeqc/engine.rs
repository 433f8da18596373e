// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — PHREEQC Engine Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Driver trait for the chemistry engine plus the subprocess
//! implementation that shells out to a PHREEQC binary.
//!
//! Sessions are per-request: each `concentrate` call is one engine run
//! against private temp files. Never shared across requests.

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use osmo_types::config::Mineral;
use osmo_types::error::{OsmoError, OsmoResult};

use crate::composition::WaterComposition;

use super::{deck, output};

/// One concentration request: speciate the feed at (pH, T) and remove
/// water to the stated concentration factor.
#[derive(Debug, Clone)]
pub struct ConcentrateRequest {
    pub composition: WaterComposition,
    pub temperature_c: f64,
    pub ph: f64,
    /// CF = 1/(1−R); 1.0 means feed speciation only.
    pub concentration_factor: f64,
    /// Hold pH at the stated value through the water-removal step.
    pub fixed_ph: bool,
}

impl ConcentrateRequest {
    pub fn validate(&self) -> OsmoResult<()> {
        if self.composition.is_empty() {
            return Err(OsmoError::ChemistryError(
                "cannot concentrate an empty composition".into(),
            ));
        }
        if !(1.0..=200.0).contains(&self.concentration_factor) {
            return Err(OsmoError::ChemistryError(format!(
                "concentration factor {} outside [1, 200]",
                self.concentration_factor
            )));
        }
        if !(0.0..100.0).contains(&self.temperature_c) {
            return Err(OsmoError::ChemistryError(format!(
                "temperature {} °C outside (0, 100)",
                self.temperature_c
            )));
        }
        if !(2.0..=12.0).contains(&self.ph) {
            return Err(OsmoError::ChemistryError(format!(
                "pH {} outside [2, 12]",
                self.ph
            )));
        }
        Ok(())
    }
}

/// Equilibrium state of the concentrated solution.
#[derive(Debug, Clone)]
pub struct ConcentrateReport {
    /// Concentrated ion map (mg/L).
    pub composition: WaterComposition,
    /// Equilibrium pH after water removal (drifts unless held).
    pub ph: f64,
    /// Dissolved CO2 remaining (mol/L).
    pub dissolved_co2_mol_l: f64,
    pub saturation_indices: Vec<(Mineral, f64)>,
}

impl ConcentrateReport {
    pub fn si(&self, mineral: Mineral) -> Option<f64> {
        self.saturation_indices
            .iter()
            .find(|(m, _)| *m == mineral)
            .map(|(_, v)| *v)
    }
}

/// The chemistry engine seam. `PhreeqcProcess` is the production
/// implementation; tests inject `MockPhreeqc`.
pub trait PhreeqcEngine {
    fn concentrate(&self, request: &ConcentrateRequest) -> OsmoResult<ConcentrateReport>;
}

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Subprocess driver around a `phreeqc` executable.
pub struct PhreeqcProcess {
    binary: PathBuf,
    database: PathBuf,
}

impl PhreeqcProcess {
    pub fn new(binary: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        PhreeqcProcess {
            binary: binary.into(),
            database: database.into(),
        }
    }

    /// Resolve binary and database from `PHREEQC_BIN` / `PHREEQC_DATABASE`.
    pub fn from_env() -> OsmoResult<Self> {
        let binary = std::env::var("PHREEQC_BIN")
            .map_err(|_| OsmoError::ChemistryError("PHREEQC_BIN is not set".into()))?;
        let database = std::env::var("PHREEQC_DATABASE")
            .map_err(|_| OsmoError::ChemistryError("PHREEQC_DATABASE is not set".into()))?;
        Ok(Self::new(binary, database))
    }

    fn run_deck(&self, deck_text: &str) -> OsmoResult<String> {
        let run_id = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir();
        let input = dir.join(format!("osmo-phreeqc-{}-{run_id}.pqi", std::process::id()));
        let out = dir.join(format!("osmo-phreeqc-{}-{run_id}.pqo", std::process::id()));
        let selected = dir.join(format!("osmo-phreeqc-{}-{run_id}.sel", std::process::id()));

        // SELECTED_OUTPUT goes to the -file we name here.
        let deck_text = deck_text.replace(
            "SELECTED_OUTPUT 1\n",
            &format!(
                "SELECTED_OUTPUT 1\n    -file                 {}\n",
                selected.display()
            ),
        );
        std::fs::write(&input, &deck_text)?;

        debug!("phreeqc run {run_id}: {}", input.display());
        let status = Command::new(&self.binary)
            .arg(&input)
            .arg(&out)
            .arg(&self.database)
            .output()
            .map_err(|e| {
                OsmoError::ChemistryError(format!(
                    "failed to launch {}: {e}",
                    self.binary.display()
                ))
            })?;

        let result = if !status.status.success() {
            Err(OsmoError::ChemistryError(format!(
                "phreeqc exited with {}: {}",
                status.status,
                String::from_utf8_lossy(&status.stderr)
            )))
        } else {
            std::fs::read_to_string(&selected).map_err(|e| {
                OsmoError::ChemistryError(format!("cannot read selected output: {e}"))
            })
        };

        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&out);
        let _ = std::fs::remove_file(&selected);
        result
    }
}

impl PhreeqcEngine for PhreeqcProcess {
    fn concentrate(&self, request: &ConcentrateRequest) -> OsmoResult<ConcentrateReport> {
        request.validate()?;
        let deck_text = deck::render(request);
        let selected = self.run_deck(&deck_text)?;
        let row = output::parse(&selected)?;

        // Element totals (mol/kgw ≈ mol/L) back onto the ion basis.
        let composition = WaterComposition::from_canonical(
            row.element_totals
                .iter()
                .filter_map(|(element, mol)| {
                    deck::ion_for_element(element)
                        .map(|(symbol, molar_mass)| (symbol.to_string(), mol * molar_mass * 1000.0))
                }),
        );

        Ok(ConcentrateReport {
            composition,
            ph: row.ph,
            dissolved_co2_mol_l: row.co2_mol_kgw,
            saturation_indices: row.saturation_indices,
        })
    }
}
