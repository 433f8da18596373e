// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Membrane Catalog
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Membrane element specifications and the model catalog.
//!
//! Catalog contents are reference data: permeabilities are fitted element
//! values at 25 °C, pressure limits come from manufacturer envelopes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{OsmoError, OsmoResult};
use crate::ions::IonRecord;

/// Membrane duty class. Determines unit costs and default dosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembraneGrade {
    Brackish,
    Seawater,
}

/// A single membrane element model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembraneSpec {
    pub model: String,
    pub grade: MembraneGrade,
    /// Active area of one element (m²).
    pub element_area_m2: f64,
    /// Water permeability A_w at 25 °C (m/s/Pa).
    pub a_w_m_s_pa: f64,
    /// Base salt permeability B at 25 °C (m/s), NaCl reference.
    pub b_salt_m_s: f64,
    /// Maximum feed pressure (Pa).
    pub max_pressure_pa: f64,
    /// Maximum operating temperature (°C).
    pub max_temperature_c: f64,
    /// Feed spacer channel height (m).
    pub spacer_height_m: f64,
    /// Spacer pressure-drop coefficient (psi per gpm^1.7 per element,
    /// FilmTec-style correlation).
    pub spacer_k: f64,
    /// Nominal design flux band (LMH), low to high.
    pub nominal_flux_band_lmh: [f64; 2],
    /// Calibration constant raising divalent rejection above the scalar
    /// solution-diffusion prediction.
    pub charge_amplification: f64,
}

impl MembraneSpec {
    /// Ion-specific salt permeability: base B scaled by the ion record.
    pub fn salt_permeability(&self, ion: &IonRecord) -> f64 {
        self.b_salt_m_s * ion.permeability_scale
    }

    /// Membrane area of one vessel.
    pub fn vessel_area_m2(&self, elements_per_vessel: usize) -> f64 {
        self.element_area_m2 * elements_per_vessel as f64
    }

    pub fn validate(&self) -> OsmoResult<()> {
        if self.element_area_m2 <= 0.0 || !self.element_area_m2.is_finite() {
            return Err(OsmoError::ConfigError(format!(
                "membrane {}: element area must be positive",
                self.model
            )));
        }
        if self.a_w_m_s_pa <= 0.0 || self.b_salt_m_s <= 0.0 {
            return Err(OsmoError::ConfigError(format!(
                "membrane {}: permeabilities must be positive",
                self.model
            )));
        }
        if self.max_pressure_pa <= 0.0 {
            return Err(OsmoError::ConfigError(format!(
                "membrane {}: max pressure must be positive",
                self.model
            )));
        }
        if self.nominal_flux_band_lmh[0] >= self.nominal_flux_band_lmh[1] {
            return Err(OsmoError::ConfigError(format!(
                "membrane {}: flux band must be ordered low..high",
                self.model
            )));
        }
        Ok(())
    }
}

/// Named catalog of membrane models, read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembraneCatalog {
    models: BTreeMap<String, MembraneSpec>,
}

impl MembraneCatalog {
    /// Built-in catalog covering the brackish and seawater models the
    /// design defaults were fitted against.
    pub fn builtin() -> Self {
        let mut models = BTreeMap::new();
        for spec in [
            MembraneSpec {
                model: "BW30_PRO_400".to_string(),
                grade: MembraneGrade::Brackish,
                element_area_m2: 37.16,
                a_w_m_s_pa: 9.63e-12,
                b_salt_m_s: 5.58e-8,
                max_pressure_pa: 82.7e5,
                max_temperature_c: 45.0,
                spacer_height_m: 0.71e-3,
                spacer_k: 0.012,
                nominal_flux_band_lmh: [15.0, 22.0],
                charge_amplification: 1.6,
            },
            MembraneSpec {
                model: "ECO_PRO_400".to_string(),
                grade: MembraneGrade::Brackish,
                element_area_m2: 37.16,
                a_w_m_s_pa: 1.60e-11,
                b_salt_m_s: 4.24e-8,
                max_pressure_pa: 41.4e5,
                max_temperature_c: 45.0,
                spacer_height_m: 0.86e-3,
                spacer_k: 0.010,
                nominal_flux_band_lmh: [15.0, 22.0],
                charge_amplification: 1.6,
            },
            MembraneSpec {
                model: "CR100_PRO_400".to_string(),
                grade: MembraneGrade::Brackish,
                element_area_m2: 37.16,
                a_w_m_s_pa: 1.06e-11,
                b_salt_m_s: 4.16e-8,
                max_pressure_pa: 41.4e5,
                max_temperature_c: 45.0,
                spacer_height_m: 0.71e-3,
                spacer_k: 0.012,
                nominal_flux_band_lmh: [15.0, 22.0],
                charge_amplification: 1.6,
            },
            MembraneSpec {
                model: "SW30HRLE_440".to_string(),
                grade: MembraneGrade::Seawater,
                element_area_m2: 40.88,
                a_w_m_s_pa: 1.5e-12,
                b_salt_m_s: 1.0e-8,
                max_pressure_pa: 120.0e5,
                max_temperature_c: 45.0,
                spacer_height_m: 0.71e-3,
                spacer_k: 0.012,
                nominal_flux_band_lmh: [11.0, 18.0],
                charge_amplification: 2.0,
            },
            MembraneSpec {
                model: "SW30XLE_440".to_string(),
                grade: MembraneGrade::Seawater,
                element_area_m2: 40.88,
                a_w_m_s_pa: 1.8e-12,
                b_salt_m_s: 1.2e-8,
                max_pressure_pa: 120.0e5,
                max_temperature_c: 45.0,
                spacer_height_m: 0.71e-3,
                spacer_k: 0.012,
                nominal_flux_band_lmh: [11.0, 18.0],
                charge_amplification: 2.0,
            },
        ] {
            models.insert(spec.model.clone(), spec);
        }
        MembraneCatalog { models }
    }

    /// Load a catalog from a JSON file (same schema as `builtin`).
    pub fn from_file(path: &str) -> OsmoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&contents)?;
        for spec in catalog.models.values() {
            spec.validate()?;
        }
        Ok(catalog)
    }

    /// Look up a model by name. Lookup is exact on the catalog key.
    pub fn get(&self, model: &str) -> OsmoResult<&MembraneSpec> {
        self.models
            .get(model)
            .ok_or_else(|| OsmoError::UnknownMembrane(model.to_string()))
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|s| s.as_str())
    }
}

impl Default for MembraneCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ions::IonRegistry;

    #[test]
    fn test_builtin_catalog_validates() {
        let catalog = MembraneCatalog::builtin();
        for name in catalog.model_names() {
            catalog.get(name).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_model() {
        let catalog = MembraneCatalog::builtin();
        let err = catalog.get("BW99_NOPE").unwrap_err();
        assert!(matches!(err, OsmoError::UnknownMembrane(_)));
    }

    #[test]
    fn test_seawater_membranes_are_tighter() {
        let catalog = MembraneCatalog::builtin();
        let bw = catalog.get("BW30_PRO_400").unwrap();
        let sw = catalog.get("SW30HRLE_440").unwrap();
        assert!(sw.a_w_m_s_pa < bw.a_w_m_s_pa);
        assert!(sw.b_salt_m_s < bw.b_salt_m_s);
        assert!(sw.max_pressure_pa > bw.max_pressure_pa);
    }

    #[test]
    fn test_ion_specific_permeability() {
        let catalog = MembraneCatalog::builtin();
        let reg = IonRegistry::builtin();
        let bw = catalog.get("BW30_PRO_400").unwrap();
        let b_na = bw.salt_permeability(reg.resolve("Na+").unwrap());
        let b_so4 = bw.salt_permeability(reg.resolve("SO4-2").unwrap());
        assert!(b_so4 < b_na, "sulfate must be better rejected than sodium");
    }

    #[test]
    fn test_roundtrip_serialization() {
        let catalog = MembraneCatalog::builtin();
        let json = serde_json::to_string_pretty(&catalog).unwrap();
        let back: MembraneCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.model_names().count(),
            catalog.model_names().count()
        );
        let spec = back.get("SW30HRLE_440").unwrap();
        assert!((spec.a_w_m_s_pa - 1.5e-12).abs() < 1e-20);
    }
}
