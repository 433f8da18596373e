// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Ion Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Canonical ion reference data: molar mass, charge, Stokes radius,
//! diffusivity, transport class and salt-permeability scaling.
//!
//! Labels arriving from callers are noisy (`Na_+`, `ca+2`, `SO4^2-`); the
//! registry normalizes them to one canonical symbol per species.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{OsmoError, OsmoResult};

/// How a species crosses the membrane.
///
/// Charged species follow the solution-diffusion rejection model; neutral
/// and weak-acid species short-circuit to a catalog rejection (spec'd per
/// membrane grade, not derivable from B alone).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IonTransport {
    Charged,
    Neutral { rejection: f64 },
    WeakAcid { rejection: f64 },
}

/// Reference record for a single dissolved species.
#[derive(Debug, Clone, Serialize)]
pub struct IonRecord {
    /// Canonical symbol, e.g. `Na+`, `SO4-2`, `SiO2`.
    pub symbol: &'static str,
    /// Molar mass (g/mol).
    pub molar_mass: f64,
    /// Signed charge number (0 for neutral species).
    pub charge: i32,
    /// Stokes radius (nm).
    pub stokes_radius_nm: f64,
    /// Bulk diffusivity in water at 25 °C (m²/s).
    pub diffusivity_m2_s: f64,
    /// Transport dispatch tag.
    pub transport: IonTransport,
    /// Multiplier applied to the membrane's base salt permeability B.
    /// Divalents diffuse through the active layer far more slowly.
    pub permeability_scale: f64,
}

impl IonRecord {
    /// Equivalents per liter for a concentration in mg/L, signed by charge.
    pub fn equivalents_mg_l(&self, conc_mg_l: f64) -> f64 {
        conc_mg_l * self.charge as f64 / self.molar_mass
    }

    /// Molar concentration (mol/L) for a concentration in mg/L.
    pub fn molar_mg_l(&self, conc_mg_l: f64) -> f64 {
        conc_mg_l / (self.molar_mass * 1000.0)
    }
}

const fn charged(
    symbol: &'static str,
    molar_mass: f64,
    charge: i32,
    stokes_radius_nm: f64,
    diffusivity_m2_s: f64,
    permeability_scale: f64,
) -> IonRecord {
    IonRecord {
        symbol,
        molar_mass,
        charge,
        stokes_radius_nm,
        diffusivity_m2_s,
        transport: IonTransport::Charged,
        permeability_scale,
    }
}

/// Built-in species table. Diffusivities are infinite-dilution values.
const BUILTIN_IONS: &[IonRecord] = &[
    // Cations
    charged("Na+", 22.99, 1, 0.184, 1.33e-9, 1.0),
    charged("K+", 39.10, 1, 0.125, 1.96e-9, 1.0),
    charged("NH4+", 18.04, 1, 0.125, 1.96e-9, 1.0),
    charged("Ca2+", 40.08, 2, 0.310, 0.79e-9, 0.4),
    charged("Mg2+", 24.31, 2, 0.347, 0.71e-9, 0.4),
    charged("Ba2+", 137.33, 2, 0.290, 0.85e-9, 0.4),
    charged("Sr2+", 87.62, 2, 0.310, 0.79e-9, 0.4),
    charged("Fe2+", 55.85, 2, 0.344, 0.72e-9, 0.4),
    charged("Mn2+", 54.94, 2, 0.344, 0.71e-9, 0.4),
    charged("Fe3+", 55.85, 3, 0.390, 0.60e-9, 0.3),
    // Anions
    charged("Cl-", 35.45, -1, 0.121, 2.03e-9, 1.0),
    charged("Br-", 79.90, -1, 0.118, 2.01e-9, 1.0),
    charged("F-", 19.00, -1, 0.166, 1.46e-9, 0.7),
    charged("NO3-", 62.00, -1, 0.128, 1.90e-9, 1.4),
    charged("HCO3-", 61.02, -1, 0.207, 1.18e-9, 0.9),
    charged("CO3-2", 60.01, -2, 0.266, 0.92e-9, 0.4),
    charged("SO4-2", 96.06, -2, 0.230, 1.07e-9, 0.4),
    charged("PO4-3", 94.97, -3, 0.339, 0.61e-9, 0.3),
    charged("B(OH)4-", 78.84, -1, 0.230, 0.97e-9, 0.7),
    // Neutral / weak-acid species: catalog rejection, not SD-derived
    IonRecord {
        symbol: "SiO2",
        molar_mass: 60.08,
        charge: 0,
        stokes_radius_nm: 0.270,
        diffusivity_m2_s: 1.10e-9,
        transport: IonTransport::Neutral { rejection: 0.97 },
        permeability_scale: 0.7,
    },
    IonRecord {
        symbol: "B(OH)3",
        molar_mass: 61.83,
        charge: 0,
        stokes_radius_nm: 0.155,
        diffusivity_m2_s: 1.10e-9,
        transport: IonTransport::WeakAcid { rejection: 0.70 },
        permeability_scale: 2.0,
    },
];

/// Read-only registry shared by validator, designer and simulator.
#[derive(Debug, Clone)]
pub struct IonRegistry {
    by_key: HashMap<String, &'static IonRecord>,
}

impl IonRegistry {
    /// Registry over the built-in species table.
    pub fn builtin() -> Self {
        let mut by_key = HashMap::new();
        for rec in BUILTIN_IONS {
            by_key.insert(normalize_key(rec.symbol), rec);
        }
        // Alternate notations seen in the wild
        for (alias, symbol) in [
            ("ca+2", "Ca2+"),
            ("mg+2", "Mg2+"),
            ("ba+2", "Ba2+"),
            ("sr+2", "Sr2+"),
            ("fe+2", "Fe2+"),
            ("fe+3", "Fe3+"),
            ("mn+2", "Mn2+"),
            ("so4^2-", "SO4-2"),
            ("so42-", "SO4-2"),
            ("co3^2-", "CO3-2"),
            ("co32-", "CO3-2"),
            ("po43-", "PO4-3"),
            ("sio2(a)", "SiO2"),
            ("h4sio4", "SiO2"),
            ("b", "B(OH)3"),
            ("boron", "B(OH)3"),
        ] {
            let rec = *by_key
                .get(&normalize_key(symbol))
                .expect("alias target must exist in builtin table");
            by_key.insert(alias.to_string(), rec);
        }
        IonRegistry { by_key }
    }

    /// Resolve a caller-supplied label to its canonical record.
    pub fn resolve(&self, label: &str) -> OsmoResult<&'static IonRecord> {
        self.by_key
            .get(&normalize_key(label))
            .copied()
            .ok_or_else(|| {
                OsmoError::InvalidComposition(format!("unknown ion label '{label}'"))
            })
    }

    /// All canonical records, in table order.
    pub fn records(&self) -> &'static [IonRecord] {
        BUILTIN_IONS
    }
}

impl Default for IonRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-wide shared registry. Read-only after first use; safe to share
/// across concurrent requests without locking.
pub fn registry() -> &'static IonRegistry {
    static REGISTRY: OnceLock<IonRegistry> = OnceLock::new();
    REGISTRY.get_or_init(IonRegistry::builtin)
}

/// Lowercase, drop underscores and caret markers: `Na_+` → `na+`,
/// `SO4^2-` → `so42-`.
fn normalize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| *c != '_' && *c != '^' && !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
