// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — PHREEQC Deck Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Renders PHREEQC input decks for the concentrate-and-score workflow:
//! a SOLUTION block on the element basis the databases expect, a REACTION
//! step that removes pure water to reach the target concentration factor,
//! an optional Fix_H+ phase holding pH, and a SELECTED_OUTPUT table.

use osmo_types::config::Mineral;
use osmo_types::constants::WATER_MOL_PER_L;

use super::engine::ConcentrateRequest;

/// Canonical ion symbol → PHREEQC element with the mass conversion from
/// compound mg/L to element mg/L.
pub struct ElementMap {
    pub symbol: &'static str,
    pub element: &'static str,
    /// Multiply compound mg/L by this to obtain element mg/L.
    pub mass_factor: f64,
    /// Molar mass of the reported ion (g/mol), for the reverse direction.
    pub ion_molar_mass: f64,
}

/// The element basis used for both the SOLUTION block and the totals
/// back-conversion. Bicarbonate is entered as alkalinity; boron and silica
/// collapse onto their element totals.
pub const ELEMENT_MAP: &[ElementMap] = &[
    ElementMap { symbol: "Na+", element: "Na", mass_factor: 1.0, ion_molar_mass: 22.99 },
    ElementMap { symbol: "K+", element: "K", mass_factor: 1.0, ion_molar_mass: 39.10 },
    ElementMap { symbol: "Ca2+", element: "Ca", mass_factor: 1.0, ion_molar_mass: 40.08 },
    ElementMap { symbol: "Mg2+", element: "Mg", mass_factor: 1.0, ion_molar_mass: 24.31 },
    ElementMap { symbol: "Ba2+", element: "Ba", mass_factor: 1.0, ion_molar_mass: 137.33 },
    ElementMap { symbol: "Sr2+", element: "Sr", mass_factor: 1.0, ion_molar_mass: 87.62 },
    ElementMap { symbol: "Fe2+", element: "Fe(2)", mass_factor: 1.0, ion_molar_mass: 55.85 },
    ElementMap { symbol: "Fe3+", element: "Fe(3)", mass_factor: 1.0, ion_molar_mass: 55.85 },
    ElementMap { symbol: "Mn2+", element: "Mn", mass_factor: 1.0, ion_molar_mass: 54.94 },
    ElementMap { symbol: "NH4+", element: "N(-3)", mass_factor: 14.01 / 18.04, ion_molar_mass: 18.04 },
    ElementMap { symbol: "Cl-", element: "Cl", mass_factor: 1.0, ion_molar_mass: 35.45 },
    ElementMap { symbol: "Br-", element: "Br", mass_factor: 1.0, ion_molar_mass: 79.90 },
    ElementMap { symbol: "F-", element: "F", mass_factor: 1.0, ion_molar_mass: 19.00 },
    ElementMap { symbol: "NO3-", element: "N(5)", mass_factor: 14.01 / 62.00, ion_molar_mass: 62.00 },
    ElementMap { symbol: "SO4-2", element: "S(6)", mass_factor: 32.07 / 96.06, ion_molar_mass: 96.06 },
    ElementMap { symbol: "HCO3-", element: "Alkalinity", mass_factor: 1.0, ion_molar_mass: 61.02 },
    ElementMap { symbol: "CO3-2", element: "C(4)", mass_factor: 12.01 / 60.01, ion_molar_mass: 60.01 },
    ElementMap { symbol: "PO4-3", element: "P", mass_factor: 30.97 / 94.97, ion_molar_mass: 94.97 },
    ElementMap { symbol: "B(OH)4-", element: "B", mass_factor: 10.81 / 78.84, ion_molar_mass: 78.84 },
    ElementMap { symbol: "B(OH)3", element: "B", mass_factor: 10.81 / 61.83, ion_molar_mass: 61.83 },
    ElementMap { symbol: "SiO2", element: "Si", mass_factor: 28.09 / 60.08, ion_molar_mass: 60.08 },
];

pub fn element_for_symbol(symbol: &str) -> Option<&'static ElementMap> {
    ELEMENT_MAP.iter().find(|m| m.symbol == symbol)
}

/// Reverse direction for totals columns: element label → the ion the
/// concentrate map reports. `Alkalinity` and `C(4)` both fold back onto
/// bicarbonate; boron reports as boric acid.
pub fn ion_for_element(element: &str) -> Option<(&'static str, f64)> {
    match element {
        "Na" => Some(("Na+", 22.99)),
        "K" => Some(("K+", 39.10)),
        "Ca" => Some(("Ca2+", 40.08)),
        "Mg" => Some(("Mg2+", 24.31)),
        "Ba" => Some(("Ba2+", 137.33)),
        "Sr" => Some(("Sr2+", 87.62)),
        "Fe" | "Fe(2)" => Some(("Fe2+", 55.85)),
        "Fe(3)" => Some(("Fe3+", 55.85)),
        "Mn" => Some(("Mn2+", 54.94)),
        "N(-3)" => Some(("NH4+", 18.04)),
        "Cl" => Some(("Cl-", 35.45)),
        "Br" => Some(("Br-", 79.90)),
        "F" => Some(("F-", 19.00)),
        "N(5)" => Some(("NO3-", 62.00)),
        "S(6)" => Some(("SO4-2", 96.06)),
        "C(4)" | "Alkalinity" => Some(("HCO3-", 61.02)),
        "P" => Some(("PO4-3", 94.97)),
        "B" => Some(("B(OH)3", 61.83)),
        "Si" => Some(("SiO2", 60.08)),
        _ => None,
    }
}

/// Moles of water to remove per liter of feed to reach `cf`.
pub fn water_removal_mol(cf: f64) -> f64 {
    WATER_MOL_PER_L * (1.0 - 1.0 / cf)
}

/// Render the full input deck for a concentrate request.
pub fn render(request: &ConcentrateRequest) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "TITLE Concentrate to CF={:.4}\n",
        request.concentration_factor
    ));

    // SOLUTION block on the element basis.
    out.push_str("SOLUTION 1\n");
    out.push_str(&format!("    temp      {:.2}\n", request.temperature_c));
    out.push_str(&format!("    pH        {:.3}\n", request.ph));
    out.push_str("    pe        4.0\n");
    out.push_str("    units     mg/l\n");

    let mut elements: Vec<&'static str> = Vec::new();
    for (symbol, conc) in request.composition.iter() {
        if let Some(map) = element_for_symbol(symbol) {
            let element_mg_l = conc * map.mass_factor;
            if map.element == "Alkalinity" {
                out.push_str(&format!(
                    "    Alkalinity  {element_mg_l:.4} as HCO3\n"
                ));
                if !elements.contains(&"C(4)") {
                    elements.push("C(4)");
                }
            } else {
                out.push_str(&format!("    {:<10}{element_mg_l:.4}\n", map.element));
                if !elements.contains(&map.element) {
                    elements.push(map.element);
                }
            }
        }
    }

    // Fixed-pH titration phase (standard Fix_H+ construction).
    if request.fixed_ph {
        out.push_str("PHASES\nFix_H+\n    H+ = H+\n    log_k 0.0\n");
    }

    out.push_str("SELECTED_OUTPUT 1\n");
    out.push_str("    -reset                false\n");
    out.push_str("    -pH                   true\n");
    out.push_str(&format!("    -totals               {}\n", elements.join(" ")));
    out.push_str("    -molalities           CO2\n");
    let minerals: Vec<&str> = Mineral::ALL.iter().map(|m| m.phreeqc_name()).collect();
    out.push_str(&format!(
        "    -saturation_indices   {}\n",
        minerals.join(" ")
    ));

    // Water removal to the requested concentration factor.
    if request.concentration_factor > 1.0 {
        out.push_str("USE solution 1\n");
        out.push_str("REACTION 1\n");
        out.push_str("    H2O    -1.0\n");
        out.push_str(&format!(
            "    {:.6} moles\n",
            water_removal_mol(request.concentration_factor)
        ));
        if request.fixed_ph {
            out.push_str("EQUILIBRIUM_PHASES 1\n");
            out.push_str(&format!(
                "    Fix_H+    -{:.3}    NaOH    10.0\n",
                request.ph
            ));
        }
    }
    out.push_str("END\n");
    out
}
