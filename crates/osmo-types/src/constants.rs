// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Universal gas constant (J/mol/K)
pub const R_GAS: f64 = 8.314462618;

/// Molality of pure water (mol H2O per kg ≈ per L)
pub const WATER_MOL_PER_L: f64 = 55.51;

/// Molar mass of water (g/mol)
pub const WATER_MOLAR_MASS: f64 = 18.015;

/// Reference temperature for membrane permeabilities (K), 25 °C
pub const T_REF_K: f64 = 298.15;

/// 0 °C in Kelvin
pub const T_ZERO_C_K: f64 = 273.15;

/// Atmospheric pressure (Pa)
pub const P_ATM: f64 = 1.013e5;

/// Pascals per bar
pub const PA_PER_BAR: f64 = 1.0e5;

/// Standard 8-inch 400 ft² element active area (m²)
pub const ELEMENT_AREA_400_M2: f64 = 37.16;

/// Standard 8-inch 440 ft² element active area (m²)
pub const ELEMENT_AREA_440_M2: f64 = 40.88;

/// Elements per pressure vessel (industry standard for 8-inch trains)
pub const ELEMENTS_PER_VESSEL: usize = 7;

/// Activation energy for water permeability Arrhenius correction (J/mol)
pub const EA_WATER_J_MOL: f64 = 20_000.0;

/// Activation energy for salt permeability Arrhenius correction (J/mol)
pub const EA_SALT_J_MOL: f64 = 25_000.0;

/// Convert flux in LMH (L/m²/h) to superficial velocity (m/s).
pub fn lmh_to_m_s(flux_lmh: f64) -> f64 {
    flux_lmh / (1000.0 * 3600.0)
}

/// Convert superficial velocity (m/s) to flux in LMH.
pub fn m_s_to_lmh(flux_m_s: f64) -> f64 {
    flux_m_s * 1000.0 * 3600.0
}

/// Convert a volumetric flow in m³/h to m³/s.
pub fn m3h_to_m3s(flow_m3h: f64) -> f64 {
    flow_m3h / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_unit_roundtrip() {
        let j = 18.0;
        assert!((m_s_to_lmh(lmh_to_m_s(j)) - j).abs() < 1e-12);
        // 18 LMH = 5e-6 m/s
        assert!((lmh_to_m_s(18.0) - 5.0e-6).abs() < 1e-9);
    }
}
