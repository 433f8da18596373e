//! Van 't Hoff osmotic pressure over the full ion map, and Arrhenius
//! temperature corrections for the membrane permeabilities.

use osmo_chem::composition::WaterComposition;
use osmo_types::constants::{
    EA_SALT_J_MOL, EA_WATER_J_MOL, R_GAS, T_REF_K, T_ZERO_C_K,
};

/// Total molarity at which the osmotic coefficient bottoms out at its
/// brackish-strength value.
const PHI_REFERENCE_MOLARITY: f64 = 0.05;
/// Osmotic coefficient at and above the reference strength.
const PHI_AT_REFERENCE: f64 = 0.93;

/// Osmotic coefficient: 1.0 at infinite dilution, falling linearly to
/// 0.93 at typical brackish strength and held there.
pub fn osmotic_coefficient(molar_sum: f64) -> f64 {
    let t = (molar_sum / PHI_REFERENCE_MOLARITY).clamp(0.0, 1.0);
    1.0 - (1.0 - PHI_AT_REFERENCE) * t
}

/// π = φ · R · T · Σᵢ cᵢ (each dissolved species counted separately, so
/// dissociation is already in the sum). Result in Pa.
pub fn osmotic_pressure_pa(composition: &WaterComposition, temperature_c: f64) -> f64 {
    let molar_sum = composition.molar_sum();
    let phi = osmotic_coefficient(molar_sum);
    let t_k = temperature_c + T_ZERO_C_K;
    phi * molar_sum * 1000.0 * R_GAS * t_k
}

/// Water density (kg/m³), polynomial fit valid 0–100 °C.
pub fn water_density_kg_m3(temperature_c: f64) -> f64 {
    let t = temperature_c;
    999.84 + 0.065 * t - 0.0085 * t * t + 0.000035 * t * t * t
}

/// Dynamic viscosity of water (Pa·s), Vogel-type fit.
pub fn water_viscosity_pa_s(temperature_c: f64) -> f64 {
    let t_k = temperature_c + T_ZERO_C_K;
    2.414e-5 * 10f64.powf(247.8 / (t_k - 140.0))
}

fn arrhenius(value_25: f64, activation_j_mol: f64, temperature_c: f64) -> f64 {
    let t_k = temperature_c + T_ZERO_C_K;
    value_25 * ((activation_j_mol / R_GAS) * (1.0 / T_REF_K - 1.0 / t_k)).exp()
}

/// Water permeability at temperature.
pub fn a_w_at(a_w_25: f64, temperature_c: f64) -> f64 {
    arrhenius(a_w_25, EA_WATER_J_MOL, temperature_c)
}

/// Salt permeability at temperature (stronger activation than water).
pub fn b_at(b_25: f64, temperature_c: f64) -> f64 {
    arrhenius(b_25, EA_SALT_J_MOL, temperature_c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nacl_3000() -> WaterComposition {
        WaterComposition::validate([("Na+", 1200.0), ("Cl-", 1850.0)], None)
            .unwrap()
            .composition
    }

    #[test]
    fn test_osmotic_coefficient_limits() {
        assert!((osmotic_coefficient(0.0) - 1.0).abs() < 1e-12);
        assert!((osmotic_coefficient(0.05) - 0.93).abs() < 1e-12);
        assert!((osmotic_coefficient(1.2) - 0.93).abs() < 1e-12);
        assert!(osmotic_coefficient(0.025) > 0.93);
    }

    #[test]
    fn test_brackish_osmotic_pressure() {
        // ~3 g/L NaCl at 25 °C: π ≈ 2.4 bar
        let pi = osmotic_pressure_pa(&nacl_3000(), 25.0);
        assert!((2.2e5..2.6e5).contains(&pi), "π = {pi}");
    }

    #[test]
    fn test_osmotic_pressure_scales_superlinearly_near_dilute() {
        let feed = nacl_3000();
        let pi1 = osmotic_pressure_pa(&feed, 25.0);
        let pi4 = osmotic_pressure_pa(&feed.scaled(4.0), 25.0);
        // Same φ regime → essentially linear in concentration.
        assert!((pi4 / pi1 - 4.0).abs() < 0.05);
    }

    #[test]
    fn test_osmotic_pressure_rises_with_temperature() {
        let feed = nacl_3000();
        assert!(osmotic_pressure_pa(&feed, 35.0) > osmotic_pressure_pa(&feed, 15.0));
    }

    #[test]
    fn test_arrhenius_reference_point() {
        assert!((a_w_at(9.63e-12, 25.0) - 9.63e-12).abs() < 1e-20);
        assert!((b_at(5.58e-8, 25.0) - 5.58e-8).abs() < 1e-16);
    }

    #[test]
    fn test_permeability_grows_with_temperature() {
        // ~3%/°C for water permeability around ambient.
        let ratio = a_w_at(9.63e-12, 35.0) / 9.63e-12;
        assert!((1.2..1.4).contains(&ratio), "10 °C ratio {ratio}");
        // Salt permeability climbs faster than water.
        let salt_ratio = b_at(5.58e-8, 35.0) / 5.58e-8;
        assert!(salt_ratio > ratio);
    }

    #[test]
    fn test_water_properties_at_ambient() {
        let rho = water_density_kg_m3(25.0);
        assert!((996.0..999.0).contains(&rho), "ρ = {rho}");
        let mu = water_viscosity_pa_s(25.0);
        assert!((8.5e-4..9.5e-4).contains(&mu), "μ = {mu}");
    }
}
