// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Concentration Polarization
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Film-model polarization factor β = exp(J/k) with the mass-transfer
//! coefficient from the Schock–Miquel correlation for spacer-filled
//! spiral-wound channels: Sh = 0.065 Re^0.875 Sc^0.25.

use osmo_chem::composition::WaterComposition;
use osmo_types::constants::m3h_to_m3s;
use osmo_types::membrane::MembraneSpec;

use crate::osmotic::{water_density_kg_m3, water_viscosity_pa_s};

/// Standard 8040 element length (m).
const ELEMENT_LENGTH_M: f64 = 1.016;
/// Spacer void fraction.
const SPACER_POROSITY: f64 = 0.85;

/// Feed-channel cross-section of one element (m²): total leaf width ×
/// channel height × void fraction.
pub fn channel_cross_section_m2(membrane: &MembraneSpec) -> f64 {
    let leaf_width_total = membrane.element_area_m2 / (2.0 * ELEMENT_LENGTH_M);
    leaf_width_total * membrane.spacer_height_m * SPACER_POROSITY
}

/// Crossflow velocity (m/s) at the arithmetic-average vessel flow.
pub fn crossflow_velocity_m_s(membrane: &MembraneSpec, avg_flow_per_vessel_m3h: f64) -> f64 {
    m3h_to_m3s(avg_flow_per_vessel_m3h) / channel_cross_section_m2(membrane)
}

/// Solute diffusivity representative of the mixture: molar-weighted mean
/// over the dissolved species.
pub fn mixture_diffusivity_m2_s(composition: &WaterComposition) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (rec, conc) in composition.iter_records() {
        let molar = rec.molar_mg_l(conc);
        weighted += molar * rec.diffusivity_m2_s;
        total += molar;
    }
    if total > 0.0 {
        weighted / total
    } else {
        1.5e-9
    }
}

/// Mass-transfer coefficient k (m/s) from spacer geometry, crossflow and
/// temperature.
pub fn mass_transfer_coefficient(
    membrane: &MembraneSpec,
    composition: &WaterComposition,
    avg_flow_per_vessel_m3h: f64,
    temperature_c: f64,
) -> f64 {
    let velocity = crossflow_velocity_m_s(membrane, avg_flow_per_vessel_m3h);
    let d_h = 2.0 * membrane.spacer_height_m;
    let rho = water_density_kg_m3(temperature_c);
    let mu = water_viscosity_pa_s(temperature_c);
    let diffusivity = mixture_diffusivity_m2_s(composition);

    let re = rho * velocity * d_h / mu;
    let sc = mu / (rho * diffusivity);
    let sh = 0.065 * re.powf(0.875) * sc.powf(0.25);
    sh * diffusivity / d_h
}

/// Polarization factor β = exp(J/k); wall concentration is β · bulk.
pub fn polarization_factor(flux_m_s: f64, k_mt_m_s: f64) -> f64 {
    (flux_m_s / k_mt_m_s).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmo_types::constants::lmh_to_m_s;
    use osmo_types::membrane::MembraneCatalog;

    fn brackish_feed() -> WaterComposition {
        WaterComposition::validate([("Na+", 1200.0), ("Cl-", 1850.0)], None)
            .unwrap()
            .composition
    }

    #[test]
    fn test_crossflow_velocity_in_design_band() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        // ~8 m³/h average per vessel → 0.1–0.3 m/s in an 8-inch element.
        let v = crossflow_velocity_m_s(membrane, 8.0);
        assert!((0.1..0.3).contains(&v), "v = {v}");
    }

    #[test]
    fn test_mass_transfer_magnitude() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let k = mass_transfer_coefficient(membrane, &brackish_feed(), 8.0, 25.0);
        // Literature band for spiral-wound brackish duty.
        assert!((1e-5..2e-4).contains(&k), "k = {k}");
    }

    #[test]
    fn test_beta_modest_at_design_flux() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let k = mass_transfer_coefficient(membrane, &brackish_feed(), 8.0, 25.0);
        let beta = polarization_factor(lmh_to_m_s(18.0), k);
        assert!((1.02..1.25).contains(&beta), "β = {beta}");
    }

    #[test]
    fn test_beta_grows_with_flux_and_shrinks_with_crossflow() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let feed = brackish_feed();
        let k_slow = mass_transfer_coefficient(membrane, &feed, 4.0, 25.0);
        let k_fast = mass_transfer_coefficient(membrane, &feed, 12.0, 25.0);
        assert!(k_fast > k_slow);

        let beta_lo = polarization_factor(lmh_to_m_s(12.0), k_fast);
        let beta_hi = polarization_factor(lmh_to_m_s(22.0), k_fast);
        assert!(beta_hi > beta_lo);
        // More crossflow, thinner film.
        assert!(
            polarization_factor(lmh_to_m_s(18.0), k_fast)
                < polarization_factor(lmh_to_m_s(18.0), k_slow)
        );
    }

    #[test]
    fn test_mixture_diffusivity_between_ion_values() {
        let d = mixture_diffusivity_m2_s(&brackish_feed());
        // Between Na+ (1.33e-9) and Cl- (2.03e-9).
        assert!((1.33e-9..2.03e-9).contains(&d), "D = {d}");
    }
}
