// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Stage Pressure
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Feed-pressure assembly: wall osmotic pressure + net driving pressure
//! for the target flux + spacer channel losses. Guards the membrane
//! pressure envelope.

use osmo_types::error::{OsmoError, OsmoResult};
use osmo_types::membrane::MembraneSpec;
use osmo_types::state::StageDesign;

/// Gallons per minute per m³/h.
const GPM_PER_M3H: f64 = 4.4029;
/// Pascals per psi.
const PA_PER_PSI: f64 = 6894.76;
/// Flow exponent of the spacer-channel loss correlation.
const SPACER_FLOW_EXPONENT: f64 = 1.7;
/// Permeate-side backpressure the feed must clear (Pa).
const PERMEATE_BACKPRESSURE_PA: f64 = 1.0e5;

/// Pressure components of one stage (all Pa).
#[derive(Debug, Clone, Copy)]
pub struct StagePressure {
    pub feed_pressure_pa: f64,
    pub wall_osmotic_pa: f64,
    pub net_driving_pa: f64,
    pub channel_drop_pa: f64,
}

/// Spacer-channel pressure drop across a stage: per-element power-law
/// loss at the arithmetic-average vessel flow, summed over the elements
/// in series.
pub fn channel_drop_pa(stage: &StageDesign, membrane: &MembraneSpec) -> f64 {
    let avg_flow_per_vessel =
        (stage.feed_flow_m3h + stage.concentrate_flow_m3h) / 2.0 / stage.n_vessels as f64;
    let flow_gpm = avg_flow_per_vessel * GPM_PER_M3H;
    let drop_per_element_psi = membrane.spacer_k * flow_gpm.powf(SPACER_FLOW_EXPONENT);
    drop_per_element_psi * stage.elements_per_vessel as f64 * PA_PER_PSI
}

/// Assemble the stage feed pressure.
///
/// `wall_osmotic_pa` must already carry the polarization factor. Errors:
/// `FluxOutOfRange` when the driving term is non-physical,
/// `PressureLimitExceeded` when the total clears the membrane envelope.
pub fn required_feed_pressure(
    stage: &StageDesign,
    membrane: &MembraneSpec,
    wall_osmotic_pa: f64,
    flux_m_s: f64,
    a_w_at_t: f64,
) -> OsmoResult<StagePressure> {
    if flux_m_s <= 0.0 || !flux_m_s.is_finite() {
        return Err(OsmoError::FluxOutOfRange(format!(
            "stage {} flux {flux_m_s} m/s is not a physical operating point",
            stage.stage_number
        )));
    }
    let net_driving_pa = flux_m_s / a_w_at_t;
    if !net_driving_pa.is_finite() || net_driving_pa <= 0.0 {
        return Err(OsmoError::FluxOutOfRange(format!(
            "stage {} net driving pressure {net_driving_pa} Pa",
            stage.stage_number
        )));
    }

    let channel_drop = channel_drop_pa(stage, membrane);
    let feed_pressure =
        wall_osmotic_pa + net_driving_pa + channel_drop + PERMEATE_BACKPRESSURE_PA;

    if feed_pressure > membrane.max_pressure_pa {
        return Err(OsmoError::PressureLimitExceeded {
            computed_pa: feed_pressure,
            limit_pa: membrane.max_pressure_pa,
        });
    }

    Ok(StagePressure {
        feed_pressure_pa: feed_pressure,
        wall_osmotic_pa,
        net_driving_pa,
        channel_drop_pa: channel_drop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmo_types::constants::lmh_to_m_s;
    use osmo_types::membrane::MembraneCatalog;

    fn stage() -> StageDesign {
        StageDesign {
            stage_number: 1,
            n_vessels: 12,
            elements_per_vessel: 7,
            membrane_area_m2: 12.0 * 260.12,
            flux_target_lmh: 18.0,
            flux_lmh: 18.0,
            feed_flow_m3h: 100.0,
            permeate_flow_m3h: 56.2,
            concentrate_flow_m3h: 43.8,
            stage_recovery: 0.562,
            concentrate_per_vessel_m3h: 3.65,
            min_concentrate_per_vessel_m3h: 3.5,
        }
    }

    #[test]
    fn test_channel_drop_fraction_of_bar() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let drop = channel_drop_pa(&stage(), membrane);
        // ~0.2 bar per element over 7 elements in series.
        assert!((0.1e5..2.5e5).contains(&drop), "drop = {drop}");
    }

    #[test]
    fn test_brackish_feed_pressure_band() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let pressure = required_feed_pressure(
            &stage(),
            membrane,
            2.6e5, // ~2.4 bar bulk π with β ≈ 1.1
            lmh_to_m_s(18.0),
            membrane.a_w_m_s_pa,
        )
        .unwrap();
        // NDP = 5e-6 / 9.63e-12 ≈ 5.2 bar; total ≈ 8–10 bar.
        assert!(
            (7.0e5..10.5e5).contains(&pressure.feed_pressure_pa),
            "P = {}",
            pressure.feed_pressure_pa
        );
        assert!((pressure.net_driving_pa - 5.19e5).abs() < 0.05e5);
    }

    #[test]
    fn test_pressure_limit_boundary() {
        let catalog = MembraneCatalog::builtin();
        let mut membrane = catalog.get("BW30_PRO_400").unwrap().clone();
        let flux = lmh_to_m_s(18.0);
        let exact = required_feed_pressure(&stage(), &membrane, 2.6e5, flux, membrane.a_w_m_s_pa)
            .unwrap()
            .feed_pressure_pa;

        // Exactly at the limit: solves.
        membrane.max_pressure_pa = exact;
        assert!(
            required_feed_pressure(&stage(), &membrane, 2.6e5, flux, membrane.a_w_m_s_pa).is_ok()
        );

        // One pascal below the requirement: refused.
        membrane.max_pressure_pa = exact - 1.0;
        let err = required_feed_pressure(&stage(), &membrane, 2.6e5, flux, membrane.a_w_m_s_pa)
            .unwrap_err();
        assert!(matches!(err, OsmoError::PressureLimitExceeded { .. }));
    }

    #[test]
    fn test_nonphysical_flux_rejected() {
        let catalog = MembraneCatalog::builtin();
        let membrane = catalog.get("BW30_PRO_400").unwrap();
        let err =
            required_feed_pressure(&stage(), membrane, 2.6e5, 0.0, membrane.a_w_m_s_pa)
                .unwrap_err();
        assert!(matches!(err, OsmoError::FluxOutOfRange(_)));
    }
}
