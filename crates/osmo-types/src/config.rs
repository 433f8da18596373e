// ─────────────────────────────────────────────────────────────────────
// SCPN Osmo Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Design, scaling-threshold, dosing and economic parameter records.
//!
//! Everything here is data with defaults; callers override per request and
//! the records travel read-only through the design and costing layers.

use serde::{Deserialize, Serialize};

use crate::error::{OsmoError, OsmoResult};
use crate::membrane::MembraneGrade;

/// Minerals tracked for scaling assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mineral {
    Calcite,
    Gypsum,
    Anhydrite,
    Barite,
    Celestite,
    Fluorite,
    AmorphousSilica,
}

impl Mineral {
    pub const ALL: [Mineral; 7] = [
        Mineral::Calcite,
        Mineral::Gypsum,
        Mineral::Anhydrite,
        Mineral::Barite,
        Mineral::Celestite,
        Mineral::Fluorite,
        Mineral::AmorphousSilica,
    ];

    /// Phase name as PHREEQC databases spell it.
    pub fn phreeqc_name(&self) -> &'static str {
        match self {
            Mineral::Calcite => "Calcite",
            Mineral::Gypsum => "Gypsum",
            Mineral::Anhydrite => "Anhydrite",
            Mineral::Barite => "Barite",
            Mineral::Celestite => "Celestite",
            Mineral::Fluorite => "Fluorite",
            Mineral::AmorphousSilica => "SiO2(a)",
        }
    }

    pub fn from_phreeqc_name(name: &str) -> Option<Mineral> {
        Mineral::ALL
            .iter()
            .copied()
            .find(|m| m.phreeqc_name() == name)
    }
}

/// Antiscalant program assumed when judging saturation indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntiscalantTier {
    None,
    Standard,
    HighPerformance,
}

/// Per-mineral SI ceilings. The numbers are supplier guidance, not
/// algorithmic invariants; tiers below are representative defaults and any
/// table may be passed in their place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiThresholds {
    pub tier: AntiscalantTier,
    pub limits: Vec<(Mineral, f64)>,
}

impl SiThresholds {
    pub fn for_tier(tier: AntiscalantTier) -> Self {
        let limits = match tier {
            AntiscalantTier::None => Mineral::ALL.iter().map(|m| (*m, 0.0)).collect(),
            AntiscalantTier::Standard => vec![
                (Mineral::Calcite, 1.0),
                (Mineral::Gypsum, 1.2),
                (Mineral::Anhydrite, 1.2),
                (Mineral::Barite, 2.0),
                (Mineral::Celestite, 1.5),
                (Mineral::Fluorite, 1.2),
                (Mineral::AmorphousSilica, 1.0),
            ],
            AntiscalantTier::HighPerformance => vec![
                (Mineral::Calcite, 1.5),
                (Mineral::Gypsum, 1.8),
                (Mineral::Anhydrite, 1.8),
                (Mineral::Barite, 2.5),
                (Mineral::Celestite, 1.8),
                (Mineral::Fluorite, 1.5),
                (Mineral::AmorphousSilica, 1.3),
            ],
        };
        SiThresholds { tier, limits }
    }

    pub fn limit(&self, mineral: Mineral) -> f64 {
        self.limits
            .iter()
            .find(|(m, _)| *m == mineral)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

/// Vessel-array design settings for the configuration optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayDesignSettings {
    /// Per-stage flux targets (LMH). The last entry repeats for deeper
    /// stages.
    pub flux_targets_lmh: Vec<f64>,
    /// Allowed flux deviation from target, as a fraction.
    pub flux_tolerance: f64,
    /// Hard floor on flux as a fraction of target, used only when loosening
    /// is the sole way to hit the recovery target.
    pub flux_floor_fraction: f64,
    /// Minimum concentrate flow per vessel per stage (m³/h), fouling limit.
    pub min_concentrate_per_vessel_m3h: Vec<f64>,
    pub elements_per_vessel: usize,
    pub max_stages: usize,
    /// Accepted deviation of achieved from target recovery.
    pub recovery_tolerance: f64,
    pub allow_recycle: bool,
    /// Maximum fraction of final-stage concentrate routed back to the feed.
    pub max_recycle_ratio: f64,
    /// Per-stage vessel count above which a soft warning is attached.
    pub vessel_count_warning: usize,
}

impl Default for ArrayDesignSettings {
    fn default() -> Self {
        ArrayDesignSettings {
            flux_targets_lmh: vec![18.0, 15.0, 12.0],
            flux_tolerance: 0.1,
            flux_floor_fraction: 0.7,
            min_concentrate_per_vessel_m3h: vec![3.5, 3.8, 4.0],
            elements_per_vessel: 7,
            max_stages: 3,
            recovery_tolerance: 0.02,
            allow_recycle: true,
            max_recycle_ratio: 0.9,
            vessel_count_warning: 500,
        }
    }
}

impl ArrayDesignSettings {
    /// Flux target for a 0-based stage index; the last entry repeats.
    pub fn flux_target(&self, stage: usize) -> f64 {
        let idx = stage.min(self.flux_targets_lmh.len() - 1);
        self.flux_targets_lmh[idx]
    }

    /// Fouling minimum for a 0-based stage index; the last entry repeats.
    pub fn min_concentrate(&self, stage: usize) -> f64 {
        let idx = stage.min(self.min_concentrate_per_vessel_m3h.len() - 1);
        self.min_concentrate_per_vessel_m3h[idx]
    }

    pub fn validate(&self) -> OsmoResult<()> {
        if self.flux_targets_lmh.is_empty() {
            return Err(OsmoError::ConfigError(
                "at least one flux target required".into(),
            ));
        }
        if self.flux_targets_lmh.iter().any(|j| *j <= 0.0) {
            return Err(OsmoError::ConfigError(
                "flux targets must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.flux_tolerance) {
            return Err(OsmoError::ConfigError(format!(
                "flux tolerance {} outside [0, 1)",
                self.flux_tolerance
            )));
        }
        if !(0.0..1.0).contains(&self.flux_floor_fraction) {
            return Err(OsmoError::ConfigError(format!(
                "flux floor fraction {} outside [0, 1)",
                self.flux_floor_fraction
            )));
        }
        if self.max_stages == 0 || self.max_stages > 3 {
            return Err(OsmoError::ConfigError(format!(
                "max stages {} outside 1..=3",
                self.max_stages
            )));
        }
        if !(0.0..=1.0).contains(&self.max_recycle_ratio) {
            return Err(OsmoError::ConfigError(format!(
                "max recycle ratio {} outside [0, 1]",
                self.max_recycle_ratio
            )));
        }
        if self.elements_per_vessel == 0 || self.elements_per_vessel > 8 {
            return Err(OsmoError::ConfigError(format!(
                "elements per vessel {} outside 1..=8",
                self.elements_per_vessel
            )));
        }
        Ok(())
    }
}

/// Reagent unit prices ($/kg).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReagentPrices {
    pub hcl_usd_kg: f64,
    pub h2so4_usd_kg: f64,
    pub naoh_usd_kg: f64,
    pub lime_usd_kg: f64,
    pub soda_ash_usd_kg: f64,
    pub co2_usd_kg: f64,
    pub antiscalant_usd_kg: f64,
    pub cip_surfactant_usd_kg: f64,
}

impl Default for ReagentPrices {
    fn default() -> Self {
        ReagentPrices {
            hcl_usd_kg: 0.17,
            h2so4_usd_kg: 0.10,
            naoh_usd_kg: 0.59,
            lime_usd_kg: 0.15,
            soda_ash_usd_kg: 0.25,
            co2_usd_kg: 0.30,
            antiscalant_usd_kg: 2.50,
            cip_surfactant_usd_kg: 3.00,
        }
    }
}

/// Economic model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicParams {
    pub wacc: f64,
    pub plant_lifetime_years: f64,
    pub utilization_factor: f64,
    pub electricity_cost_usd_kwh: f64,

    pub membrane_replacement_factor: f64,
    pub membrane_cost_brackish_usd_m2: f64,
    pub membrane_cost_seawater_usd_m2: f64,

    /// High-pressure pump capital ($ per W of mechanical work).
    pub high_pressure_pump_cost_usd_w: f64,
    /// Low-pressure pump capital ($ per L/s of flow).
    pub low_pressure_pump_cost_usd_lps: f64,
    /// Boundary between the two pump cost laws (bar).
    pub high_pressure_threshold_bar: f64,
    pub pump_efficiency: f64,

    pub auto_include_erd: bool,
    pub erd_pressure_threshold_bar: f64,
    pub erd_efficiency: f64,
    /// Isobaric pressure-exchanger capital ($ per m³/h brine).
    pub pressure_exchanger_cost_usd_m3h: f64,
    /// Turbocharger capital ($ per m³/h brine), used below the brine-flow
    /// class boundary.
    pub turbocharger_cost_usd_m3h: f64,
    /// Brine flow above which an isobaric exchanger is selected (m³/h).
    pub erd_isobaric_min_brine_m3h: f64,

    pub include_cartridge_filters: bool,
    pub cartridge_filter_cost_usd_m3h: f64,
    pub include_cip_system: bool,
    pub cip_capital_cost_usd_m2: f64,

    /// Indirect capital multiplier on direct equipment cost.
    pub indirect_cost_factor: f64,

    /// Fixed O&M items, each as a fraction of fixed capital per year.
    pub salaries_percent_fci: f64,
    pub benefit_percent_of_salary: f64,
    pub maintenance_percent_fci: f64,
    pub laboratory_percent_fci: f64,
    pub insurance_percent_fci: f64,

    pub reagents: ReagentPrices,
}

impl Default for EconomicParams {
    fn default() -> Self {
        EconomicParams {
            wacc: 0.093,
            plant_lifetime_years: 30.0,
            utilization_factor: 0.9,
            electricity_cost_usd_kwh: 0.07,
            membrane_replacement_factor: 0.2,
            membrane_cost_brackish_usd_m2: 30.0,
            membrane_cost_seawater_usd_m2: 75.0,
            high_pressure_pump_cost_usd_w: 1.908,
            low_pressure_pump_cost_usd_lps: 889.0,
            high_pressure_threshold_bar: 45.0,
            pump_efficiency: 0.80,
            auto_include_erd: true,
            erd_pressure_threshold_bar: 45.0,
            erd_efficiency: 0.95,
            pressure_exchanger_cost_usd_m3h: 535.0,
            turbocharger_cost_usd_m3h: 260.0,
            erd_isobaric_min_brine_m3h: 20.0,
            include_cartridge_filters: false,
            cartridge_filter_cost_usd_m3h: 100.0,
            include_cip_system: false,
            cip_capital_cost_usd_m2: 50.0,
            indirect_cost_factor: 2.5,
            salaries_percent_fci: 0.001,
            benefit_percent_of_salary: 0.9,
            maintenance_percent_fci: 0.008,
            laboratory_percent_fci: 0.003,
            insurance_percent_fci: 0.002,
            reagents: ReagentPrices::default(),
        }
    }
}

impl EconomicParams {
    /// Defaults adjusted for a membrane duty class.
    pub fn default_for(grade: MembraneGrade) -> Self {
        let mut params = EconomicParams::default();
        if grade == MembraneGrade::Seawater {
            // Seawater trains always carry energy recovery.
            params.auto_include_erd = true;
        }
        params
    }

    pub fn membrane_cost_usd_m2(&self, grade: MembraneGrade) -> f64 {
        match grade {
            MembraneGrade::Brackish => self.membrane_cost_brackish_usd_m2,
            MembraneGrade::Seawater => self.membrane_cost_seawater_usd_m2,
        }
    }

    pub fn validate(&self) -> OsmoResult<()> {
        if self.wacc <= 0.0 || self.wacc >= 0.3 {
            return Err(OsmoError::ConfigError(format!(
                "WACC {} outside (0, 0.3)",
                self.wacc
            )));
        }
        if !(5.0..=50.0).contains(&self.plant_lifetime_years) {
            return Err(OsmoError::ConfigError(format!(
                "plant lifetime {} outside 5..=50 years",
                self.plant_lifetime_years
            )));
        }
        if !(0.5..=1.0).contains(&self.utilization_factor) {
            return Err(OsmoError::ConfigError(format!(
                "utilization factor {} outside [0.5, 1.0]",
                self.utilization_factor
            )));
        }
        if self.electricity_cost_usd_kwh <= 0.0 || self.electricity_cost_usd_kwh >= 1.0 {
            return Err(OsmoError::ConfigError(format!(
                "electricity cost {} $/kWh unrealistic",
                self.electricity_cost_usd_kwh
            )));
        }
        if self.membrane_replacement_factor <= 0.0 || self.membrane_replacement_factor > 1.0 {
            return Err(OsmoError::ConfigError(format!(
                "membrane replacement factor {} outside (0, 1]",
                self.membrane_replacement_factor
            )));
        }
        if self.auto_include_erd && !(0.8..=0.98).contains(&self.erd_efficiency) {
            return Err(OsmoError::ConfigError(format!(
                "ERD efficiency {} outside [0.8, 0.98]",
                self.erd_efficiency
            )));
        }
        if !(0.0..1.0).contains(&self.pump_efficiency) || self.pump_efficiency < 0.4 {
            return Err(OsmoError::ConfigError(format!(
                "pump efficiency {} outside [0.4, 1.0)",
                self.pump_efficiency
            )));
        }
        Ok(())
    }
}

/// Chemical dosing program applied to the feed and to periodic cleanings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalDosing {
    pub antiscalant_dose_mg_l: f64,
    pub acid_dose_kg_m3: f64,
    pub base_dose_kg_m3: f64,
    pub cip_frequency_per_year: f64,
    pub cip_dose_kg_per_m2: f64,
    pub cip_surfactant_fraction: f64,
    pub cip_acid_fraction: f64,
    pub cip_base_fraction: f64,
}

impl Default for ChemicalDosing {
    fn default() -> Self {
        ChemicalDosing {
            antiscalant_dose_mg_l: 5.0,
            acid_dose_kg_m3: 0.0,
            base_dose_kg_m3: 0.0,
            cip_frequency_per_year: 4.0,
            cip_dose_kg_per_m2: 0.5,
            cip_surfactant_fraction: 0.7,
            cip_acid_fraction: 0.2,
            cip_base_fraction: 0.1,
        }
    }
}

impl ChemicalDosing {
    pub fn validate(&self) -> OsmoResult<()> {
        if !(0.0..=20.0).contains(&self.antiscalant_dose_mg_l) {
            return Err(OsmoError::ConfigError(format!(
                "antiscalant dose {} mg/L outside [0, 20]",
                self.antiscalant_dose_mg_l
            )));
        }
        if !(1.0..=12.0).contains(&self.cip_frequency_per_year) {
            return Err(OsmoError::ConfigError(format!(
                "CIP frequency {}/yr outside [1, 12]",
                self.cip_frequency_per_year
            )));
        }
        let fractions =
            self.cip_surfactant_fraction + self.cip_acid_fraction + self.cip_base_fraction;
        if (fractions - 1.0).abs() > 0.01 {
            return Err(OsmoError::ConfigError(format!(
                "CIP chemical fractions sum to {fractions}, expected 1.0"
            )));
        }
        Ok(())
    }
}
