//! Parses PHREEQC SELECTED_OUTPUT tables.
//!
//! The table is whitespace-separated: one header row, one data row per
//! calculation. The post-REACTION state is the last row. SI columns are
//! `si_<Phase>`, molalities `m_<Species>(mol/kgw)`, totals
//! `<Element>(mol/kgw)`; a value of -999 marks a phase absent from the
//! database run.

use osmo_types::config::Mineral;
use osmo_types::error::{OsmoError, OsmoResult};

/// One parsed result row.
#[derive(Debug, Clone)]
pub struct SelectedOutputRow {
    pub ph: f64,
    /// Dissolved CO2 (mol/kgw); zero when the column is absent.
    pub co2_mol_kgw: f64,
    /// Element totals (element label, mol/kgw).
    pub element_totals: Vec<(String, f64)>,
    pub saturation_indices: Vec<(Mineral, f64)>,
}

/// Marker PHREEQC emits for phases it cannot compute.
const SI_ABSENT: f64 = -999.0;

enum Column {
    Ph,
    Co2,
    Si(Mineral),
    Total(String),
    Ignored,
}

fn classify(header: &str) -> Column {
    // SI columns carry the full phase name, parentheses included
    // (si_SiO2(a)); classify them before stripping unit suffixes.
    if let Some(phase) = header.strip_prefix("si_") {
        return match Mineral::from_phreeqc_name(phase) {
            Some(m) => Column::Si(m),
            None => Column::Ignored,
        };
    }
    // Totals keep valence markers ("S(6)", "N(-3)"); only the unit
    // suffix comes off.
    let base = header.strip_suffix("(mol/kgw)").unwrap_or(header);
    if base.eq_ignore_ascii_case("pH") {
        return Column::Ph;
    }
    if let Some(species) = base.strip_prefix("m_") {
        if species == "CO2" {
            return Column::Co2;
        }
        return Column::Ignored;
    }
    // Everything else in our decks is an element total.
    if !base.is_empty() && base.chars().next().unwrap().is_ascii_uppercase() {
        return Column::Total(base.to_string());
    }
    Column::Ignored
}

/// Parse the selected-output text, returning the final (post-reaction)
/// row.
pub fn parse(text: &str) -> OsmoResult<SelectedOutputRow> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines
        .next()
        .ok_or_else(|| OsmoError::ChemistryError("empty selected output".into()))?;
    let columns: Vec<Column> = header_line.split_whitespace().map(classify).collect();

    let data_line = lines
        .last()
        .ok_or_else(|| OsmoError::ChemistryError("selected output has no data rows".into()))?;
    let fields: Vec<&str> = data_line.split_whitespace().collect();
    if fields.len() != columns.len() {
        return Err(OsmoError::ChemistryError(format!(
            "selected output row has {} fields, header has {} columns",
            fields.len(),
            columns.len()
        )));
    }

    let mut ph = None;
    let mut co2 = 0.0;
    let mut element_totals = Vec::new();
    let mut saturation_indices = Vec::new();

    for (column, field) in columns.iter().zip(fields) {
        if matches!(column, Column::Ignored) {
            continue;
        }
        let value: f64 = field.parse().map_err(|e| {
            OsmoError::ChemistryError(format!("cannot parse '{field}' as number: {e}"))
        })?;
        match column {
            Column::Ph => ph = Some(value),
            Column::Co2 => co2 = value,
            Column::Si(mineral) => {
                if value != SI_ABSENT && value.is_finite() {
                    saturation_indices.push((*mineral, value));
                }
            }
            Column::Total(element) => element_totals.push((element.clone(), value)),
            Column::Ignored => unreachable!(),
        }
    }

    let ph = ph.ok_or_else(|| OsmoError::ChemistryError("missing pH column".into()))?;
    if !ph.is_finite() {
        return Err(OsmoError::ChemistryError(format!(
            "non-finite equilibrium pH: {ph}"
        )));
    }
    if saturation_indices.is_empty() {
        return Err(OsmoError::ChemistryError(
            "no saturation indices in selected output".into(),
        ));
    }

    Ok(SelectedOutputRow {
        ph,
        co2_mol_kgw: co2,
        element_totals,
        saturation_indices,
    })
}
