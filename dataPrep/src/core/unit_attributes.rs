use std::collections::BTreeMap;
use tracing::debug;
use crate::config::constants::{COMMISSIONING_YEAR_COL, EFFICIENCY_CUTOFF_YEAR, EFFICIENCY_DECIMALS, EFFICIENCY_FALLBACK_YEAR, MINUTES_PER_HOUR, TYPE_COL};
use crate::models::table::{Table, Value};
use crate::utils::error::{PrepError, PrepResult};

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

/// Electrical efficiency by commissioning year (rows) and tech_fuel (columns)
#[derive(Debug, Clone, Default)]
pub struct EfficiencyMatrix {
    values: BTreeMap<u32, BTreeMap<String, f64>>,
}

impl EfficiencyMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one row per year, labelled by the year, with a column per tech_fuel.
    pub fn from_table(table: &Table) -> PrepResult<Self> {
        let mut matrix = Self::new();
        for row in &table.rows {
            let year: u32 = row.label.trim().parse().map_err(|_| {
                PrepError::LookupFailure(format!("year label '{}' in efficiency matrix", row.label))
            })?;
            for (tech_fuel, value) in &row.cells {
                if let Some(eff) = value.as_f64() {
                    matrix.insert(year, tech_fuel, eff);
                }
            }
        }
        Ok(matrix)
    }

    pub fn insert(&mut self, year: u32, tech_fuel: &str, efficiency: f64) {
        self.values.entry(year).or_default().insert(tech_fuel.to_string(), efficiency);
    }

    /// Plants commissioned before 1950 are assigned the 1990 efficiency.
    pub fn efficiency(&self, commissioning_year: u32, tech_fuel: &str) -> PrepResult<f64> {
        let year = if commissioning_year >= EFFICIENCY_CUTOFF_YEAR {
            commissioning_year
        } else {
            EFFICIENCY_FALLBACK_YEAR
        };
        self.values
            .get(&year)
            .and_then(|row| row.get(tech_fuel))
            .map(|eff| round_to(*eff, EFFICIENCY_DECIMALS))
            .ok_or_else(|| {
                PrepError::LookupFailure(format!("efficiency for {} commissioned {}", tech_fuel, year))
            })
    }
}

/// Fills `efficiency_el` for every unit from its commissioning year and tech_fuel.
pub fn assign_efficiencies(units: &mut Table, matrix: &EfficiencyMatrix) -> PrepResult<()> {
    for row in units.rows.iter_mut() {
        let year = row.unsigned(COMMISSIONING_YEAR_COL)?;
        let tech_fuel = row.text("tech_fuel")?;
        let eff = matrix.efficiency(year, &tech_fuel)?;
        row.set("efficiency_el", eff);
    }
    Ok(())
}

/// Converts relative load gradients from %/min to a share of capacity per
/// hour (capped at 1) and sets fuel specific minimum loads for German
/// units outside the ipp/chp categories.
pub fn assign_gradients_and_min_loads(units: &mut Table, min_loads: &BTreeMap<String, f64>) -> PrepResult<()> {
    for row in units.rows.iter_mut() {
        let gradient = row.number("load_grad_relative")?;
        let limited = (MINUTES_PER_HOUR * gradient).min(1.0);
        row.set("grad_pos", limited);
        row.set("grad_neg", limited);
        row.remove("load_grad_relative");

        if let Some(min_load) = row.remove("min_load_LP") {
            row.set("min_load_factor", min_load);
        }

        let is_german = row.get("country").and_then(Value::as_str) == Some("DE");
        let is_emb = row.get(TYPE_COL).and_then(Value::as_str) == Some("emb");
        let fuel_min_load = if is_german && is_emb {
            row.get("fuel")
                .and_then(Value::as_str)
                .and_then(|fuel| min_loads.get(fuel))
                .copied()
        } else {
            None
        };
        if let Some(min_load) = fuel_min_load {
            debug!(unit = %row.label, min_load, "overriding minimum load");
            row.set("min_load_factor", min_load);
        }
    }
    Ok(())
}
