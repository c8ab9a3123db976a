use std::collections::HashSet;
use tracing::{debug, info};
use crate::config::constants::{
    CAPACITY_COL, COMMISSIONING_YEAR_COL, ENERGY_SOURCE_COL, FIXED_COL, MARKET_PREMIUM, SUPPORT_SCHEME_COL,
    VALUE_APPLIED_COL,
};
use crate::config::energy_source::{CapacityColumn, EnergySource};
use crate::core::distribution::CapacityDistribution;
use crate::models::table::{Row, Table};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

pub fn new_build_label(source: EnergySource, slice: usize, year: u32) -> String {
    format!("{}_new_{}_{}", source.model_name(), slice, year)
}

/// Annual capacity addition for `year`, keyed either by year or by source.
pub fn annual_expansion(
    targets: &Table,
    source: EnergySource,
    year: u32,
    capacity_column: CapacityColumn,
    indexed_by_year: bool,
) -> PrepResult<f64> {
    let key = if indexed_by_year {
        year.to_string()
    } else {
        source.model_name().to_string()
    };
    let row = targets
        .find(&key)
        .ok_or_else(|| PrepError::LookupFailure(format!("expansion target for '{}'", key)))?;
    row.number(capacity_column.as_str())
}

/// Appends one synthetic market-premium unit per (year, slice) to `new_built`.
///
/// Capacity of a slice is its share of the annual expansion, so the units
/// of a year add up to the annual total. Returns the number of rows added.
pub fn synthesize_new_build(
    distribution: &CapacityDistribution,
    new_built: &mut Table,
    targets: &Table,
    source: EnergySource,
    capacity_column: CapacityColumn,
    indexed_by_year: bool,
) -> PrepResult<usize> {
    let _timing = logging::start_timing("synthesize_new_build", OperationCategory::Synthesis);

    let mut taken: HashSet<String> = new_built.rows.iter().map(|r| r.label.clone()).collect();
    let mut added: Vec<Row> = Vec::new();
    for (year, fitted) in &distribution.years {
        let annual_total = annual_expansion(targets, source, *year, capacity_column, indexed_by_year)?;
        debug!(year, annual_total, source = source.model_name(), "synthesizing new-build units");

        for (i, slice) in fitted.slices.iter().enumerate() {
            let label = new_build_label(source, i + 1, *year);
            if !taken.insert(label.clone()) {
                return Err(PrepError::DuplicateLabel(label));
            }
            added.push(
                Row::new(label)
                    .with(CAPACITY_COL, slice.share * annual_total)
                    .with(ENERGY_SOURCE_COL, source.raw_name())
                    .with(FIXED_COL, 0i64)
                    .with(VALUE_APPLIED_COL, slice.value)
                    .with(SUPPORT_SCHEME_COL, MARKET_PREMIUM)
                    .with(COMMISSIONING_YEAR_COL, *year),
            );
        }
    }

    let count = added.len();
    new_built.rows.extend(added);
    info!("Added {} new-build units for {}", count, source);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use crate::core::distribution::{build_distribution, CostTriple};

    fn distribution() -> CapacityDistribution {
        let mut costs = BTreeMap::new();
        costs.insert(2025, CostTriple::new(40.0, 55.0, 100.0));
        costs.insert(2026, CostTriple::new(38.0, 52.0, 95.0));
        build_distribution(&costs, 2.0, 10).unwrap()
    }

    fn by_source() -> Table {
        Table::from_rows(vec![
            Row::new("windonshore").with("capacity", 2900.0).with("MP", 2500.0),
            Row::new("solarPV").with("capacity", 4600.0),
        ])
    }

    fn by_year() -> Table {
        Table::from_rows(vec![
            Row::new("2025").with("capacity_awarded", 1500.0),
            Row::new("2026").with("capacity_awarded", 1800.0),
        ])
    }

    #[test]
    fn yearly_capacity_adds_up_to_target() {
        let dist = distribution();
        let mut new_built = Table::new();
        let added = synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::WindOnshore, CapacityColumn::Capacity, false).unwrap();
        assert_eq!(added, 20);

        for year in [2025u32, 2026] {
            let total: f64 = new_built
                .rows
                .iter()
                .filter(|r| r.number("commissioning_year").unwrap() == year as f64)
                .map(|r| r.number("capacity").unwrap())
                .sum();
            assert!((total - 2900.0).abs() < 1e-6);
        }

        let first = new_built.find("windonshore_new_1_2025").unwrap();
        assert_eq!(first.text("support_scheme").unwrap(), "MP");
        assert_eq!(first.text("energy_source").unwrap(), "Wind_Onshore");
        assert!((first.number("value_applied").unwrap() - 43.0).abs() < 1e-9);
        assert!(new_built.rows.iter().all(|r| r.number("fixed").unwrap() == 0.0));
    }

    #[test]
    fn clash_with_preexisting_row_appends_nothing() {
        let dist = distribution();
        let mut new_built = Table::from_rows(vec![
            Row::new("windonshore_new_1_2024").with("capacity", 10.0),
            Row::new("windonshore_new_3_2026").with("capacity", 12.0),
        ]);
        let result = synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::WindOnshore, CapacityColumn::Capacity, false);
        match result {
            Err(PrepError::DuplicateLabel(label)) => assert_eq!(label, "windonshore_new_3_2026"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(new_built.len(), 2);
    }

    #[test]
    fn labels_unique_across_sources_and_years() {
        let dist = distribution();
        let mut new_built = Table::new();
        synthesize_new_build(&dist, &mut new_built, &by_year(), EnergySource::WindOnshore, CapacityColumn::CapacityAwarded, true).unwrap();
        synthesize_new_build(&dist, &mut new_built, &by_year(), EnergySource::Solar, CapacityColumn::CapacityAwarded, true).unwrap();

        let labels: BTreeSet<&str> = new_built.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels.len(), new_built.len());
        assert_eq!(new_built.len(), 40);

        let total_2026: f64 = new_built
            .rows
            .iter()
            .filter(|r| r.label.starts_with("solarPV") && r.label.ends_with("2026"))
            .map(|r| r.number("capacity").unwrap())
            .sum();
        assert!((total_2026 - 1800.0).abs() < 1e-6);
    }

    #[test]
    fn repeated_run_on_same_accumulator_is_rejected() {
        let dist = distribution();
        let mut new_built = Table::new();
        synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::Solar, CapacityColumn::Capacity, false).unwrap();
        let again = synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::Solar, CapacityColumn::Capacity, false);
        assert!(matches!(again, Err(PrepError::DuplicateLabel(_))));
        assert_eq!(new_built.len(), 20);
    }

    #[test]
    fn missing_target_names_the_key() {
        let dist = distribution();
        let mut new_built = Table::new();
        let result = synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::WindOffshore, CapacityColumn::Capacity, false);
        match result {
            Err(PrepError::LookupFailure(msg)) => assert!(msg.contains("windoffshore")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(new_built.is_empty());

        let result = synthesize_new_build(&dist, &mut new_built, &by_source(), EnergySource::Solar, CapacityColumn::MarketPremium, false);
        assert!(matches!(result, Err(PrepError::LookupFailure(_))));
    }
}
