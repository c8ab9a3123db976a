//! Existing renewable fleet as clustered transformers.
//!
//! Units under the market premium scheme are clustered per energy source
//! by the value they were awarded; the value enters the model as a
//! negative cost. Capacity outside the scheme is kept as one exogenous,
//! fixed-output unit per source.

use std::collections::BTreeMap;
use tracing::{info, warn};
use crate::config::constants::*;
use crate::config::energy_source::{EnergyCostUnit, EnergySource, MODEL_COST_UNIT};
use crate::core::aggregation::{aggregate_units, AggregationRules};
use crate::core::clustering::{distinct_count, ClusterIdAllocator};
use crate::core::kmeans::ClusteringStrategy;
use crate::core::unit_attributes::round_to;
use crate::models::table::{Row, Table, Value};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

fn transformer_row(source: EnergySource, number: &str, capacity: f64, value_ct: f64, fixed: i64) -> Row {
    let value = EnergyCostUnit::CtPerKwh.convert(value_ct, MODEL_COST_UNIT);
    Row::new(format!("{}_{}_cluster_{}", COUNTRY_PREFIX, source.model_name(), number))
        .with("from", format!("{}_bus_{}", COUNTRY_PREFIX, source.model_name()))
        .with(CAPACITY_COL, round_to(capacity, OUTPUT_DECIMALS))
        .with(FIXED_COL, fixed)
        .with(VALUE_APPLIED_COL, round_to(value, OUTPUT_DECIMALS))
        .with("grad_pos", RES_GRADIENT_LIMIT)
        .with("grad_neg", RES_GRADIENT_LIMIT)
        .with("min_load_factor", RES_MIN_LOAD_FACTOR)
}

/// Builds renewable transformers from raw plant records.
///
/// Input rows need `energy_source` (raw name), `capacity` in kW,
/// `support_scheme` and, for market premium plants, `value_applied` in
/// ct/kWh. Output capacities are MW and values EUR/MWh.
pub fn build_res_transformers<S: ClusteringStrategy>(
    plants: &Table,
    cluster_no: usize,
    strategy: &mut S,
) -> PrepResult<Table> {
    let _timing = logging::start_timing("build_res_transformers", OperationCategory::Clustering);

    if cluster_no == 0 {
        return Err(PrepError::InvalidConfiguration("cluster number must be positive".to_string()));
    }

    let mut totals: BTreeMap<EnergySource, f64> = BTreeMap::new();
    let mut market_premium: BTreeMap<EnergySource, Vec<Row>> = BTreeMap::new();
    for plant in &plants.rows {
        let source = match plant
            .get(ENERGY_SOURCE_COL)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<EnergySource>().ok())
        {
            Some(source) => source,
            None => continue,
        };
        let capacity_mw = plant.number(CAPACITY_COL)? / 1000.0;
        *totals.entry(source).or_insert(0.0) += capacity_mw;

        if plant.get(SUPPORT_SCHEME_COL).and_then(Value::as_str) == Some(MARKET_PREMIUM) {
            let mut row = plant.clone();
            row.set(ENERGY_SOURCE_COL, source.model_name());
            row.set(CAPACITY_COL, capacity_mw);
            market_premium.entry(source).or_default().push(row);
        }
    }

    let mut allocator = ClusterIdAllocator::new();
    let mut clustered = Table::new();
    for (source, mut rows) in market_premium {
        let values = rows
            .iter()
            .map(|r| r.number(VALUE_APPLIED_COL))
            .collect::<PrepResult<Vec<f64>>>()?;
        let distinct = distinct_count(&values);
        let k = cluster_no.min(distinct);
        if k < cluster_no {
            warn!(
                "{} has only {} distinct applied values, using {} instead of {} clusters",
                source, distinct, k, cluster_no
            );
        }

        let labels = strategy.cluster(&values, k)?;
        let first_id = allocator.allocate(k);
        for (row, label) in rows.iter_mut().zip(&labels) {
            row.set(CLUSTER_COL, first_id + *label as i64);
        }
        clustered.rows.extend(rows);
    }

    let rules = AggregationRules::new(&[ENERGY_SOURCE_COL, CLUSTER_COL])
        .mean(&[VALUE_APPLIED_COL])
        .sum(&[CAPACITY_COL]);
    let aggregated = if clustered.is_empty() {
        Table::new()
    } else {
        aggregate_units(&clustered, &rules)?
    };

    let mut per_source: BTreeMap<EnergySource, Vec<(f64, f64)>> = BTreeMap::new();
    for row in &aggregated.rows {
        let name = row.text(ENERGY_SOURCE_COL)?;
        let source = EnergySource::from_model_name(&name)
            .ok_or_else(|| PrepError::LookupFailure(format!("energy source '{}'", name)))?;
        per_source
            .entry(source)
            .or_default()
            .push((row.number(VALUE_APPLIED_COL)?, row.number(CAPACITY_COL)?));
    }

    let mut transformers = Table::new();
    for (source, total) in &totals {
        let mut clusters = per_source.remove(source).unwrap_or_default();
        clusters.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut modeled = 0.0;
        for (i, (value, capacity)) in clusters.iter().enumerate() {
            modeled += capacity;
            transformers.push(transformer_row(*source, &(i + 1).to_string(), *capacity, *value, 0));
        }

        let exogenous = (total - modeled).round();
        transformers.push(transformer_row(*source, "exogenous", exogenous, 0.0, 1));
        info!(
            "{}: {} clusters with {:.1} MW, {:.0} MW exogenous",
            source.model_name(),
            clusters.len(),
            modeled,
            exogenous
        );
    }

    Ok(transformers)
}
