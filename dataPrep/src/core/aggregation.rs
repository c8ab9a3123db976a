use std::collections::BTreeMap;
use tracing::debug;
use crate::config::constants::CAPACITY_COL;
use crate::models::table::{Row, Table, Value};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

/// Column lists telling [`aggregate_units`] how to reduce each cluster.
#[derive(Debug, Clone, Default)]
pub struct AggregationRules {
    pub grouping_cols: Vec<String>,
    pub mean_cols: Vec<String>,        // capacity weighted average
    pub sum_cols: Vec<String>,
    pub passthrough_cols: Vec<String>, // value of the first row in input order
}

impl AggregationRules {
    pub fn new(grouping_cols: &[&str]) -> Self {
        Self {
            grouping_cols: to_owned(grouping_cols),
            ..Default::default()
        }
    }

    pub fn mean(mut self, cols: &[&str]) -> Self {
        self.mean_cols.extend(to_owned(cols));
        self
    }

    pub fn sum(mut self, cols: &[&str]) -> Self {
        self.sum_cols.extend(to_owned(cols));
        self
    }

    pub fn passthrough(mut self, cols: &[&str]) -> Self {
        self.passthrough_cols.extend(to_owned(cols));
        self
    }
}

fn to_owned(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

/// Reduces every distinct grouping key to one row.
///
/// Capacity weights are read once from the full input table and addressed
/// by each row's original position, never re-derived per group. Groups come
/// out in ascending key order; within a group rows keep their input order,
/// which decides the passthrough values. Output labels are `0..n`.
pub fn aggregate_units(units: &Table, rules: &AggregationRules) -> PrepResult<Table> {
    let _timing = logging::start_timing("aggregate_units", OperationCategory::Aggregation);

    if rules.grouping_cols.is_empty() {
        return Err(PrepError::InvalidConfiguration("no grouping columns given".to_string()));
    }

    let weights: Vec<f64> = if rules.mean_cols.is_empty() {
        Vec::new()
    } else {
        units.numbers(CAPACITY_COL)?
    };

    let mut groups: BTreeMap<Vec<Value>, Vec<usize>> = BTreeMap::new();
    for (position, row) in units.rows.iter().enumerate() {
        let key = rules
            .grouping_cols
            .iter()
            .map(|col| row.value(col).cloned())
            .collect::<PrepResult<Vec<Value>>>()?;
        groups.entry(key).or_default().push(position);
    }

    let mut aggregated = Table::new();
    for (index, (key, members)) in groups.iter().enumerate() {
        let mut row = Row::new(index.to_string());
        for (col, value) in rules.grouping_cols.iter().zip(key) {
            row.set(col, value.clone());
        }

        let first = &units.rows[members[0]];
        for col in &rules.passthrough_cols {
            row.set(col, first.value(col)?.clone());
        }

        for col in &rules.mean_cols {
            let total_weight: f64 = members.iter().map(|i| weights[*i]).sum();
            if total_weight == 0.0 {
                return Err(PrepError::ZeroCapacityGroup(describe_key(&rules.grouping_cols, key)));
            }
            let mut weighted = 0.0;
            for i in members {
                weighted += units.rows[*i].number(col)? * weights[*i];
            }
            row.set(col, weighted / total_weight);
        }

        for col in &rules.sum_cols {
            let mut total = 0.0;
            for i in members {
                total += units.rows[*i].number(col)?;
            }
            row.set(col, total);
        }

        aggregated.push(row);
    }

    debug!("Aggregated {} rows into {} groups", units.len(), aggregated.len());
    Ok(aggregated)
}

fn describe_key(cols: &[String], key: &[Value]) -> String {
    cols.iter()
        .zip(key)
        .map(|(c, v)| format!("{}={}", c, v))
        .collect::<Vec<_>>()
        .join(", ")
}
