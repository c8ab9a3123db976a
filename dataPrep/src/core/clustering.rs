use std::collections::BTreeSet;
use tracing::{debug, info};
use crate::config::constants::{CLUSTER_COL, FIRST_CLUSTER_ID, MODE_COL, TYPE_COL, UNCLUSTERED_ID};
use crate::config::energy_source::{GroupingMode, OperatingMode};
use crate::core::kmeans::ClusteringStrategy;
use crate::models::table::{Table, Value};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

/// Hands out contiguous, never reused blocks of cluster ids.
#[derive(Debug, Clone)]
pub struct ClusterIdAllocator {
    next: i64,
}

impl Default for ClusterIdAllocator {
    fn default() -> Self {
        Self { next: FIRST_CLUSTER_ID }
    }
}

impl ClusterIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `n` ids and return the first one.
    pub fn allocate(&mut self, n: usize) -> i64 {
        let start = self.next;
        self.next += n as i64;
        start
    }

    pub fn next_free(&self) -> i64 {
        self.next
    }
}

/// Summary of one (group, mode) partition after clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: Value,
    pub mode: OperatingMode,
    pub units: usize,
    pub requested: usize,
    pub clusters: usize,
    pub first_id: i64,
}

/// Target cluster count: `ceil(share * size)` capped by the distinct metric values.
pub fn target_cluster_count(group_size: usize, distinct_values: usize, share: f64) -> usize {
    let requested = (share * group_size as f64).ceil() as usize;
    requested.min(distinct_values)
}

/// Number of distinct values; adding `0.0` folds `-0.0` into `0.0`.
pub fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|v| (v + 0.0).to_bits())
        .collect::<BTreeSet<u64>>()
        .len()
}

/// Buckets units into clusters of similar `metric_column` within each
/// (grouping attribute, operating mode) group.
///
/// Adds a `mode` column (0 other, 1 ipp, 2 chp) and a `cluster` column to
/// every row. Ids are unique across the whole table; 0 never appears for
/// a clustered unit.
pub fn cluster_units<S: ClusteringStrategy>(
    units: &mut Table,
    metric_column: &str,
    grouping: GroupingMode,
    share: f64,
    strategy: &mut S,
) -> PrepResult<Vec<GroupSummary>> {
    let _timing = logging::start_timing("cluster_units", OperationCategory::Clustering);

    if !(share > 0.0 && share <= 1.0) {
        return Err(PrepError::InvalidConfiguration(format!(
            "cluster share must lie in (0, 1], got {}",
            share
        )));
    }
    let group_col = grouping.column();

    let mut group_values: Vec<Value> = Vec::new();
    let mut modes: Vec<OperatingMode> = Vec::new();
    let mut keys = Vec::with_capacity(units.len());
    for row in units.rows.iter_mut() {
        let mode = OperatingMode::from_type(row.get(TYPE_COL).and_then(Value::as_str).unwrap_or(""));
        row.set(MODE_COL, mode.code());
        row.set(CLUSTER_COL, UNCLUSTERED_ID);

        let group = row.value(group_col)?.clone();
        if !group_values.contains(&group) {
            group_values.push(group.clone());
        }
        if !modes.contains(&mode) {
            modes.push(mode);
        }
        keys.push((group, mode));
    }

    let mut allocator = ClusterIdAllocator::new();
    let mut summaries = Vec::new();

    for group in &group_values {
        for mode in &modes {
            let members: Vec<usize> = keys
                .iter()
                .enumerate()
                .filter(|(_, (g, m))| g == group && m == mode)
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                debug!(%group, ?mode, "no units in group, skipping");
                continue;
            }

            let values = members
                .iter()
                .map(|i| units.rows[*i].number(metric_column))
                .collect::<PrepResult<Vec<f64>>>()?;
            let requested = (share * members.len() as f64).ceil() as usize;
            let n = target_cluster_count(members.len(), distinct_count(&values), share);

            let labels = strategy.cluster(&values, n)?;
            let used = labels.iter().copied().max().map_or(0, |m| m + 1);
            let first_id = allocator.allocate(used);
            for (i, label) in members.iter().zip(&labels) {
                units.rows[*i].set(CLUSTER_COL, first_id + *label as i64);
            }

            debug!(%group, ?mode, units = members.len(), requested, clusters = used, first_id, "clustered group");
            summaries.push(GroupSummary {
                group: group.clone(),
                mode: *mode,
                units: members.len(),
                requested,
                clusters: used,
                first_id,
            });
        }
    }

    info!(
        "Clustered {} units into {} clusters across {} groups",
        units.len(),
        allocator.next_free() - FIRST_CLUSTER_ID,
        summaries.len()
    );
    Ok(summaries)
}

/// Same as [`cluster_units`] but takes the grouping option as text.
pub fn cluster_units_by<S: ClusteringStrategy>(
    units: &mut Table,
    metric_column: &str,
    grouping: &str,
    share: f64,
    strategy: &mut S,
) -> PrepResult<Vec<GroupSummary>> {
    let grouping: GroupingMode = grouping.parse()?;
    cluster_units(units, metric_column, grouping, share, strategy)
}
