use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::config::constants::*;
use crate::config::energy_source::{CapacityColumn, EnergyCostUnit, GroupingMode, MODEL_COST_UNIT};
use crate::utils::error::{PrepError, PrepResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub start_year: u32,
    pub end_year: u32,
    pub output_unit: EnergyCostUnit, // Unit of the projected LCOE and of new-build values
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            start_year: PROJECTION_START_YEAR,
            end_year: PROJECTION_END_YEAR,
            output_unit: MODEL_COST_UNIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub grouping: GroupingMode,
    pub metric_column: String,
    pub cluster_share: f64,        // Share of clusters on units per group (0.0-1.0]
    pub shape_param_b: f64,        // Exogenous beta parameter b
    pub num_slices: usize,         // Capacity slices per year
    pub indexed_by_year: bool,     // Expansion targets keyed by year rather than by source
    pub capacity_column: CapacityColumn,
    pub res_cluster_no: usize,     // Clusters per renewable source
    pub kmeans_seed: u64,
    pub kmeans_n_init: usize,
    pub projection: ProjectionConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            grouping: GroupingMode::Fuel,
            metric_column: DEFAULT_METRIC_COLUMN.to_string(),
            cluster_share: DEFAULT_CLUSTER_SHARE,
            shape_param_b: DEFAULT_SHAPE_PARAM_B,
            num_slices: DEFAULT_NUM_SLICES,
            indexed_by_year: false,
            capacity_column: CapacityColumn::Capacity,
            res_cluster_no: DEFAULT_RES_CLUSTER_NO,
            kmeans_seed: KMEANS_DEFAULT_SEED,
            kmeans_n_init: KMEANS_DEFAULT_N_INIT,
            projection: ProjectionConfig::default(),
        }
    }
}

impl PrepConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> PrepResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> PrepResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(contents)?;
        // Option keys go through FromStr so unsupported names are configuration errors
        if let Some(grouping) = raw.get("grouping").and_then(serde_json::Value::as_str) {
            grouping.parse::<GroupingMode>()?;
        }
        if let Some(column) = raw.get("capacity_column").and_then(serde_json::Value::as_str) {
            column.parse::<CapacityColumn>()?;
        }

        let config: PrepConfig = serde_json::from_value(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PrepResult<()> {
        if !(self.cluster_share > 0.0 && self.cluster_share <= 1.0) {
            return Err(PrepError::InvalidConfiguration(format!(
                "cluster_share must lie in (0, 1], got {}",
                self.cluster_share
            )));
        }
        if !(self.shape_param_b > 0.0 && self.shape_param_b.is_finite()) {
            return Err(PrepError::InvalidConfiguration(format!(
                "shape_param_b must be positive, got {}",
                self.shape_param_b
            )));
        }
        if self.num_slices == 0 {
            return Err(PrepError::InvalidConfiguration("num_slices must be positive".to_string()));
        }
        if self.res_cluster_no == 0 {
            return Err(PrepError::InvalidConfiguration("res_cluster_no must be positive".to_string()));
        }
        if self.kmeans_n_init == 0 {
            return Err(PrepError::InvalidConfiguration("kmeans_n_init must be positive".to_string()));
        }
        if self.projection.start_year > self.projection.end_year {
            return Err(PrepError::InvalidConfiguration(format!(
                "projection start year {} lies after end year {}",
                self.projection.start_year, self.projection.end_year
            )));
        }
        Ok(())
    }
}
