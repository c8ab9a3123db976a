// Module declarations for the unit data preparation

// Clustering, aggregation, distribution and cost projection
pub mod core {
    pub mod kmeans;
    pub mod clustering;
    pub mod aggregation;
    pub mod distribution;
    pub mod new_build;
    pub mod annuity;
    pub mod cost_projection;
    pub mod unit_attributes;
    pub mod res_transformers;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod energy_source;
    pub mod prep_config;
}

// Model definitions
pub mod models {
    pub mod table;
}

// Data loaders
pub mod data {
    pub mod table_loader;
}

// Utility functions
pub mod utils {
    pub mod error;
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::config::prep_config::PrepConfig;
pub use crate::core::kmeans::{ClusteringStrategy, KMeans1D};
pub use crate::models::table::{Row, Table, Value};
pub use crate::utils::error::{PrepError, PrepResult};
