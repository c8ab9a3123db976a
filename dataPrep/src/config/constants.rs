// Clustering
pub const DEFAULT_CLUSTER_SHARE: f64 = 0.1;
pub const DEFAULT_METRIC_COLUMN: &str = "efficiency_el";
pub const DEFAULT_RES_CLUSTER_NO: usize = 20;
pub const FIRST_CLUSTER_ID: i64 = 1;
pub const UNCLUSTERED_ID: i64 = 0;

// K-means
pub const KMEANS_MAX_ITER: usize = 300;
pub const KMEANS_TOLERANCE: f64 = 1e-4;
pub const KMEANS_DEFAULT_N_INIT: usize = 10;
pub const KMEANS_DEFAULT_SEED: u64 = 42;

// Capacity distribution
pub const DEFAULT_SHAPE_PARAM_B: f64 = 2.0;
pub const DEFAULT_NUM_SLICES: usize = 10;

// Cost projection
pub const PROJECTION_START_YEAR: u32 = 2020;
pub const PROJECTION_END_YEAR: u32 = 2030;

// Column names shared across tables
pub const LABEL_COL: &str = "label";
pub const CAPACITY_COL: &str = "capacity";
pub const CLUSTER_COL: &str = "cluster";
pub const MODE_COL: &str = "mode";
pub const TYPE_COL: &str = "type";
pub const ENERGY_SOURCE_COL: &str = "energy_source";
pub const VALUE_APPLIED_COL: &str = "value_applied";
pub const SUPPORT_SCHEME_COL: &str = "support_scheme";
pub const COMMISSIONING_YEAR_COL: &str = "commissioning_year";
pub const FIXED_COL: &str = "fixed";

// Market premium support scheme marker
pub const MARKET_PREMIUM: &str = "MP";

// Renewable transformer output
pub const COUNTRY_PREFIX: &str = "DE";
pub const RES_GRADIENT_LIMIT: f64 = 100_000.0;
pub const RES_MIN_LOAD_FACTOR: f64 = 0.0;
pub const OUTPUT_DECIMALS: i32 = 2;

// Unit attribute preparation
pub const EFFICIENCY_CUTOFF_YEAR: u32 = 1950;
pub const EFFICIENCY_FALLBACK_YEAR: u32 = 1990;
pub const EFFICIENCY_DECIMALS: i32 = 4;
pub const MINUTES_PER_HOUR: f64 = 60.0;
