use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use unitprep::cli::cli::{Args, Command};
use unitprep::config::constants::{CAPACITY_COL, CLUSTER_COL, LABEL_COL, MODE_COL};
use unitprep::config::energy_source::EnergySource;
use unitprep::config::prep_config::PrepConfig;
use unitprep::core::aggregation::{aggregate_units, AggregationRules};
use unitprep::core::clustering::cluster_units;
use unitprep::core::cost_projection::{project_lcoe, CostEstimate};
use unitprep::core::distribution::build_distribution;
use unitprep::core::kmeans::KMeans1D;
use unitprep::core::new_build::synthesize_new_build;
use unitprep::core::res_transformers::build_res_transformers;
use unitprep::data::table_loader::load_table;
use unitprep::models::table::Table;
use unitprep::utils::csv_export::CsvExporter;
use unitprep::utils::logging::{self, FileIOType, OperationCategory};

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing()).context("failed to install tracing subscriber")?;

    let config = load_config(args.config())?;
    let exporter = CsvExporter::new(args.out(), args.timestamped())
        .with_context(|| format!("cannot create output directory {}", args.out()))?;
    let mut strategy = KMeans1D::new(args.seed().unwrap_or(config.kmeans_seed), config.kmeans_n_init);

    match args.command() {
        Command::Cluster { units } => {
            let mut table = load_units(units)?;
            let summaries = cluster_units(
                &mut table,
                &config.metric_column,
                config.grouping,
                config.cluster_share,
                &mut strategy,
            )?;
            let rules = AggregationRules::new(&[CLUSTER_COL])
                .mean(&[config.metric_column.as_str()])
                .sum(&[CAPACITY_COL])
                .passthrough(&[config.grouping.column(), MODE_COL]);
            let aggregated = aggregate_units(&table, &rules).context("aggregating clusters failed")?;
            info!("{} groups reduced to {} representative units", summaries.len(), aggregated.len());

            exporter.export_table("units_clustered.csv", &table)?;
            exporter.export_table("units_aggregated.csv", &aggregated)?;
        }
        Command::ResTransformers { units } => {
            let plants = load_units(units)?;
            let transformers = build_res_transformers(&plants, config.res_cluster_no, &mut strategy)?;
            exporter.export_table("res_transformers.csv", &transformers)?;
        }
        Command::Lcoe { costs } => {
            let estimates = load_costs(costs)?;
            let series = project_lcoe(&estimates, &config.projection)?;
            exporter.export_table("lcoe.csv", &series.to_table())?;
        }
        Command::NewBuild { costs, targets, source, existing } => {
            let source: EnergySource = source.parse()?;
            let estimates = load_costs(costs)?;
            let series = project_lcoe(&estimates, &config.projection)?;
            let distribution = build_distribution(&series.to_cost_triples(), config.shape_param_b, config.num_slices)?;

            let targets = load_table(targets, Some(LABEL_COL))
                .with_context(|| format!("cannot read expansion targets from {}", targets))?;
            let mut new_built = match existing {
                Some(path) => load_table(path, Some(LABEL_COL))
                    .with_context(|| format!("cannot read existing new-build units from {}", path))?,
                None => Table::new(),
            };

            let added = synthesize_new_build(
                &distribution,
                &mut new_built,
                &targets,
                source,
                config.capacity_column,
                config.indexed_by_year,
            )?;
            info!("Added {} {} new-build units", added, source);
            exporter.export_table("new_built.csv", &new_built)?;
        }
    }

    logging::print_timing_report();
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<PrepConfig> {
    let _timing = logging::start_timing("load_config", OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

    match path {
        Some(path) => PrepConfig::from_json_file(path).with_context(|| format!("invalid config file {}", path)),
        None => {
            info!("No config given, using defaults");
            Ok(PrepConfig::default())
        }
    }
}

fn load_units(path: &str) -> Result<Table> {
    load_table(path, Some(LABEL_COL)).with_context(|| format!("cannot read units from {}", path))
}

fn load_costs(path: &str) -> Result<Vec<CostEstimate>> {
    let table = load_table(path, None).with_context(|| format!("cannot read cost estimates from {}", path))?;
    Ok(CostEstimate::from_table(&table)?)
}
