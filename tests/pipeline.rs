use std::collections::BTreeSet;

use unitprep::config::energy_source::{CapacityColumn, EnergySource, GroupingMode, MODEL_COST_UNIT};
use unitprep::config::prep_config::ProjectionConfig;
use unitprep::core::aggregation::{aggregate_units, AggregationRules};
use unitprep::core::clustering::cluster_units;
use unitprep::core::cost_projection::{project_lcoe, CostEstimate};
use unitprep::core::distribution::build_distribution;
use unitprep::core::new_build::synthesize_new_build;
use unitprep::core::res_transformers::build_res_transformers;
use unitprep::data::table_loader::parse_table;
use unitprep::{KMeans1D, PrepError, Row, Table};

fn hardcoal_fleet() -> Table {
    let efficiencies = [0.30, 0.30, 0.30, 0.40, 0.40, 0.40, 0.40, 0.50, 0.50, 0.50];
    Table::from_rows(
        efficiencies
            .iter()
            .enumerate()
            .map(|(i, eff)| {
                Row::new(format!("hc_{}", i))
                    .with("from", "DE_bus_hardcoal")
                    .with("type", "ipp")
                    .with("capacity", 100.0 + 10.0 * i as f64)
                    .with("efficiency_el", *eff)
            })
            .collect(),
    )
}

#[test]
fn existing_fleet_is_clustered_and_aggregated() {
    let mut units = hardcoal_fleet();
    let mut strategy = KMeans1D::new(42, 10);
    let summaries = cluster_units(&mut units, "efficiency_el", GroupingMode::Fuel, 0.5, &mut strategy).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].clusters, 3);

    let ids: BTreeSet<i64> = units
        .rows
        .iter()
        .map(|r| r.number("cluster").unwrap() as i64)
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&0));

    let rules = AggregationRules::new(&["cluster"])
        .mean(&["efficiency_el"])
        .sum(&["capacity"])
        .passthrough(&["from", "mode"]);
    let aggregated = aggregate_units(&units, &rules).unwrap();
    assert_eq!(aggregated.len(), 3);

    let total: f64 = aggregated.numbers("capacity").unwrap().iter().sum();
    assert!((total - 1450.0).abs() < 1e-9);

    let mut means = aggregated.numbers("efficiency_el").unwrap();
    means.sort_by(f64::total_cmp);
    for (mean, expected) in means.iter().zip([0.30, 0.40, 0.50]) {
        assert!((mean - expected).abs() < 1e-9);
    }
    assert!(aggregated.rows.iter().all(|r| r.number("mode").unwrap() == 1.0));
}

const COSTS: &str = "\
year,technology,capex_low,capex_middle,capex_high,opex_fix,opex_var,flh_low,flh_middle,flh_high,wacc_real,lifetime
2025,onshore,1200,1400,1700,25,0,1800,2200,2600,5,25
2027,onshore,1100,1300,1600,24,0,1850,2250,2650,5,25
";

#[test]
fn projected_costs_become_new_build_units() {
    let estimates = CostEstimate::from_table(&parse_table(COSTS, None).unwrap()).unwrap();
    let config = ProjectionConfig {
        start_year: 2025,
        end_year: 2027,
        ..ProjectionConfig::default()
    };
    let series = project_lcoe(&estimates, &config).unwrap();
    assert_eq!(series.years.len(), 3);
    assert_eq!(series.unit, MODEL_COST_UNIT);

    let triples = series.to_cost_triples();
    let distribution = build_distribution(&triples, 2.0, 10).unwrap();

    let targets = Table::from_rows(vec![
        Row::new("2025").with("capacity", 1500.0),
        Row::new("2026").with("capacity", 1700.0),
        Row::new("2027").with("capacity", 2000.0),
    ]);
    let mut new_built = Table::new();
    let added = synthesize_new_build(
        &distribution,
        &mut new_built,
        &targets,
        EnergySource::WindOnshore,
        CapacityColumn::Capacity,
        true,
    )
    .unwrap();
    assert_eq!(added, 30);

    for (year, target) in [(2025u32, 1500.0), (2026, 1700.0), (2027, 2000.0)] {
        let rows: Vec<&Row> = new_built
            .rows
            .iter()
            .filter(|r| r.number("commissioning_year").unwrap() as u32 == year)
            .collect();
        assert_eq!(rows.len(), 10);
        let sum: f64 = rows.iter().map(|r| r.number("capacity").unwrap()).sum();
        assert!((sum - target).abs() < 1e-6, "{}: {} != {}", year, sum, target);

        let triple = triples[&year];
        for row in rows {
            let value = row.number("value_applied").unwrap();
            assert!(value > triple.min && value < triple.max);
            assert_eq!(row.text("support_scheme").unwrap(), "MP");
            assert_eq!(row.number("fixed").unwrap(), 0.0);
        }
    }
    assert!(new_built.find("windonshore_new_1_2026").is_some());

    // a second run for the same source would reuse every label
    let again = synthesize_new_build(
        &distribution,
        &mut new_built,
        &targets,
        EnergySource::WindOnshore,
        CapacityColumn::Capacity,
        true,
    );
    assert!(matches!(again, Err(PrepError::DuplicateLabel(_))));
    assert_eq!(new_built.len(), 30);
}

#[test]
fn new_build_and_existing_fleet_share_value_unit() {
    let estimates = CostEstimate::from_table(&parse_table(COSTS, None).unwrap()).unwrap();
    let config = ProjectionConfig {
        start_year: 2025,
        end_year: 2027,
        ..ProjectionConfig::default()
    };
    let series = project_lcoe(&estimates, &config).unwrap();
    let distribution = build_distribution(&series.to_cost_triples(), 2.0, 10).unwrap();
    let targets = Table::from_rows(vec![Row::new("windonshore").with("capacity", 1000.0)]);
    let mut new_built = Table::new();
    synthesize_new_build(
        &distribution,
        &mut new_built,
        &targets,
        EnergySource::WindOnshore,
        CapacityColumn::Capacity,
        false,
    )
    .unwrap();

    let plants = Table::from_rows(vec![Row::new("w1")
        .with("energy_source", "Wind_Onshore")
        .with("capacity", 3000.0)
        .with("support_scheme", "MP")
        .with("value_applied", 6.2)]);
    let existing = build_res_transformers(&plants, 5, &mut KMeans1D::default()).unwrap();
    let awarded = existing.find("DE_windonshore_cluster_1").unwrap().number("value_applied").unwrap();
    assert_eq!(awarded, 62.0);

    // onshore wind costs a few ct/kWh, i.e. tens of EUR/MWh in both tables
    for row in &new_built.rows {
        let value = row.number("value_applied").unwrap();
        assert!(value > 20.0 && value < 150.0, "{} = {}", row.label, value);
    }
}
