use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::config::energy_source::EnergyCostUnit;
use crate::config::prep_config::ProjectionConfig;
use crate::core::annuity::{lcoe_fix_var, LcoeInputs};
use crate::core::distribution::CostTriple;
use crate::models::table::{Row, Table};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

/// Cost assumptions of one technology for one year.
///
/// Monetary inputs are per kW of capacity, so the resulting LCOE is in EUR/kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub year: u32,
    pub technology: String,
    pub capex_low: f64,
    pub capex_middle: f64,
    pub capex_high: f64,
    pub opex_fix: f64,
    pub opex_var: f64,
    pub flh_low: f64,
    pub flh_middle: f64,
    pub flh_high: f64,
    pub wacc_real: f64, // percent
    pub lifetime: u32,
}

impl CostEstimate {
    pub fn from_row(row: &Row) -> PrepResult<Self> {
        Ok(Self {
            year: row.unsigned("year")?,
            technology: row.text("technology")?,
            capex_low: row.number("capex_low")?,
            capex_middle: row.number("capex_middle")?,
            capex_high: row.number("capex_high")?,
            opex_fix: row.number("opex_fix")?,
            opex_var: row.number("opex_var")?,
            flh_low: row.number("flh_low")?,
            flh_middle: row.number("flh_middle")?,
            flh_high: row.number("flh_high")?,
            wacc_real: row.number("wacc_real")?,
            lifetime: row.unsigned("lifetime")?,
        })
    }

    pub fn from_table(table: &Table) -> PrepResult<Vec<Self>> {
        table.rows.iter().map(Self::from_row).collect()
    }

    fn inputs(&self, capex: f64, flh: f64) -> LcoeInputs {
        LcoeInputs::new(capex, self.opex_fix, self.opex_var, flh, self.wacc_real / 100.0, self.lifetime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LcoeEstimate {
    pub low: f64,
    pub middle: f64,
    pub high: f64,
}

impl LcoeEstimate {
    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            low: f(self.low),
            middle: f(self.middle),
            high: f(self.high),
        }
    }
}

/// Low/middle/high LCOE per year in `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcoeSeries {
    pub unit: EnergyCostUnit,
    pub years: BTreeMap<u32, LcoeEstimate>,
}

impl LcoeSeries {
    pub fn to_cost_triples(&self) -> BTreeMap<u32, CostTriple> {
        self.years
            .iter()
            .map(|(year, e)| (*year, CostTriple::new(e.low, e.middle, e.high)))
            .collect()
    }

    pub fn to_table(&self) -> Table {
        let rows = self
            .years
            .iter()
            .map(|(year, e)| {
                Row::new(year.to_string())
                    .with("LCOE_low", e.low)
                    .with("LCOE_middle", e.middle)
                    .with("LCOE_high", e.high)
            })
            .collect();
        Table::from_rows(rows)
    }
}

/// Optimistic (cheap capex, many hours), central and pessimistic LCOE in EUR/kWh.
pub fn estimate_lcoe(estimate: &CostEstimate) -> PrepResult<LcoeEstimate> {
    Ok(LcoeEstimate {
        low: lcoe_fix_var(&estimate.inputs(estimate.capex_low, estimate.flh_high))?,
        middle: lcoe_fix_var(&estimate.inputs(estimate.capex_middle, estimate.flh_middle))?,
        high: lcoe_fix_var(&estimate.inputs(estimate.capex_high, estimate.flh_low))?,
    })
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Cross-technology envelope: lowest low, median middle, highest high.
pub fn combine_technologies(estimates: &[LcoeEstimate]) -> Option<LcoeEstimate> {
    if estimates.is_empty() {
        return None;
    }
    let mut middles: Vec<f64> = estimates.iter().map(|e| e.middle).collect();
    Some(LcoeEstimate {
        low: estimates.iter().map(|e| e.low).fold(f64::INFINITY, f64::min),
        middle: median(&mut middles),
        high: estimates.iter().map(|e| e.high).fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Reassigns each component so that costs never rise over time: the highest
/// value goes to the earliest year, the lowest to the latest.
pub fn enforce_decline(years: &mut BTreeMap<u32, LcoeEstimate>) {
    let lows = sorted_desc(years, |e| e.low);
    let middles = sorted_desc(years, |e| e.middle);
    let highs = sorted_desc(years, |e| e.high);

    for (i, estimate) in years.values_mut().enumerate() {
        *estimate = LcoeEstimate { low: lows[i], middle: middles[i], high: highs[i] };
    }
}

fn sorted_desc(years: &BTreeMap<u32, LcoeEstimate>, pick: impl Fn(&LcoeEstimate) -> f64) -> Vec<f64> {
    let mut values: Vec<f64> = years.values().map(pick).collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

/// Fills every year between the first and last known year linearly.
pub fn interpolate_years(known: &BTreeMap<u32, LcoeEstimate>) -> BTreeMap<u32, LcoeEstimate> {
    let mut filled = BTreeMap::new();
    let anchors: Vec<(&u32, &LcoeEstimate)> = known.iter().collect();
    for pair in anchors.windows(2) {
        let (y0, e0) = pair[0];
        let (y1, e1) = pair[1];
        let span = (*y1 - *y0) as f64;
        for year in *y0..*y1 {
            let t = (year - *y0) as f64 / span;
            filled.insert(year, LcoeEstimate {
                low: e0.low + t * (e1.low - e0.low),
                middle: e0.middle + t * (e1.middle - e0.middle),
                high: e0.high + t * (e1.high - e0.high),
            });
        }
    }
    if let Some((year, estimate)) = anchors.last() {
        filled.insert(**year, **estimate);
    }
    filled
}

/// Projects yearly low/middle/high LCOE from technology cost estimates.
///
/// Estimates outside the configured years are ignored. Both the first and
/// the last configured year need at least one estimate.
pub fn project_lcoe(estimates: &[CostEstimate], config: &ProjectionConfig) -> PrepResult<LcoeSeries> {
    let _timing = logging::start_timing("project_lcoe", OperationCategory::CostProjection);

    let mut by_year: BTreeMap<u32, Vec<LcoeEstimate>> = BTreeMap::new();
    for estimate in estimates {
        if estimate.year < config.start_year || estimate.year > config.end_year {
            continue;
        }
        by_year.entry(estimate.year).or_default().push(estimate_lcoe(estimate)?);
    }

    for year in [config.start_year, config.end_year] {
        if !by_year.contains_key(&year) {
            return Err(PrepError::LookupFailure(format!("cost estimate for year {}", year)));
        }
    }

    let mut known: BTreeMap<u32, LcoeEstimate> = BTreeMap::new();
    for (year, per_tech) in &by_year {
        if let Some(combined) = combine_technologies(per_tech) {
            debug!(year, technologies = per_tech.len(), "combined technology estimates");
            known.insert(*year, combined);
        }
    }

    let before = known.clone();
    enforce_decline(&mut known);
    if before != known {
        warn!("LCOE estimates were not declining over time and have been reordered");
    }

    let factor = EnergyCostUnit::EurPerKwh.factor_to(config.output_unit);
    let years = interpolate_years(&known)
        .into_iter()
        .map(|(year, e)| (year, e.map(|x| x * factor)))
        .collect::<BTreeMap<_, _>>();

    info!(
        "Projected LCOE for {} years ({} with estimates) in {:?}",
        years.len(),
        known.len(),
        config.output_unit
    );
    Ok(LcoeSeries { unit: config.output_unit, years })
}
