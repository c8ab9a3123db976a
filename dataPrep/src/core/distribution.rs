//! Capacity distribution of future new-build over cost slices.
//!
//! The yearly (min, mean, max) cost triple is mapped onto the unit
//! interval and a beta distribution with fixed `b` is fitted so that its
//! mean hits the normalised mean: `a = mu * b / (1 - mu)`. The interval is
//! cut into equal bins; each bin receives the beta probability mass it
//! covers as capacity share and its midpoint, mapped back to [min, max],
//! as value.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};
use tracing::debug;
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTriple {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl CostTriple {
    pub fn new(min: f64, mean: f64, max: f64) -> Self {
        Self { min, mean, max }
    }

    /// Position of the mean on the unit interval spanned by min and max.
    pub fn normalized_mean(&self, year: u32) -> PrepResult<f64> {
        let degenerate = PrepError::DegenerateRange {
            year,
            min: self.min,
            mean: self.mean,
            max: self.max,
        };
        let span = self.max - self.min;
        if !(span > 0.0) || !span.is_finite() {
            return Err(degenerate);
        }
        let mu = (self.mean - self.min) / span;
        // mu on a bound leaves a or the normalisation without a finite value
        if !(mu > 0.0 && mu < 1.0) {
            return Err(degenerate);
        }
        Ok(mu)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacitySlice {
    pub share: f64,
    pub value: f64,
}

/// Fitted beta parameters and slices for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearDistribution {
    pub alpha: f64,
    pub beta: f64,
    pub slices: Vec<CapacitySlice>,
}

impl YearDistribution {
    /// Expectation of the fitted distribution mapped back onto [min, max].
    pub fn implied_mean(&self, triple: &CostTriple) -> f64 {
        triple.min + self.alpha / (self.alpha + self.beta) * (triple.max - triple.min)
    }

    pub fn total_share(&self) -> f64 {
        self.slices.iter().map(|s| s.share).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityDistribution {
    pub years: BTreeMap<u32, YearDistribution>,
}

impl CapacityDistribution {
    pub fn get(&self, year: u32) -> Option<&YearDistribution> {
        self.years.get(&year)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Solve for `a` so that Beta(a, b) has mean `mu`.
pub fn fit_alpha(mu: f64, b: f64) -> f64 {
    mu * b / (1.0 - mu)
}

pub fn distribute_year(year: u32, triple: &CostTriple, b: f64, num_slices: usize) -> PrepResult<YearDistribution> {
    validate_shape(b, num_slices)?;

    let mu = triple.normalized_mean(year)?;
    let a = fit_alpha(mu, b);
    let dist = Beta::new(a, b).map_err(|e| {
        PrepError::InvalidConfiguration(format!("beta({}, {}) for {}: {}", a, b, year, e))
    })?;

    let span = triple.max - triple.min;
    let width = 1.0 / num_slices as f64;
    let edges: Vec<f64> = (0..=num_slices).map(|i| i as f64 * width).collect();
    let cdf: Vec<f64> = edges
        .iter()
        .enumerate()
        .map(|(i, x)| match i {
            0 => 0.0,
            i if i == num_slices => 1.0,
            _ => dist.cdf(*x),
        })
        .collect();

    let slices = (0..num_slices)
        .map(|i| CapacitySlice {
            share: cdf[i + 1] - cdf[i],
            value: (edges[i] + width / 2.0) * span + triple.min,
        })
        .collect();

    Ok(YearDistribution { alpha: a, beta: b, slices })
}

/// Builds the per-year capacity slices for every year of `costs`.
pub fn build_distribution(costs: &BTreeMap<u32, CostTriple>, b: f64, num_slices: usize) -> PrepResult<CapacityDistribution> {
    let _timing = logging::start_timing("build_distribution", OperationCategory::Distribution);

    let mut years = BTreeMap::new();
    for (year, triple) in costs {
        let fitted = distribute_year(*year, triple, b, num_slices)?;
        debug!(year, alpha = fitted.alpha, beta = fitted.beta, "fitted capacity distribution");
        years.insert(*year, fitted);
    }
    Ok(CapacityDistribution { years })
}

fn validate_shape(b: f64, num_slices: usize) -> PrepResult<()> {
    if !(b > 0.0 && b.is_finite()) {
        return Err(PrepError::InvalidConfiguration(format!("beta parameter b must be positive, got {}", b)));
    }
    if num_slices == 0 {
        return Err(PrepError::InvalidConfiguration("number of capacity slices must be positive".to_string()));
    }
    Ok(())
}
