//! One-dimensional k-means used to bucket units by a single metric.
//!
//! Seeding follows k-means++; Lloyd iterations run until the centroids
//! move less than the tolerance. Labels are renumbered by ascending
//! centroid, so the same seed always yields the same labelling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use crate::config::constants::{KMEANS_DEFAULT_N_INIT, KMEANS_DEFAULT_SEED, KMEANS_MAX_ITER, KMEANS_TOLERANCE};
use crate::utils::error::{PrepError, PrepResult};

/// Assigns each value a 0-based cluster label in `0..k`.
pub trait ClusteringStrategy {
    fn cluster(&mut self, values: &[f64], k: usize) -> PrepResult<Vec<usize>>;
}

pub struct KMeans1D {
    rng: StdRng,
    n_init: usize,
    max_iter: usize,
    tolerance: f64,
}

struct Fit {
    labels: Vec<usize>,
    centroids: Vec<f64>,
    inertia: f64,
}

impl Default for KMeans1D {
    fn default() -> Self {
        Self::new(KMEANS_DEFAULT_SEED, KMEANS_DEFAULT_N_INIT)
    }
}

impl KMeans1D {
    pub fn new(seed: u64, n_init: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            n_init: n_init.max(1),
            max_iter: KMEANS_MAX_ITER,
            tolerance: KMEANS_TOLERANCE,
        }
    }

    fn seed_centroids(&mut self, values: &[f64], k: usize) -> Vec<f64> {
        let mut centroids = Vec::with_capacity(k);
        centroids.push(values[self.rng.gen_range(0..values.len())]);

        while centroids.len() < k {
            let distances: Vec<f64> = values
                .iter()
                .map(|v| {
                    centroids
                        .iter()
                        .map(|c| (v - c) * (v - c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = distances.iter().sum();

            // All remaining points coincide with a centroid
            if total <= 0.0 {
                break;
            }

            let mut target = self.rng.gen::<f64>() * total;
            let mut chosen = values.len() - 1;
            for (i, d) in distances.iter().enumerate() {
                if *d > 0.0 && target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            if distances[chosen] <= 0.0 {
                // Rounding pushed us past the last candidate; take the farthest point
                chosen = argmax(&distances);
            }
            centroids.push(values[chosen]);
        }
        centroids
    }

    fn lloyd(&self, values: &[f64], mut centroids: Vec<f64>) -> Fit {
        let k = centroids.len();
        let mut labels = vec![0usize; values.len()];

        for _ in 0..self.max_iter {
            for (label, v) in labels.iter_mut().zip(values) {
                *label = nearest(&centroids, *v);
            }

            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (label, v) in labels.iter().zip(values) {
                sums[*label] += v;
                counts[*label] += 1;
            }

            let mut shift: f64 = 0.0;
            for j in 0..k {
                let updated = if counts[j] > 0 {
                    sums[j] / counts[j] as f64
                } else {
                    relocate_empty(values, &labels, &centroids, &counts)
                };
                shift = shift.max((updated - centroids[j]).abs());
                centroids[j] = updated;
            }

            if shift <= self.tolerance {
                break;
            }
        }

        for (label, v) in labels.iter_mut().zip(values) {
            *label = nearest(&centroids, *v);
        }
        let inertia = labels
            .iter()
            .zip(values)
            .map(|(l, v)| (v - centroids[*l]).powi(2))
            .sum();

        Fit { labels, centroids, inertia }
    }
}

impl ClusteringStrategy for KMeans1D {
    fn cluster(&mut self, values: &[f64], k: usize) -> PrepResult<Vec<usize>> {
        if k == 0 || k > values.len() {
            return Err(PrepError::InvalidConfiguration(format!(
                "cannot form {} clusters from {} values",
                k,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PrepError::InvalidConfiguration(
                "clustering metric contains non-finite values".to_string(),
            ));
        }

        let mut best: Option<Fit> = None;
        for _ in 0..self.n_init {
            let seeds = self.seed_centroids(values, k);
            let fit = self.lloyd(values, seeds);
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        let fit = match best {
            Some(fit) => fit,
            None => return Err(PrepError::InvalidConfiguration("k-means produced no fit".to_string())),
        };
        debug!(k, inertia = fit.inertia, "k-means fit complete");
        Ok(relabel_by_centroid(&fit.labels, &fit.centroids))
    }
}

fn nearest(centroids: &[f64], v: f64) -> usize {
    let mut best = 0;
    for (j, c) in centroids.iter().enumerate() {
        if (v - c).abs() < (v - centroids[best]).abs() {
            best = j;
        }
    }
    best
}

fn argmax(xs: &[f64]) -> usize {
    let mut best = 0;
    for (i, x) in xs.iter().enumerate() {
        if *x > xs[best] {
            best = i;
        }
    }
    best
}

// An empty cluster takes over the point farthest from its centroid among
// clusters that can spare one.
fn relocate_empty(values: &[f64], labels: &[usize], centroids: &[f64], counts: &[usize]) -> f64 {
    let distances: Vec<f64> = labels
        .iter()
        .zip(values)
        .map(|(l, v)| if counts[*l] > 1 { (v - centroids[*l]).abs() } else { -1.0 })
        .collect();
    values[argmax(&distances)]
}

/// Renumbers labels so that label 0 has the smallest centroid and used labels are contiguous.
fn relabel_by_centroid(labels: &[usize], centroids: &[f64]) -> Vec<usize> {
    let mut used: Vec<usize> = labels.to_vec();
    used.sort_unstable();
    used.dedup();
    used.sort_by(|a, b| centroids[*a].total_cmp(&centroids[*b]));

    let mut mapping = vec![0usize; centroids.len()];
    for (new, old) in used.iter().enumerate() {
        mapping[*old] = new;
    }
    labels.iter().map(|l| mapping[*l]).collect()
}
