//! Seeded k-means partitioning.
//!
//! Lloyd iterations from a k-means++ initialisation. All randomness comes from
//! a `ChaCha8Rng` seeded from [`KMeansConfig::seed`], so identical input always
//! yields identical labels.
//!
//! Coordinates are treated as planar (lat, lng) pairs with squared Euclidean
//! distance. Over the extent of a city this is close enough to great-circle
//! distance for grouping purposes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::PlannerError;
use crate::geo_point::Coordinates;
use crate::traits::Partitioner;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Seed for centroid initialisation.
    pub seed: u64,
    /// Iteration cap per run.
    pub max_iter: usize,
    /// Number of independently initialised runs; the lowest inertia wins.
    pub n_init: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_iter: 300,
            n_init: 1,
        }
    }
}

impl KMeansConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }
}

/// K-means partitioner.
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

/// Result of a single run.
#[derive(Debug, Clone)]
struct Fit {
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

type Point = [f64; 2];

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    fn fit_once(&self, points: &[Point], k: usize, rng: &mut ChaCha8Rng) -> Fit {
        let mut centroids = init_centroids(points, k, rng);
        let mut labels = vec![usize::MAX; points.len()];
        let mut iterations = 0;

        while iterations < self.config.max_iter.max(1) {
            iterations += 1;

            let changed = assign(points, &centroids, &mut labels);
            let relocated = relocate_empty(points, &mut centroids, &labels);
            if !changed && !relocated {
                break;
            }

            update(points, &mut centroids, &labels);
        }

        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(point, &label)| squared_distance(point, &centroids[label]))
            .sum();

        Fit {
            labels,
            inertia,
            iterations,
        }
    }
}

impl Partitioner for KMeans {
    fn labels(&self, coordinates: &[Coordinates], k: usize) -> Result<Vec<usize>, PlannerError> {
        if k == 0 {
            return Err(PlannerError::ClusteringFailed(
                "cluster count must be at least 1".to_string(),
            ));
        }
        if coordinates.is_empty() {
            return Err(PlannerError::ClusteringFailed("no coordinates to cluster".to_string()));
        }
        if let Some(index) = coordinates.iter().position(|c| !c.is_finite()) {
            return Err(PlannerError::ClusteringFailed(format!(
                "coordinate {index} is not finite"
            )));
        }

        let points: Vec<Point> = coordinates.iter().map(|c| [c.lat, c.lng]).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut best: Option<Fit> = None;
        for _ in 0..self.config.n_init.max(1) {
            let fit = self.fit_once(&points, k, &mut rng);
            if !fit.inertia.is_finite() {
                return Err(PlannerError::ClusteringFailed(
                    "numeric overflow while computing centroids".to_string(),
                ));
            }
            if best.as_ref().is_none_or(|current| fit.inertia < current.inertia) {
                best = Some(fit);
            }
        }

        let best = best.ok_or_else(|| PlannerError::ClusteringFailed("no run completed".to_string()))?;
        debug!(
            k,
            points = points.len(),
            iterations = best.iterations,
            inertia = best.inertia,
            "k-means converged"
        );

        Ok(best.labels)
    }
}

fn squared_distance(a: &Point, b: &Point) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// k-means++ seeding: the first centroid uniformly, the rest proportional to
/// squared distance from the nearest centroid chosen so far.
fn init_centroids(points: &[Point], k: usize, rng: &mut ChaCha8Rng) -> Vec<Point> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    while centroids.len() < k {
        let distances: Vec<f64> = points
            .iter()
            .map(|point| {
                centroids
                    .iter()
                    .map(|centroid| squared_distance(point, centroid))
                    .fold(f64::MAX, f64::min)
            })
            .collect();

        let total: f64 = distances.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            // Every point already coincides with a centroid.
            centroids.push(points[rng.gen_range(0..n)]);
            continue;
        }

        let threshold = rng.gen_range(0.0..total);
        let mut selected = distances.iter().rposition(|&d| d > 0.0).unwrap_or(0);
        let mut cumsum = 0.0;
        for (index, &d) in distances.iter().enumerate() {
            cumsum += d;
            if d > 0.0 && cumsum >= threshold {
                selected = index;
                break;
            }
        }

        centroids.push(points[selected]);
    }

    centroids
}

/// Assigns every point to its nearest centroid. Exact ties go to the lowest
/// centroid index. Returns whether any label changed.
fn assign(points: &[Point], centroids: &[Point], labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best_cluster = 0;
        let mut best_dist = f64::MAX;
        for (index, centroid) in centroids.iter().enumerate() {
            let dist = squared_distance(point, centroid);
            if dist < best_dist {
                best_dist = dist;
                best_cluster = index;
            }
        }
        if *label != best_cluster {
            *label = best_cluster;
            changed = true;
        }
    }
    changed
}

/// Moves each empty centroid onto the point farthest from its own centroid.
///
/// Points already sitting on their centroid are never taken, so surplus
/// centroids stay empty once every point is its own group.
fn relocate_empty(points: &[Point], centroids: &mut [Point], labels: &[usize]) -> bool {
    let mut counts = vec![0usize; centroids.len()];
    for &label in labels {
        counts[label] += 1;
    }
    if counts.iter().all(|&count| count > 0) {
        return false;
    }

    let mut distances: Vec<f64> = points
        .iter()
        .zip(labels)
        .map(|(point, &label)| squared_distance(point, &centroids[label]))
        .collect();

    let mut relocated = false;
    for cluster in 0..centroids.len() {
        if counts[cluster] > 0 {
            continue;
        }

        let mut farthest: Option<usize> = None;
        for (index, &d) in distances.iter().enumerate() {
            if d > 0.0 && farthest.is_none_or(|current| d > distances[current]) {
                farthest = Some(index);
            }
        }

        if let Some(index) = farthest {
            centroids[cluster] = points[index];
            distances[index] = 0.0;
            relocated = true;
        }
    }

    relocated
}

/// Moves each non-empty centroid to the mean of its members.
fn update(points: &[Point], centroids: &mut [Point], labels: &[usize]) {
    let mut sums = vec![[0.0f64; 2]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (point, &label) in points.iter().zip(labels) {
        sums[label][0] += point[0];
        sums[label][1] += point[1];
        counts[label] += 1;
    }

    for (cluster, centroid) in centroids.iter_mut().enumerate() {
        if counts[cluster] > 0 {
            let count = counts[cluster] as f64;
            *centroid = [sums[cluster][0] / count, sums[cluster][1] / count];
        }
    }
}
