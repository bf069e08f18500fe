//! Day-sized grouping of points of interest.

use serde::Serialize;
use tracing::{error, info};

use crate::error::PlannerError;
use crate::geo_point::{Coordinates, GeoPoint};
use crate::kmeans::KMeans;
use crate::traits::Partitioner;

/// Points assigned to one day. The base point is never a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cluster {
    members: Vec<GeoPoint>,
}

impl Cluster {
    pub fn new(members: Vec<GeoPoint>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[GeoPoint] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.members.push(point);
    }
}

/// Partitions points into `days` groups.
///
/// The base point is fed to the partitioner alongside the points so that it
/// pulls centroids toward itself, but its own label is discarded.
#[derive(Debug, Clone, Default)]
pub struct Clusterer<P = KMeans> {
    partitioner: P,
}

impl<P: Partitioner> Clusterer<P> {
    pub fn new(partitioner: P) -> Self {
        Self { partitioner }
    }

    /// Returns exactly `days` clusters that together hold every input point
    /// once, in input order within each cluster.
    pub fn partition(&self, base: &GeoPoint, points: &[GeoPoint], days: usize) -> Result<Vec<Cluster>, PlannerError> {
        info!(days, points = points.len(), "clustering locations");

        let labels = self.labels(base, points, days).inspect_err(|err| {
            error!(error = %err, "clustering failed");
        })?;

        let mut clusters = vec![Cluster::default(); days];
        for (point, label) in points.iter().zip(labels.into_iter().skip(1)) {
            clusters[label].push(point.clone());
        }

        info!(
            sizes = ?clusters.iter().map(Cluster::len).collect::<Vec<_>>(),
            "clustering complete"
        );
        Ok(clusters)
    }

    fn labels(&self, base: &GeoPoint, points: &[GeoPoint], days: usize) -> Result<Vec<usize>, PlannerError> {
        if days == 0 {
            return Err(PlannerError::ClusteringFailed("days must be at least 1".to_string()));
        }

        let coordinates: Vec<Coordinates> = std::iter::once(base.coordinates())
            .chain(points.iter().map(GeoPoint::coordinates))
            .collect();

        let labels = self.partitioner.labels(&coordinates, days)?;
        if labels.len() != coordinates.len() {
            return Err(PlannerError::ClusteringFailed(format!(
                "partitioner returned {} labels for {} coordinates",
                labels.len(),
                coordinates.len()
            )));
        }
        if let Some(label) = labels.iter().find(|&&label| label >= days) {
            return Err(PlannerError::ClusteringFailed(format!(
                "partitioner returned label {label} for {days} groups"
            )));
        }

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLabels(Vec<usize>);

    impl Partitioner for FixedLabels {
        fn labels(&self, _coordinates: &[Coordinates], _k: usize) -> Result<Vec<usize>, PlannerError> {
            Ok(self.0.clone())
        }
    }

    fn points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new("a", 0.0, 0.0),
            GeoPoint::new("b", 1.0, 1.0),
            GeoPoint::new("c", 2.0, 2.0),
        ]
    }

    #[test]
    fn test_base_label_is_discarded() {
        let base = GeoPoint::new("base", 0.5, 0.5);
        let clusterer = Clusterer::new(FixedLabels(vec![2, 0, 1, 0]));
        let clusters = clusterer.partition(&base, &points(), 3).unwrap();

        assert_eq!(clusters.len(), 3);
        let names = |c: &Cluster| c.members().iter().map(|p| p.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(&clusters[0]), vec!["a", "c"]);
        assert_eq!(names(&clusters[1]), vec!["b"]);
        assert!(clusters[2].is_empty(), "base's own group must not receive the base");
    }

    #[test]
    fn test_out_of_range_label_fails() {
        let base = GeoPoint::new("base", 0.5, 0.5);
        let clusterer = Clusterer::new(FixedLabels(vec![0, 0, 3, 0]));
        assert!(matches!(
            clusterer.partition(&base, &points(), 2),
            Err(PlannerError::ClusteringFailed(_))
        ));
    }

    #[test]
    fn test_label_count_mismatch_fails() {
        let base = GeoPoint::new("base", 0.5, 0.5);
        let clusterer = Clusterer::new(FixedLabels(vec![0, 0]));
        assert!(matches!(
            clusterer.partition(&base, &points(), 1),
            Err(PlannerError::ClusteringFailed(_))
        ));
    }

    #[test]
    fn test_zero_days_fails() {
        let base = GeoPoint::new("base", 0.5, 0.5);
        assert!(matches!(
            Clusterer::<KMeans>::default().partition(&base, &points(), 0),
            Err(PlannerError::ClusteringFailed(_))
        ));
    }
}
