//! Agglomerative hierarchical clustering
//!
//! Each observation starts in its own cluster. During each step, the two
//! nearest clusters are merged, until a stopping criterion is reached. The
//! dissimilarity between observations is their Euclidean distance; how that
//! distance extends to whole clusters is determined by the linkage
//! [`Method`], with support of the [kodama](https://docs.rs/kodama) crate.
//!
//! Unlike K-means there is no out-of-sample extension: the algorithm
//! partitions exactly the observations it is given, so it is run directly on
//! each evaluation set.
use std::collections::HashMap;

use kodama::linkage;
pub use kodama::Method;
use ndarray::{Array1, ArrayBase, Data, Ix2};
use num_traits::AsPrimitive;

use crate::dataset::Float;
use crate::error::{Error, Result};
use crate::traits::Transformer;

/// Criterion when to stop merging
///
/// Merging can stop either when a certain number of clusters is reached, or
/// when the dissimilarity of the next merge exceeds a maximal distance.
#[derive(Clone, Debug)]
pub enum Criterion<F> {
    NumClusters(usize),
    Distance(F),
}

/// Agglomerative hierarchical clustering over raw observations
pub struct Agglomerative<F> {
    method: Method,
    stopping: Criterion<F>,
}

impl<F: Float> Agglomerative<F> {
    /// Select a linkage method
    pub fn with_method(mut self, method: Method) -> Agglomerative<F> {
        self.method = method;
        self
    }

    /// Stop merging when the number of clusters drops to this value
    pub fn num_clusters(mut self, num_clusters: usize) -> Agglomerative<F> {
        self.stopping = Criterion::NumClusters(num_clusters);
        self
    }

    /// Stop merging when the next merge distance exceeds this value
    pub fn max_distance(mut self, max_distance: F) -> Agglomerative<F> {
        self.stopping = Criterion::Distance(max_distance);
        self
    }
}

/// Ward linkage down to two clusters
impl<F> Default for Agglomerative<F> {
    fn default() -> Agglomerative<F> {
        Agglomerative {
            method: Method::Ward,
            stopping: Criterion::NumClusters(2),
        }
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Result<Array1<usize>>>
    for Agglomerative<F>
{
    /// Perform hierarchical clustering of the observation matrix
    ///
    /// Returns the cluster id for each observation, densely numbered from
    /// zero in order of each cluster's earliest member, so identical inputs
    /// yield identical assignments across runs.
    fn transform(&self, observations: &ArrayBase<D, Ix2>) -> Result<Array1<usize>> {
        let n_observations = observations.nrows();
        if n_observations == 0 {
            return Err(Error::EmptyDataset);
        }
        if let Criterion::NumClusters(k) = self.stopping {
            if k == 0 || k > n_observations {
                return Err(Error::Parameters(format!(
                    "cannot form {} clusters out of {} observations",
                    k, n_observations
                )));
            }
        }

        // condensed pairwise distance matrix, row-major upper triangle
        let mut condensed = Vec::with_capacity(n_observations * (n_observations - 1) / 2);
        for i in 0..n_observations {
            for j in (i + 1)..n_observations {
                condensed.push(euclidean(observations.row(i), observations.row(j)));
            }
        }

        let dendrogram = linkage(&mut condensed, n_observations, self.method);

        // replay the merge steps until the stopping criterion is reached;
        // at the beginning every observation is in its own cluster
        let mut clusters = (0..n_observations)
            .map(|x| (x, vec![x]))
            .collect::<HashMap<_, _>>();

        // counter for new clusters, which are formed as unions of previous ones
        let mut ct = n_observations;

        for step in dendrogram.steps() {
            let should_stop = match self.stopping {
                Criterion::NumClusters(k) => clusters.len() <= k,
                Criterion::Distance(dist) => step.dissimilarity >= dist.as_(),
            };
            if should_stop {
                break;
            }

            let mut ids = Vec::with_capacity(2);
            let mut cluster = clusters.remove(&step.cluster1).unwrap();
            ids.append(&mut cluster);
            let mut cluster = clusters.remove(&step.cluster2).unwrap();
            ids.append(&mut cluster);

            clusters.insert(ct, ids);
            ct += 1;
        }

        // relabel clusters by their earliest member so that repeated runs
        // agree on the ids
        let mut clusters = clusters.into_iter().map(|(_, ids)| ids).collect::<Vec<_>>();
        clusters.sort_by_key(|ids| ids.iter().min().copied());

        let mut assignment = vec![0; n_observations];
        for (label, ids) in clusters.into_iter().enumerate() {
            for id in ids {
                assignment[id] = label;
            }
        }

        Ok(Array1::from(assignment))
    }
}

fn euclidean<F: Float>(
    a: ndarray::ArrayView1<F>,
    b: ndarray::ArrayView1<F>,
) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d: f64 = (x - y).as_();
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{concatenate, Array, Axis};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Normal;
    use ndarray_rand::RandomExt;
    use rand_isaac::Isaac64Rng;

    fn two_blobs(npoints: usize, rng: &mut Isaac64Rng) -> Array<f64, ndarray::Ix2> {
        concatenate![
            Axis(0),
            Array::random_using((npoints, 2), Normal::new(-10., 0.1).unwrap(), rng),
            Array::random_using((npoints, 2), Normal::new(10., 0.1).unwrap(), rng)
        ]
    }

    #[test]
    fn separates_blobs_with_every_linkage() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let npoints = 10;
        let entries = two_blobs(npoints, &mut rng);

        for method in &[Method::Ward, Method::Average, Method::Complete] {
            let ids = Agglomerative::default()
                .with_method(*method)
                .num_clusters(2)
                .transform(&entries)
                .unwrap();

            // first blob contains observation 0, so its cluster is labeled 0
            assert!(ids.iter().take(npoints).all(|&id| id == 0));
            assert!(ids.iter().skip(npoints).all(|&id| id == 1));
        }
    }

    #[test]
    fn max_distance_criterion_stops_merging() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let npoints = 10;
        let entries = two_blobs(npoints, &mut rng);

        // the blobs are ~28 apart, in-blob distances are tiny
        let ids = Agglomerative::default()
            .with_method(Method::Average)
            .max_distance(5.)
            .transform(&entries)
            .unwrap();

        assert!(ids.iter().take(npoints).all(|&id| id == 0));
        assert!(ids.iter().skip(npoints).all(|&id| id == 1));
    }

    #[test]
    fn assignments_are_reproducible() {
        let mut rng = Isaac64Rng::seed_from_u64(1);
        let entries = two_blobs(5, &mut rng);

        let cluster = Agglomerative::default().num_clusters(3);
        let first = cluster.transform(&entries).unwrap();
        let second = cluster.transform(&entries).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn rejects_degenerate_cluster_counts() {
        let entries = Array::zeros((4, 2));

        let res = Agglomerative::<f64>::default()
            .num_clusters(0)
            .transform(&entries);
        assert!(matches!(res, Err(Error::Parameters(_))));

        let res = Agglomerative::<f64>::default()
            .num_clusters(5)
            .transform(&entries);
        assert!(matches!(res, Err(Error::Parameters(_))));
    }
}
