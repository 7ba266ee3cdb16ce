use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix1, Ix2, Zip};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;

use super::errors::KMeansError;
use super::hyperparams::{KMeansParams, KMeansValidParams};
use crate::dataset::Float;
use crate::traits::{Fit, Predict};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// K-means clustering aims to partition a set of unlabeled observations into
/// clusters, where each observation belongs to the cluster with the nearest
/// mean.
///
/// The mean of the points within a cluster is called *centroid*. Given the
/// set of centroids, an observation is assigned to a cluster by choosing the
/// nearest centroid.
///
/// We provide a modified version of the _standard algorithm_ (also known as
/// Lloyd's Algorithm), called m_k-means, which uses a slightly modified
/// update step to avoid problems with empty clusters.
///
/// There are three steps in the standard algorithm:
/// - initialisation step: select initial centroids using one of our provided
///   algorithms;
/// - assignment step: assign each observation to the nearest cluster
///   (minimum distance between the observation and the cluster's centroid);
/// - update step: recompute the centroid of each cluster.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until convergence is reached,
/// either because the shift between the old and the new centroids falls
/// below `tolerance` or because we exceed `max_n_iterations`. Since the
/// outcome depends on the initial seeding, the algorithm is restarted
/// `n_runs` times and the converged run with the lowest inertia wins; runs
/// that hit the iteration cap are discarded, and fitting fails with
/// [`KMeansError::NotConverged`] when no run converges at all.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<usize>,
    inertia: F,
}

impl<F: Float> KMeans<F> {
    /// Configure the algorithm for `n_clusters` clusters with a default,
    /// seeded random number generator.
    pub fn params(n_clusters: usize) -> KMeansParams<F, Isaac64Rng> {
        KMeansParams::new(n_clusters, Isaac64Rng::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_count(&self) -> &Array1<usize> {
        &self.cluster_count
    }

    /// Return the sum of squared distances between each training point and
    /// its closest centroid, averaged across all training points.
    pub fn inertia(&self) -> F {
        self.inertia
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>> Fit<ArrayBase<DA, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape
    /// `(n_observations, n_features)`, `fit` identifies `n_clusters`
    /// centroids based on the training data distribution.
    ///
    /// An instance of `KMeans` is returned.
    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KMeansError> {
        let mut rng = self.rng().clone();
        let observations = observations.view();
        let n_samples = observations.nrows();

        if n_samples < self.n_clusters() {
            return Err(KMeansError::NotEnoughSamples {
                n_samples,
                n_clusters: self.n_clusters(),
            });
        }

        let mut min_inertia = F::infinity();
        let mut best_centroids = None;
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);

        for _ in 0..self.n_runs() {
            let mut inertia = min_inertia;
            let mut centroids =
                self.init_method()
                    .run(self.n_clusters(), observations, &mut rng);
            let mut converged = false;
            for _ in 0..self.max_n_iterations() {
                update_memberships_and_dists(
                    &centroids,
                    &observations,
                    &mut memberships,
                    &mut dists,
                );
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                inertia = dists.sum();
                let shift = (&centroids - &new_centroids).mapv(|x| x * x).sum();
                centroids = new_centroids;
                if shift < self.tolerance() {
                    converged = true;
                    break;
                }
            }

            // We keep the centroids which minimize the inertia (defined as
            // the sum of the squared distances of the closest centroid for
            // all observations) over the converged runs. A run that hit the
            // iteration cap does not compete, so it cannot shadow an
            // earlier converged one.
            if converged && inertia < min_inertia {
                min_inertia = inertia;
                best_centroids = Some(centroids);
            }
        }

        match best_centroids {
            Some(centroids) => {
                // memberships may still belong to a later, worse run
                update_memberships_and_dists(
                    &centroids,
                    &observations,
                    &mut memberships,
                    &mut dists,
                );
                let mut cluster_count = Array1::zeros(self.n_clusters());
                memberships.iter().for_each(|&c| cluster_count[c] += 1);
                Ok(KMeans {
                    centroids,
                    cluster_count,
                    inertia: min_inertia / F::cast(n_samples),
                })
            }
            None => Err(KMeansError::NotConverged),
        }
    }
}

impl<F: Float, DA: Data<Elem = F>> Predict<&ArrayBase<DA, Ix2>, Array1<usize>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape
    /// `(n_observations, n_features)`, `predict` returns, for each
    /// observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](KMeans::centroids).
    fn predict(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        let mut memberships = Array1::zeros(observations.nrows());
        Zip::from(observations.rows())
            .and(&mut memberships)
            .for_each(|observation, membership| {
                *membership = closest_centroid(&self.centroids, &observation).0
            });
        memberships
    }
}

fn update_memberships_and_dists<F: Float>(
    centroids: &Array2<F>,
    observations: &ArrayView2<F>,
    memberships: &mut Array1<usize>,
    dists: &mut Array1<F>,
) {
    Zip::from(observations.rows())
        .and(memberships)
        .and(dists)
        .for_each(|observation, membership, dist| {
            let (idx, d) = closest_centroid(centroids, &observation);
            *membership = idx;
            *dist = d;
        });
}

/// Index of the nearest centroid and the squared distance to it
pub(crate) fn closest_centroid<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut nearest = 0;
    let mut min_dist = F::infinity();
    for (idx, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = centroid
            .iter()
            .zip(observation.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum();
        if dist < min_dist {
            min_dist = dist;
            nearest = idx;
        }
    }
    (nearest, min_dist)
}

/// `compute_centroids` returns a 2-dimensional array, where the i-th row
/// corresponds to the i-th cluster.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    observations: &ArrayView2<F>,
    cluster_memberships: &Array1<usize>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::ones(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &membership| {
            let mut centroid = centroids.row_mut(membership);
            centroid += &observation;
            counts[membership] += 1;
        });

    // m_k-means update: the old centroid participates in the mean, which
    // steers empty clusters back to their previous position instead of
    // dividing by zero
    Zip::from(centroids.rows_mut())
        .and(old_centroids.rows())
        .and(&counts)
        .for_each(|mut centroid, old_centroid, &count| {
            centroid += &old_centroid;
            centroid /= F::cast(count);
        });

    centroids
}
