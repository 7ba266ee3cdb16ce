use ndarray_rand::rand::Rng;

use super::errors::KMeansParamsError;
use super::init::KMeansInit;
use crate::dataset::Float;
use crate::param_guard::ParamGuard;

/// The set of hyperparameters that can be specified for the execution of
/// the K-means algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansValidParams<F: Float, R: Rng> {
    /// Number of times the k-means algorithm will be run with different
    /// centroid seeds
    n_runs: usize,
    /// The training is considered complete if the squared distance between
    /// the old set of centroids and the new set of centroids after a
    /// training iteration is lower or equal than `tolerance`
    tolerance: F,
    /// We exit the training loop when the number of training iterations
    /// exceeds `max_n_iterations` even if the `tolerance` convergence
    /// condition has not been met
    max_n_iterations: u64,
    /// The number of clusters we will be looking for in the training dataset
    n_clusters: usize,
    /// The initialization strategy used to initialize the centroids
    init: KMeansInit,
    /// The random number generator
    rng: R,
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A helper struct used to construct a set of valid hyperparameters for the
/// K-means algorithm (using the builder pattern).
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    /// `new` lets us configure our training algorithm parameters:
    /// * we will be looking for `n_clusters` in the training dataset;
    /// * the training is considered complete if the squared distance
    ///   between the old set of centroids and the new set of centroids
    ///   after a training iteration is lower or equal than `tolerance`;
    /// * we exit the training loop when the number of training iterations
    ///   exceeds `max_n_iterations` even if the `tolerance` convergence
    ///   condition has not been met.
    /// * As KMeans convergence depends on centroids initialization
    ///   we run the algorithm `n_runs` times and we keep the best outputs
    ///   in terms of inertia, the ones which minimize the sum of squared
    ///   euclidean distances to the closest centroid for all observations.
    ///   Only runs that converged within `max_n_iterations` are considered;
    ///   fitting fails if none did.
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `tolerance = 1e-4`
    /// * `max_n_iterations = 300`
    /// * `n_runs = 10`
    /// * `init = KMeansPlusPlus`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            n_runs: 10,
            tolerance: F::cast(1e-4),
            max_n_iterations: 300,
            n_clusters,
            init: KMeansInit::KMeansPlusPlus,
            rng,
        })
    }

    /// Change the value of `n_runs`
    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    /// Change the value of `tolerance`
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Change the value of `max_n_iterations`
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Change the value of `init`
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_clusters == 0 {
            Err(KMeansParamsError::NClusters)
        } else if self.0.n_runs == 0 {
            Err(KMeansParamsError::NRuns)
        } else if self.0.tolerance <= F::zero() {
            Err(KMeansParamsError::Tolerance)
        } else if self.0.max_n_iterations == 0 {
            Err(KMeansParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmeans::KMeans;
    use ndarray_rand::rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn rejects_invalid_hyperparameters() {
        let rng = Isaac64Rng::seed_from_u64(42);

        assert!(matches!(
            KMeansParams::<f64, _>::new(0, rng.clone()).check(),
            Err(KMeansParamsError::NClusters)
        ));
        assert!(matches!(
            KMeansParams::<f64, _>::new(2, rng.clone()).n_runs(0).check(),
            Err(KMeansParamsError::NRuns)
        ));
        assert!(matches!(
            KMeansParams::<f64, _>::new(2, rng.clone()).tolerance(0.).check(),
            Err(KMeansParamsError::Tolerance)
        ));
        assert!(matches!(
            KMeansParams::<f64, _>::new(2, rng).max_n_iterations(0).check(),
            Err(KMeansParamsError::MaxIterations)
        ));
    }

    #[test]
    fn defaults_pass_checking() {
        let params: KMeansParams<f64, _> = KMeans::params(5);
        let valid = params.check().unwrap();

        assert_eq!(valid.n_clusters(), 5);
        assert_eq!(valid.n_runs(), 10);
        assert_eq!(valid.init_method(), KMeansInit::KMeansPlusPlus);
    }
}
