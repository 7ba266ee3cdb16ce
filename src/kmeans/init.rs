use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand;
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::Rng;

use super::algorithm::closest_centroid;
use crate::dataset::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Initialization strategy for the centroids
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KMeansInit {
    /// Pick random observations as initial centroids
    Random,
    /// K-means++ seeding: pick centroids one by one, weighting each
    /// observation by its squared distance to the closest centroid so far
    KMeansPlusPlus,
}

impl KMeansInit {
    pub(crate) fn run<F: Float>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut impl Rng,
    ) -> Array2<F> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_pp(n_clusters, observations, rng),
        }
    }
}

fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

fn k_means_pp<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));
    let first = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(first));

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(centroids.slice(s![0..c_cnt, ..]), observations, &mut dists);
        // every remaining observation may coincide with a chosen centroid,
        // leaving all weights zero; any index is as good as another then
        let centroid_idx = WeightedIndex::new(dists.iter())
            .map(|dist| dist.sample(rng))
            .unwrap_or(0);
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

fn update_min_dists<F: Float>(
    centroids: ArrayView2<F>,
    observations: ArrayView2<F>,
    dists: &mut Array1<F>,
) {
    for (observation, dist) in observations.rows().into_iter().zip(dists.iter_mut()) {
        *dist = closest_centroid(&centroids, &observation).1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn plus_plus_spreads_centroids() {
        // two tight groups; with k = 2 the second centroid must come from
        // the far group since all near points have zero distance weight
        let observations = array![[0., 0.], [0., 0.], [0., 0.], [100., 100.]];
        let mut rng = Isaac64Rng::seed_from_u64(3);

        let centroids = KMeansInit::KMeansPlusPlus.run(2, observations.view(), &mut rng);

        let mut rows: Vec<_> = centroids.rows().into_iter().map(|r| r[0]).collect();
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rows, vec![0., 100.]);
    }

    #[test]
    fn duplicate_observations_do_not_panic() {
        // all pairwise distances are zero, so the distance weighting
        // degenerates after the first pick
        let observations = Array2::from_elem((4, 2), 1.);
        let mut rng = Isaac64Rng::seed_from_u64(42);

        let centroids = KMeansInit::KMeansPlusPlus.run(2, observations.view(), &mut rng);

        assert_eq!(centroids.dim(), (2, 2));
        assert!(centroids.iter().all(|&v| v == 1.));
    }

    #[test]
    fn random_init_picks_distinct_observations() {
        let observations = array![[0., 1.], [2., 3.], [4., 5.], [6., 7.]];
        let mut rng = Isaac64Rng::seed_from_u64(3);

        let centroids = KMeansInit::Random.run(3, observations.view(), &mut rng);
        assert_eq!(centroids.dim(), (3, 2));

        let mut firsts: Vec<_> = centroids.rows().into_iter().map(|r| r[0]).collect();
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        firsts.dedup();
        assert_eq!(firsts.len(), 3);
    }
}
