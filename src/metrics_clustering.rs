//! Agreement metrics between a predicted clustering and reference labels
//!
//! A clustering run assigns every sample an integer cluster id. Given the
//! true identity of each sample, the agreement between both partitions is
//! summarized by the information-theoretic homogeneity, completeness and
//! V-measure scores, all invariant under renaming of cluster ids.
use std::collections::BTreeMap;

use ndarray::{Array2, ArrayBase, Data, Ix1};

use crate::error::{Error, Result};

/// Scores and contingency structure for one clustering run.
///
/// All scores lie in `[0, 1]`:
///
/// * `homogeneity` is `1 - H(predicted | truth) / H(predicted)`, i.e. whether
///   the reference labels suffice to tell predicted clusters apart. When the
///   prediction collapses into a single cluster its entropy is zero and the
///   score is `1` by convention.
/// * `completeness` is the same quantity with the roles swapped.
/// * `v_measure` is the harmonic mean of the two, `0` when both vanish.
#[derive(Debug, Clone)]
pub struct ClusterReport {
    pub homogeneity: f64,
    pub completeness: f64,
    pub v_measure: f64,
    contingency: Array2<usize>,
}

impl ClusterReport {
    /// Joint occurrence counts with one row per predicted cluster and one
    /// column per true class.
    pub fn contingency(&self) -> &Array2<usize> {
        &self.contingency
    }
}

/// Score a predicted cluster assignment against reference labels.
pub trait ClusterAgreement<D: Data<Elem = usize>> {
    /// Build a [`ClusterReport`] from this prediction and the ground truth.
    ///
    /// Both sequences must align by position; mismatched lengths fail with
    /// [`Error::ShapeMismatch`]. The scores are a pure function of the two
    /// partitions.
    fn agreement(&self, ground_truth: &ArrayBase<D, Ix1>) -> Result<ClusterReport>;
}

impl<C: Data<Elem = usize>, D: Data<Elem = usize>> ClusterAgreement<D> for ArrayBase<C, Ix1> {
    fn agreement(&self, ground_truth: &ArrayBase<D, Ix1>) -> Result<ClusterReport> {
        if self.len() != ground_truth.len() {
            return Err(Error::ShapeMismatch {
                expected: self.len(),
                actual: ground_truth.len(),
            });
        }

        let n_clusters = self.iter().max().map(|&m| m + 1).unwrap_or(0);
        let n_classes = ground_truth.iter().max().map(|&m| m + 1).unwrap_or(0);

        let mut contingency = Array2::zeros((n_clusters, n_classes));
        for (&cluster, &class) in self.iter().zip(ground_truth.iter()) {
            contingency[(cluster, class)] += 1;
        }

        let total = self.len() as f64;
        let h_pred = entropy(contingency.rows().into_iter().map(|row| row.sum()), total);
        let h_true = entropy(
            contingency.columns().into_iter().map(|col| col.sum()),
            total,
        );
        let h_joint = entropy(contingency.iter().copied(), total);

        // conditional entropies via H(A | B) = H(A, B) - H(B)
        let homogeneity = if h_pred == 0. {
            1.
        } else {
            1. - (h_joint - h_true) / h_pred
        };
        let completeness = if h_true == 0. {
            1.
        } else {
            1. - (h_joint - h_pred) / h_true
        };
        let v_measure = if homogeneity + completeness == 0. {
            0.
        } else {
            2. * homogeneity * completeness / (homogeneity + completeness)
        };

        Ok(ClusterReport {
            homogeneity,
            completeness,
            v_measure,
            contingency,
        })
    }
}

/// Shannon entropy in nats of a count distribution with the given total.
fn entropy(counts: impl Iterator<Item = usize>, total: f64) -> f64 {
    counts
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Bucket sample indices by their predicted cluster.
///
/// Returns, for every cluster id appearing in `predicted` in ascending
/// order, the indices assigned to it in their original relative order.
/// Clusters without members are absent. Ids outside `[0, n_clusters)` fail
/// with [`Error::InvalidClusterId`].
pub fn group_by_cluster<D: Data<Elem = usize>>(
    predicted: &ArrayBase<D, Ix1>,
    n_clusters: usize,
) -> Result<BTreeMap<usize, Vec<usize>>> {
    let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

    for (idx, &id) in predicted.iter().enumerate() {
        if id >= n_clusters {
            return Err(Error::InvalidClusterId { id, n_clusters });
        }
        buckets.entry(id).or_insert_with(Vec::new).push(idx);
    }

    Ok(buckets)
}
