//! Confusion matrix and per-class scores
//!
//! Clustering quality is also inspected the way a classifier would be: a
//! confusion matrix of predicted cluster against true identity, with
//! per-class precision, recall and F-score derived from its entries.
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FromIterator;

use ndarray::prelude::*;
use ndarray::Data;

/// Return tuple of class index for each element of prediction and ground truth
fn map_prediction_to_idx<A: Eq + Hash, C: Data<Elem = A>, D: Data<Elem = A>>(
    prediction: &ArrayBase<C, Ix1>,
    ground_truth: &ArrayBase<D, Ix1>,
    classes: &[A],
) -> Vec<Option<(usize, usize)>> {
    // create a map from class label to index
    let set = classes
        .iter()
        .enumerate()
        .map(|(a, b)| (b, a))
        .collect::<HashMap<_, usize>>();

    // indices for every prediction
    ground_truth
        .iter()
        .zip(prediction.iter())
        .map(|(a, b)| set.get(&a).and_then(|x| set.get(&b).map(|y| (*x, *y))))
        .collect::<Vec<Option<_>>>()
}

/// Confusion matrix for multi-label evaluation
///
/// A confusion matrix shows predictions in a matrix, where rows correspond to
/// target and columns to predicted. The diagonal entries are correct
/// predictions.
pub struct ConfusionMatrix<A> {
    matrix: Array2<usize>,
    members: Array1<A>,
}

impl<A> ConfusionMatrix<A> {
    /// Raw occurrence counts
    pub fn matrix(&self) -> &Array2<usize> {
        &self.matrix
    }

    /// Class labels in the order of the matrix rows/columns
    pub fn members(&self) -> &Array1<A> {
        &self.members
    }

    /// Calculate precision for every class
    pub fn precision(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(1));

        Array1::from_iter(
            self.matrix
                .diag()
                .iter()
                .zip(sum.iter())
                .map(|(a, b)| *a as f32 / *b as f32),
        )
    }

    /// Calculate recall for every class
    pub fn recall(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(0));

        Array1::from_iter(
            self.matrix
                .diag()
                .iter()
                .zip(sum.iter())
                .map(|(a, b)| *a as f32 / *b as f32),
        )
    }

    /// Return mean accuracy
    pub fn accuracy(&self) -> f32 {
        self.matrix.diag().sum() as f32 / self.matrix.sum() as f32
    }

    /// Return beta score for every class
    pub fn f_score(&self, beta: f32) -> Array1<f32> {
        let sb = beta * beta;
        let precision = self.precision();
        let recall = self.recall();

        Array::from_iter(
            precision
                .iter()
                .zip(recall.iter())
                .map(|(p, r)| (1.0 + sb) * (p * r) / (sb * p + r)),
        )
    }

    /// Return beta=1 score for every class
    pub fn f1_score(&self) -> Array1<f32> {
        self.f_score(1.0)
    }
}

/// Print a confusion matrix
impl<A: fmt::Display> fmt::Debug for ConfusionMatrix<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = self.matrix.len_of(Axis(0));
        for _ in 0..len * 4 + 1 {
            write!(f, "-")?;
        }
        writeln!(f)?;

        for i in 0..len {
            write!(f, "| ")?;

            for j in 0..len {
                write!(f, "{} | ", self.matrix[(i, j)])?;
            }
            writeln!(f)?;
        }

        for _ in 0..len * 4 + 1 {
            write!(f, "-")?;
        }

        Ok(())
    }
}

/// Build a confusion matrix from a prediction and its ground truth
///
/// The class set is the sorted union of labels appearing in either sequence.
pub trait ToConfusionMatrix<A, D: Data<Elem = A>> {
    fn confusion_matrix(&self, ground_truth: &ArrayBase<D, Ix1>) -> ConfusionMatrix<A>;
}

impl<A: Eq + Hash + Copy + Ord, C: Data<Elem = A>, D: Data<Elem = A>> ToConfusionMatrix<A, D>
    for ArrayBase<C, Ix1>
{
    fn confusion_matrix(&self, ground_truth: &ArrayBase<D, Ix1>) -> ConfusionMatrix<A> {
        let mut classes = ground_truth
            .iter()
            .chain(self.iter())
            .copied()
            .collect::<Vec<_>>();
        classes.sort_unstable();
        classes.dedup();

        // find indices to labels
        let indices = map_prediction_to_idx(self, ground_truth, &classes);

        // count each index tuple in the confusion matrix
        let mut confusion_matrix = Array2::zeros((classes.len(), classes.len()));
        for (i1, i2) in indices.into_iter().flatten() {
            confusion_matrix[(i1, i2)] += 1;
        }

        ConfusionMatrix {
            matrix: confusion_matrix,
            members: Array1::from(classes),
        }
    }
}
