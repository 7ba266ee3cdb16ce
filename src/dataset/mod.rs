//! Face dataset container
//!
//! This module implements the dataset struct holding a face archive in
//! memory, together with the split and shuffle helpers used to carve out
//! evaluation sets.
use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use ndarray::{Array1, Array2, ArrayView2, Axis, ScalarOperand};
use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};
use rand::distributions::uniform::SampleUniform;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

mod loader;
pub use loader::load_faces;

/// Floating point numbers
///
/// This trait bound multiplexes the most common assumptions made about
/// floating point numbers and implements them for 32bit and 64bit floating
/// points. They are used as the pixel features of a dataset.
pub trait Float:
    num_traits::Float
    + FromPrimitive
    + NumAssignOps
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + ScalarOperand
    + SampleUniform
    + AsPrimitive<f64>
    + for<'a> AddAssign<&'a Self>
    + approx::AbsDiffEq
    + Send
    + Sync
    + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// A fixed-size collection of labeled grayscale face images.
///
/// Records hold one flattened image per row, so a dataset of `n` images of
/// `h x w` pixels is a `(n, h * w)` matrix. Targets assign each row the
/// integer id of a person; `target_names` maps those ids back to names.
///
/// All images share the same dimensions, hence all rows the same length.
/// This invariant is checked on construction and everything downstream
/// relies on it.
#[derive(Debug, Clone)]
pub struct FaceDataset<F> {
    records: Array2<F>,
    targets: Array1<usize>,
    target_names: Vec<String>,
    image_shape: (usize, usize),
}

impl<F: Float> FaceDataset<F> {
    /// Create a dataset from its parts, checking that records, targets and
    /// image dimensions agree.
    pub fn new(
        records: Array2<F>,
        targets: Array1<usize>,
        target_names: Vec<String>,
        image_shape: (usize, usize),
    ) -> Result<Self> {
        if records.nrows() != targets.len() {
            return Err(Error::ShapeMismatch {
                expected: records.nrows(),
                actual: targets.len(),
            });
        }

        let (h, w) = image_shape;
        if records.ncols() != h * w {
            return Err(Error::ShapeMismatch {
                expected: h * w,
                actual: records.ncols(),
            });
        }

        if let Some(&target) = targets.iter().max() {
            if target >= target_names.len() {
                return Err(Error::Parameters(format!(
                    "target {} exceeds the {} known identities",
                    target,
                    target_names.len()
                )));
            }
        }

        Ok(FaceDataset {
            records,
            targets,
            target_names,
            image_shape,
        })
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    /// Number of distinct identities in the archive.
    pub fn n_classes(&self) -> usize {
        self.target_names.len()
    }

    /// Height and width shared by all images.
    pub fn image_shape(&self) -> (usize, usize) {
        self.image_shape
    }

    pub fn records(&self) -> &Array2<F> {
        &self.records
    }

    pub fn targets(&self) -> &Array1<usize> {
        &self.targets
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// View of the `idx`-th sample restored to its two-dimensional shape.
    pub fn image(&self, idx: usize) -> ArrayView2<F> {
        let (h, w) = self.image_shape;
        // rows are contiguous and `h * w` long by construction
        self.records.row(idx).into_shape((h, w)).unwrap()
    }

    /// Number of samples per identity, indexed by class id.
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.target_names.len()];
        for &target in self.targets.iter() {
            counts[target] += 1;
        }
        counts
    }

    /// Replace the feature matrix, keeping targets and image dimensions.
    ///
    /// Used to swap in preprocessed features, e.g. edge maps. The new
    /// records must have the same shape as the old ones.
    pub fn with_records(self, records: Array2<F>) -> Result<Self> {
        if records.dim() != self.records.dim() {
            return Err(Error::RecordsShape {
                expected: self.records.dim(),
                actual: records.dim(),
            });
        }

        Ok(FaceDataset { records, ..self })
    }

    /// Returns a dataset with the samples in random order, pairing between
    /// rows and targets preserved.
    pub fn shuffle<R: Rng>(self, rng: &mut R) -> Self {
        let mut indices = (0..self.nsamples()).collect::<Vec<_>>();
        indices.shuffle(rng);

        let records = self.records.select(Axis(0), &indices);
        let targets = self.targets.select(Axis(0), &indices);

        FaceDataset {
            records,
            targets,
            target_names: self.target_names,
            image_shape: self.image_shape,
        }
    }

    /// Split the dataset into two disjoint parts, with `ratio` of the
    /// samples ending up in the first one.
    ///
    /// The split is positional; shuffle beforehand for a random partition.
    pub fn split_with_ratio(self, ratio: f32) -> (Self, Self) {
        let n = (self.nsamples() as f32 * ratio).ceil() as usize;
        let n = n.min(self.nsamples());

        let (first_records, second_records) = self.records.view().split_at(Axis(0), n);
        let (first_targets, second_targets) = self.targets.view().split_at(Axis(0), n);

        let first = FaceDataset {
            records: first_records.to_owned(),
            targets: first_targets.to_owned(),
            target_names: self.target_names.clone(),
            image_shape: self.image_shape,
        };
        let second = FaceDataset {
            records: second_records.to_owned(),
            targets: second_targets.to_owned(),
            target_names: self.target_names,
            image_shape: self.image_shape,
        };

        (first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn toy_dataset() -> FaceDataset<f64> {
        // 6 samples of 2x3 images where every pixel equals the sample index,
        // so pairing between rows and targets stays checkable after any
        // permutation
        let records = Array::from_shape_fn((6, 6), |(i, _)| i as f64);
        let targets = array![0, 0, 1, 1, 2, 2];
        let names = vec!["ada".to_string(), "grace".to_string(), "mary".to_string()];

        FaceDataset::new(records, targets, names, (2, 3)).unwrap()
    }

    #[test]
    fn new_rejects_misaligned_targets() {
        let records = Array::zeros((4, 6));
        let targets = array![0, 0, 1];

        let res = FaceDataset::<f64>::new(records, targets, vec!["a".into()], (2, 3));
        assert!(matches!(
            res,
            Err(Error::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn new_rejects_wrong_image_shape() {
        let records = Array::zeros((4, 5));
        let targets = array![0, 0, 0, 0];

        let res = FaceDataset::<f64>::new(records, targets, vec!["a".into()], (2, 3));
        assert!(matches!(res, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn new_rejects_unnamed_target() {
        let records = Array::zeros((2, 6));
        let targets = array![0, 5];

        let res = FaceDataset::<f64>::new(records, targets, vec!["a".into()], (2, 3));
        assert!(matches!(res, Err(Error::Parameters(_))));
    }

    #[test]
    fn with_records_reports_both_dimensions() {
        // same row count, differing feature count: the error must carry the
        // full shapes, not just the agreeing sample counts
        let res = toy_dataset().with_records(Array::zeros((6, 4)));
        assert!(matches!(
            res,
            Err(Error::RecordsShape {
                expected: (6, 6),
                actual: (6, 4)
            })
        ));
    }

    #[test]
    fn split_sizes_and_disjointness() {
        let (train, test) = toy_dataset().split_with_ratio(0.75);

        assert_eq!(train.nsamples(), 5);
        assert_eq!(test.nsamples(), 1);
        assert_eq!(train.nfeatures(), 6);

        // positional split: sample 5 is the only test sample
        assert_eq!(test.records()[(0, 0)], 5.0);
    }

    #[test]
    fn shuffle_preserves_pairing() {
        let mut rng = SmallRng::seed_from_u64(7);
        let shuffled = toy_dataset().shuffle(&mut rng);

        assert_eq!(shuffled.nsamples(), 6);
        for i in 0..6 {
            let original_idx = shuffled.records()[(i, 0)] as usize;
            // sample k carried target k / 2 in the toy dataset
            assert_eq!(shuffled.targets()[i], original_idx / 2);
        }
    }

    #[test]
    fn label_counts_match_targets() {
        assert_eq!(toy_dataset().label_counts(), vec![2, 2, 2]);
    }

    #[test]
    fn image_restores_two_dimensions() {
        let ds = toy_dataset();
        let img = ds.image(3);
        assert_eq!(img.dim(), (2, 3));
        assert_eq!(img[(1, 2)], 3.0);
    }
}
