//! Canny edge detection over grayscale intensity arrays
//!
//! The detector reduces a grayscale image to a binary edge map: Gaussian
//! smoothing controlled by `sigma`, Sobel gradients, non-maximum suppression
//! along the gradient direction and a double threshold with hysteresis.
//! Larger `sigma` smooths more aggressively and keeps only coarse edges.
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use thiserror::Error;

use crate::dataset::{FaceDataset, Float};
use crate::error::Result;
use crate::param_guard::ParamGuard;
use crate::traits::Transformer;

/// An error when building a Canny detector with invalid hyperparameters
#[derive(Error, Debug)]
pub enum CannyParamsError {
    #[error("sigma must be greater than 0")]
    Sigma,
    #[error("thresholds must satisfy 0 <= low < high <= 1")]
    Thresholds,
}

/// The checked hyperparameters of the Canny detector.
#[derive(Clone, Debug, PartialEq)]
pub struct CannyValidParams<F: Float> {
    /// Standard deviation of the Gaussian smoothing kernel
    sigma: F,
    /// Weak edge threshold, as a fraction of the maximum gradient magnitude
    low_threshold: F,
    /// Strong edge threshold, as a fraction of the maximum gradient magnitude
    high_threshold: F,
}

impl<F: Float> CannyValidParams<F> {
    pub fn sigma(&self) -> F {
        self.sigma
    }

    pub fn low_threshold(&self) -> F {
        self.low_threshold
    }

    pub fn high_threshold(&self) -> F {
        self.high_threshold
    }

    /// Apply the detector to every image of a dataset, producing a dataset
    /// of binary edge maps with targets and dimensions preserved.
    pub fn transform_dataset(&self, dataset: &FaceDataset<F>) -> Result<FaceDataset<F>> {
        let (h, w) = dataset.image_shape();
        let mut records = Array2::zeros((dataset.nsamples(), h * w));

        for (idx, mut row) in records.rows_mut().into_iter().enumerate() {
            let edges = self.transform(&dataset.image(idx));
            row.assign(&edges.into_shape(h * w)?);
        }

        dataset.clone().with_records(records)
    }
}

/// A helper struct for building a valid set of hyperparameters
/// (using the builder pattern).
#[derive(Clone, Debug, PartialEq)]
pub struct CannyParams<F: Float>(CannyValidParams<F>);

impl<F: Float> CannyParams<F> {
    /// Change the value of `sigma`
    pub fn sigma(mut self, sigma: F) -> Self {
        self.0.sigma = sigma;
        self
    }

    /// Change the weak edge threshold
    pub fn low_threshold(mut self, low_threshold: F) -> Self {
        self.0.low_threshold = low_threshold;
        self
    }

    /// Change the strong edge threshold
    pub fn high_threshold(mut self, high_threshold: F) -> Self {
        self.0.high_threshold = high_threshold;
        self
    }
}

impl<F: Float> ParamGuard for CannyParams<F> {
    type Checked = CannyValidParams<F>;
    type Error = CannyParamsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        if self.0.sigma <= F::zero() {
            Err(CannyParamsError::Sigma)
        } else if self.0.low_threshold < F::zero()
            || self.0.low_threshold >= self.0.high_threshold
            || self.0.high_threshold > F::one()
        {
            Err(CannyParamsError::Thresholds)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Sigma-parameterized Canny edge detector
pub struct Canny;

impl Canny {
    /// Configure the detector with default hyperparameters:
    /// * `sigma = 1.0`
    /// * `low_threshold = 0.1`
    /// * `high_threshold = 0.2`
    pub fn params<F: Float>() -> CannyParams<F> {
        CannyParams(CannyValidParams {
            sigma: F::one(),
            low_threshold: F::cast(0.1),
            high_threshold: F::cast(0.2),
        })
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Array2<F>>
    for CannyValidParams<F>
{
    /// Detect edges in a single grayscale image
    ///
    /// Returns an array of identical shape holding `1` on edge pixels and
    /// `0` everywhere else.
    fn transform(&self, image: &ArrayBase<D, Ix2>) -> Array2<F> {
        let image = image.mapv(|v| v.as_());

        let blurred = gaussian_blur(&image, self.sigma.as_());
        let (gx, gy) = sobel(&blurred);

        let magnitude = Array2::from_shape_fn(image.dim(), |(r, c)| {
            (gx[(r, c)] * gx[(r, c)] + gy[(r, c)] * gy[(r, c)]).sqrt()
        });

        let max_magnitude = magnitude.iter().cloned().fold(0., f64::max);
        if max_magnitude <= 0. {
            return Array2::zeros(image.dim());
        }

        let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
        let edges = hysteresis(
            &thinned,
            self.low_threshold.as_() * max_magnitude,
            self.high_threshold.as_() * max_magnitude,
        );

        edges.mapv(|on| if on { F::one() } else { F::zero() })
    }
}

/// Separable Gaussian smoothing with reflected borders, kernel radius 3 sigma
fn gaussian_blur(image: &Array2<f64>, sigma: f64) -> Array2<f64> {
    let radius = (3. * sigma).ceil() as isize;
    let mut kernel = Array1::from_shape_fn(2 * radius as usize + 1, |i| {
        let x = i as f64 - radius as f64;
        (-x * x / (2. * sigma * sigma)).exp()
    });
    kernel /= kernel.sum();

    let (rows, cols) = image.dim();
    let mut horizontal = Array2::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.;
            for (k, &weight) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                acc += weight * image[(r, clamp(c as isize + offset, cols))];
            }
            horizontal[(r, c)] = acc;
        }
    }

    let mut smoothed = Array2::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.;
            for (k, &weight) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                acc += weight * horizontal[(clamp(r as isize + offset, rows), c)];
            }
            smoothed[(r, c)] = acc;
        }
    }

    smoothed
}

/// Sobel gradients with clamped borders
fn sobel(image: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let (rows, cols) = image.dim();
    let mut gx = Array2::zeros((rows, cols));
    let mut gy = Array2::zeros((rows, cols));

    let at = |r: isize, c: isize| image[(clamp(r, rows), clamp(c, cols))];

    for r in 0..rows as isize {
        for c in 0..cols as isize {
            gx[(r as usize, c as usize)] = at(r - 1, c + 1) + 2. * at(r, c + 1) + at(r + 1, c + 1)
                - at(r - 1, c - 1)
                - 2. * at(r, c - 1)
                - at(r + 1, c - 1);
            gy[(r as usize, c as usize)] = at(r + 1, c - 1) + 2. * at(r + 1, c) + at(r + 1, c + 1)
                - at(r - 1, c - 1)
                - 2. * at(r - 1, c)
                - at(r - 1, c + 1);
        }
    }

    (gx, gy)
}

/// Keep only pixels whose magnitude is a local maximum along the gradient
/// direction, quantized to four sectors
fn non_maximum_suppression(
    magnitude: &Array2<f64>,
    gx: &Array2<f64>,
    gy: &Array2<f64>,
) -> Array2<f64> {
    let (rows, cols) = magnitude.dim();
    let mut thinned = Array2::zeros((rows, cols));

    for r in 0..rows {
        for c in 0..cols {
            let angle = gy[(r, c)].atan2(gx[(r, c)]);
            // quantize the direction into 45 degree sectors
            let sector = ((angle / std::f64::consts::FRAC_PI_4).round().rem_euclid(4.)) as usize;
            let (dr, dc) = match sector {
                0 => (0isize, 1isize), // horizontal gradient, vertical edge
                1 => (1, 1),
                2 => (1, 0),
                _ => (1, -1),
            };

            let here = magnitude[(r, c)];
            let fwd = magnitude[(clamp(r as isize + dr, rows), clamp(c as isize + dc, cols))];
            let bwd = magnitude[(clamp(r as isize - dr, rows), clamp(c as isize - dc, cols))];

            if here >= fwd && here >= bwd {
                thinned[(r, c)] = here;
            }
        }
    }

    thinned
}

/// Double threshold with hysteresis: strong pixels seed edges, weak pixels
/// join only when 8-connected to an edge
fn hysteresis(magnitude: &Array2<f64>, low: f64, high: f64) -> Array2<bool> {
    let (rows, cols) = magnitude.dim();
    let mut edges = Array2::from_elem((rows, cols), false);

    let mut stack = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if magnitude[(r, c)] >= high {
                edges[(r, c)] = true;
                stack.push((r, c));
            }
        }
    }

    while let Some((r, c)) = stack.pop() {
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                let (nr, nc) = (r as isize + dr, c as isize + dc);
                if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if !edges[(nr, nc)] && magnitude[(nr, nc)] >= low {
                    edges[(nr, nc)] = true;
                    stack.push((nr, nc));
                }
            }
        }
    }

    edges
}

fn clamp(idx: isize, len: usize) -> usize {
    idx.max(0).min(len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn step_image(rows: usize, cols: usize) -> Array2<f64> {
        // left half dark, right half bright
        Array::from_shape_fn((rows, cols), |(_, c)| if c < cols / 2 { 0. } else { 1. })
    }

    #[test]
    fn finds_a_vertical_step_edge() {
        let image = step_image(16, 16);

        let edges = Canny::params().sigma(1.).check_unwrap().transform(&image);

        // every row crosses the step, so every row holds at least one edge
        // pixel, and all edges hug the step column
        for r in 0..16 {
            let marked: Vec<usize> = (0..16).filter(|&c| edges[(r, c)] > 0.).collect();
            assert!(!marked.is_empty());
            assert!(marked.iter().all(|&c| (5..=10).contains(&c)));
        }
    }

    #[test]
    fn uniform_image_has_no_edges() {
        let image = Array2::from_elem((12, 12), 0.5);

        let edges = Canny::params().sigma(1.).check_unwrap().transform(&image);
        assert_eq!(edges.sum(), 0.);
    }

    #[test]
    fn output_is_binary() {
        let image = step_image(10, 10);

        let edges = Canny::params().sigma(1.).check_unwrap().transform(&image);
        assert!(edges.iter().all(|&v| v == 0. || v == 1.));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            Canny::params::<f64>().sigma(0.).check(),
            Err(CannyParamsError::Sigma)
        ));
        assert!(matches!(
            Canny::params().low_threshold(0.5).high_threshold(0.2).check(),
            Err(CannyParamsError::Thresholds)
        ));
        assert!(matches!(
            Canny::params().high_threshold(1.5).check(),
            Err(CannyParamsError::Thresholds)
        ));
    }

    #[test]
    fn transform_dataset_preserves_layout() {
        let records = array![
            [0., 0., 1., 1., 0., 0., 1., 1., 0., 0., 1., 1.],
            [1., 1., 0., 0., 1., 1., 0., 0., 1., 1., 0., 0.]
        ];
        let dataset = FaceDataset::new(
            records,
            array![0, 1],
            vec!["a".into(), "b".into()],
            (3, 4),
        )
        .unwrap();

        let edged = Canny::params()
            .sigma(1.)
            .check_unwrap()
            .transform_dataset(&dataset)
            .unwrap();

        assert_eq!(edged.nsamples(), 2);
        assert_eq!(edged.nfeatures(), 12);
        assert_eq!(edged.image_shape(), (3, 4));
        assert_eq!(edged.targets(), dataset.targets());
    }
}
