//! Error types in visage
//!

use thiserror::Error;

use crate::kmeans::KMeansError;
use crate::preprocessing::CannyParamsError;
use ndarray::ShapeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Two collections which must be aligned by position disagree in length.
    #[error("shape mismatch: expected {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// An image does not share the dimensions of the rest of the dataset.
    #[error("image dimensions {actual:?} do not match dataset dimensions {expected:?}")]
    ImageShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A replacement feature matrix does not match the dataset's dimensions.
    #[error("records of shape {actual:?} cannot replace records of shape {expected:?}")]
    RecordsShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A cluster assignment references an id outside `[0, n_clusters)`.
    #[error("cluster id {id} out of range for {n_clusters} clusters")]
    InvalidClusterId { id: usize, n_clusters: usize },
    #[error("invalid parameter: {0}")]
    Parameters(String),
    #[error("no samples survived loading")]
    EmptyDataset,
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    KMeans(#[from] KMeansError),
    #[error(transparent)]
    CannyParams(#[from] CannyParamsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
