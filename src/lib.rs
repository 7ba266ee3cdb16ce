//! `visage` groups face images by identity without supervision.
//!
//! The crate covers the whole experiment pipeline around a labeled face
//! archive: loading the archive into flattened pixel features, optional
//! edge-detection preprocessing, train/test splitting, clustering with
//! K-means or agglomerative clustering, and the evaluation step that turns
//! raw cluster assignments into agreement scores and per-cluster image
//! galleries.
//!
//! Data flows strictly forward through the stages; every run starts from a
//! fresh dataset and nothing is persisted besides the rendered galleries.
//!
//! ```no_run
//! use visage::prelude::*;
//! use visage::kmeans::KMeans;
//! use visage::metrics::ClusterAgreement;
//! use ndarray_rand::rand::SeedableRng;
//! use rand_isaac::Isaac64Rng;
//!
//! # fn main() -> visage::Result<()> {
//! let mut rng = Isaac64Rng::seed_from_u64(42);
//! let faces = load_faces("data/faces", 70)?;
//! let k = faces.n_classes();
//!
//! let (train, test) = faces.shuffle(&mut rng).split_with_ratio(0.75);
//!
//! let model = KMeans::params_with_rng(k, rng).n_runs(30).fit(train.records())?;
//! let predicted = model.predict(test.records());
//!
//! let report = predicted.agreement(test.targets())?;
//! println!("homogeneity: {}", report.homogeneity);
//! # Ok(())
//! # }
//! ```

pub mod agglomerative;
pub mod dataset;
pub mod error;
pub mod gallery;
pub mod kmeans;
mod metrics_classification;
mod metrics_clustering;
pub mod param_guard;
pub mod prelude;
pub mod preprocessing;
pub mod traits;

pub use dataset::{load_faces, FaceDataset, Float};
pub use error::{Error, Result};

/// Agreement and per-class metrics for clustering runs
pub mod metrics {
    pub use crate::metrics_classification::{ConfusionMatrix, ToConfusionMatrix};
    pub use crate::metrics_clustering::{group_by_cluster, ClusterAgreement, ClusterReport};
}
