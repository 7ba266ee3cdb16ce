//! K-means clustering
mod algorithm;
mod errors;
mod hyperparams;
mod init;

pub use algorithm::KMeans;
pub use errors::{KMeansError, KMeansParamsError};
pub use hyperparams::{KMeansParams, KMeansValidParams};
pub use init::KMeansInit;
