use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("tolerance must be greater than 0")]
    Tolerance,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// An error when fitting the K-means algorithm
#[derive(Error, Debug)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When there are fewer observations than requested centroids
    #[error("not enough samples: {n_samples} observations for {n_clusters} clusters")]
    NotEnoughSamples { n_samples: usize, n_clusters: usize },
    /// When no restart converges within the iteration cap
    #[error("fitting failed: did not converge, try different init parameters or check for degenerate data")]
    NotConverged,
}
