//! Traits at the seams between pipeline stages
//!
//! Clustering algorithms either learn a model from a set of observations
//! ([`Fit`]) which can then assign unseen observations to clusters
//! ([`Predict`]), or map a collection directly to an output in a single pass
//! ([`Transformer`]).

/// Transform a collection into another representation without learning from
/// it, e.g. edge detection or clustering algorithms without an out-of-sample
/// extension.
pub trait Transformer<R, T> {
    fn transform(&self, x: R) -> T;
}

/// Fit a model to a set of observations.
pub trait Fit<R, E: std::error::Error> {
    type Object;

    fn fit(&self, records: &R) -> std::result::Result<Self::Object, E>;
}

/// Assign observations to clusters with a fitted model.
pub trait Predict<R, T> {
    fn predict(&self, records: R) -> T;
}
