//! Visage prelude.
//!
//! This module contains the most used types, traits and functions that you
//! can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::{Fit, Predict, Transformer};

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::dataset::{load_faces, FaceDataset, Float};

#[doc(no_inline)]
pub use crate::metrics::{ClusterAgreement, ToConfusionMatrix};
