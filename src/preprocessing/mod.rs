//! Image preprocessing transforms
mod canny;

pub use canny::{Canny, CannyParams, CannyParamsError, CannyValidParams};
