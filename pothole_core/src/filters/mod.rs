// pothole_core/src/filters/mod.rs

//! Per-axis signal smoothing applied to motion sensor streams before they
//! are synchronized.

use crate::error::CoreError;
use num_traits::Float;

/// Filter coefficient used by the motion channels unless configured otherwise.
/// Higher values mean less smoothing.
pub const DEFAULT_FILTER_COEFFICIENT: f32 = 0.8;

/// Checks that a filter coefficient lies within [0, 1]. NaN is rejected.
pub fn validate_coefficient<T: Float>(alpha: T) -> Result<T, CoreError> {
    if alpha >= T::zero() && alpha <= T::one() {
        Ok(alpha)
    } else {
        Err(CoreError::invalid(
            "alpha",
            format!(
                "filter coefficient must be between 0 and 1, got {}",
                alpha.to_f64().unwrap_or(f64::NAN)
            ),
        ))
    }
}

mod low_pass;

pub use low_pass::{AxisFilter, ExponentialFilter};
