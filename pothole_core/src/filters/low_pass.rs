// pothole_core/src/filters/low_pass.rs

use super::validate_coefficient;
use crate::error::CoreError;
use crate::messages::{FilteredAxisSample, RawAxisSample};
use crate::types::Axis3;
use num_traits::Float;

/// A single-axis exponential smoothing filter.
///
/// `output = last + alpha * (input - last)`, with `last` starting at zero.
/// An `alpha` near 0 smooths heavily; near 1 it is almost a passthrough.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialFilter<T: Float> {
    alpha: T,
    last_output: T,
}

impl<T: Float> ExponentialFilter<T> {
    pub fn new(alpha: T) -> Result<Self, CoreError> {
        Ok(Self {
            alpha: validate_coefficient(alpha)?,
            last_output: T::zero(),
        })
    }

    pub fn update(&mut self, input: T) -> T {
        self.last_output = self.last_output + self.alpha * (input - self.last_output);
        self.last_output
    }

    /// Changes the coefficient. On error neither the coefficient nor the
    /// carried state is touched.
    pub fn set_coefficient(&mut self, alpha: T) -> Result<(), CoreError> {
        self.alpha = validate_coefficient(alpha)?;
        Ok(())
    }

    pub fn coefficient(&self) -> T {
        self.alpha
    }

    pub fn last_output(&self) -> T {
        self.last_output
    }

    pub fn reset(&mut self) {
        self.last_output = T::zero();
    }
}

/// Three independent exponential filters sharing one coefficient, one per axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisFilter {
    axes: [ExponentialFilter<f32>; 3],
}

impl AxisFilter {
    pub fn new(alpha: f32) -> Result<Self, CoreError> {
        let axis = ExponentialFilter::new(alpha)?;
        Ok(Self { axes: [axis; 3] })
    }

    /// Filters a raw reading, keeping the raw timestamp.
    pub fn update(&mut self, raw: &RawAxisSample) -> FilteredAxisSample {
        let values = Axis3::new(
            self.axes[0].update(raw.values.x),
            self.axes[1].update(raw.values.y),
            self.axes[2].update(raw.values.z),
        );
        FilteredAxisSample {
            values,
            timestamp_ns: raw.timestamp_ns,
        }
    }

    pub fn set_coefficient(&mut self, alpha: f32) -> Result<(), CoreError> {
        validate_coefficient(alpha)?;
        for axis in &mut self.axes {
            axis.set_coefficient(alpha)?;
        }
        Ok(())
    }

    pub fn coefficient(&self) -> f32 {
        self.axes[0].coefficient()
    }

    pub fn state(&self) -> Axis3 {
        Axis3::new(
            self.axes[0].last_output(),
            self.axes[1].last_output(),
            self.axes[2].last_output(),
        )
    }

    pub fn reset(&mut self) {
        for axis in &mut self.axes {
            axis.reset();
        }
    }
}
