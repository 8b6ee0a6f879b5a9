// pothole_core/src/sensors/mod.rs

//! Sensor ingestion: one channel per source, each publishing only its latest
//! value into a single-slot cell.

mod cell;
mod location;
mod motion;

pub use cell::LatestCell;
pub use location::LocationChannel;
pub use motion::{AccelUnit, MotionChannel};
