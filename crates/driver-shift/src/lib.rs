//! Driver shift start/end.
//!
//! Starting a shift records the vehicle's status under the driver role and
//! registers the driver with the GPS tracker; ending a shift removes the driver
//! from the tracker.

mod error;
mod service;
mod shift;
mod tracker;

pub use error::{ShiftError, ShiftResult};
pub use service::ShiftService;
pub use shift::{RouteRecord, WorkShift};
pub use tracker::{DriverTracker, TrackerError};
