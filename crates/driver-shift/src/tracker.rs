use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TrackerError(pub String);

/// The GPS tracker that follows drivers while they are on shift.
pub trait DriverTracker: Send + Sync {
    fn create_driver(&self, driver_id: &str) -> impl Future<Output = Result<(), TrackerError>> + Send;

    fn delete_driver(&self, driver_id: &str) -> impl Future<Output = Result<(), TrackerError>> + Send;
}
