use crate::error::ShiftResult;
use crate::shift::WorkShift;
use crate::tracker::DriverTracker;
use roledb::{Db, Role, RoleSource, params};
use std::sync::Arc;

const UPDATE_VEHICLE_STATUS: &str = "UPDATE car_isusing SET car_isusing = ? WHERE car_id = ?";

/// Handles shift start and end requests.
pub struct ShiftService<S, T> {
    db: Arc<Db<S>>,
    tracker: T,
}

impl<S: RoleSource, T: DriverTracker> ShiftService<S, T> {
    pub fn new(db: Arc<Db<S>>, tracker: T) -> Self {
        Self { db, tracker }
    }

    /// Record the vehicle status, then start tracking the driver.
    ///
    /// A status update failure leaves the tracker untouched.
    pub async fn start_shift(&self, shift: &WorkShift) -> ShiftResult<()> {
        shift.require_start_fields()?;

        let updated = self
            .db
            .execute(
                &Role::DRIVER,
                UPDATE_VEHICLE_STATUS,
                &params![shift.car_isusing.clone(), shift.car_id.clone()],
            )
            .await?;
        if updated == 0 {
            tracing::warn!(car_id = %shift.car_id, "no vehicle status row updated");
        }

        self.tracker.create_driver(&shift.driver_id).await?;
        tracing::info!(
            driver_id = %shift.driver_id,
            car_id = %shift.car_id,
            route_id = shift.route_id,
            "shift started"
        );
        Ok(())
    }

    /// Stop tracking the driver. The vehicle status is left as is.
    pub async fn end_shift(&self, shift: &WorkShift) -> ShiftResult<()> {
        shift.require_end_fields()?;
        self.tracker.delete_driver(&shift.driver_id).await?;
        tracing::info!(
            driver_id = %shift.driver_id,
            car_id = %shift.car_id,
            "shift ended"
        );
        Ok(())
    }
}
