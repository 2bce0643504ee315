use crate::error::{ShiftError, ShiftResult};
use serde::{Deserialize, Serialize};

/// Shift request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkShift {
    pub driver_id: String,
    /// Plate number.
    pub car_id: String,
    /// Vehicle status to record, e.g. `"In Use"`.
    pub car_isusing: String,
    pub route_id: i64,
    #[serde(rename = "work_stime")]
    pub shift_start: String,
    #[serde(rename = "work_etime")]
    pub shift_end: String,
    /// Driver feedback.
    pub remark: String,
    pub record_route: Vec<RouteRecord>,
}

/// One GPS sample along the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRecord {
    pub time: String,
    pub gps_x: i64,
    pub gps_y: i64,
}

impl WorkShift {
    pub fn from_json(body: &[u8]) -> ShiftResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub(crate) fn require_start_fields(&self) -> ShiftResult<()> {
        let mut missing = self.missing_identity();
        if self.route_id == 0 {
            missing.push("route_id");
        }
        if self.car_isusing.is_empty() {
            missing.push("car_isusing");
        }
        check(missing)
    }

    pub(crate) fn require_end_fields(&self) -> ShiftResult<()> {
        check(self.missing_identity())
    }

    fn missing_identity(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.driver_id.is_empty() {
            missing.push("driver_id");
        }
        if self.car_id.is_empty() {
            missing.push("car_id");
        }
        missing
    }
}

fn check(missing: Vec<&'static str>) -> ShiftResult<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ShiftError::MissingFields(missing))
    }
}
