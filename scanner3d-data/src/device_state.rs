#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Last known physical configuration of the scanner rig.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    /// Turntable rotation in degrees, wrapped into `[0, 360)`.
    pub base_rotation: f64,
    /// Sensor carriage position in raw device units.
    pub sensor_height: f64,
    /// Last raw distance reading.
    pub distance: i32,
    pub connected: bool,
    pub scanning: bool,
    pub emergency_stop: bool,
}

impl DeviceState {
    pub fn new() -> DeviceState {
        DeviceState::default()
    }

    /// Records a position report. `base_rotation` is wrapped into `[0, 360)`.
    pub fn update_position(&mut self, base_rotation: f64, sensor_height: f64, distance: i32) {
        self.base_rotation = base_rotation.rem_euclid(360.);
        self.sensor_height = sensor_height;
        self.distance = distance;
    }

    /// Leaves the scanning and emergency stop modes. Link and position are
    /// kept.
    pub fn reset(&mut self) {
        self.scanning = false;
        self.emergency_stop = false;
    }
}
