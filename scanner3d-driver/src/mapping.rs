//! Conversion from raw rig units to scan space.

use crate::config::RigConfig;
use crate::protocol::Position;
use scanner3d_data::{ScanPoint, ScanSample};

/// Maps raw firmware positions onto scan space. Swap the implementation to
/// support a differently built rig.
pub trait RigMapping: Send {
    /// Turntable rotation in degrees for a raw `base` value.
    fn base_degrees(&self, base: i32) -> f64;

    /// Scan sample for a position report, or `None` when the sensor is
    /// outside the usable range.
    fn sample(&self, position: &Position) -> Option<ScanSample>;
}

/// Stepper turntable with a linear sensor carriage.
///
/// `angle = base * degrees_per_step`, `height = height / height_divisor`,
/// `radius = (travel_limit - distance) / radius_divisor`. Readings above
/// `travel_limit` are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct TurntableRig {
    config: RigConfig,
}

impl TurntableRig {
    pub fn new(config: RigConfig) -> TurntableRig {
        TurntableRig { config }
    }
}

impl Default for TurntableRig {
    fn default() -> Self {
        TurntableRig::new(RigConfig::default())
    }
}

impl RigMapping for TurntableRig {
    fn base_degrees(&self, base: i32) -> f64 {
        base as f64 * self.config.degrees_per_step
    }

    fn sample(&self, position: &Position) -> Option<ScanSample> {
        if position.height > self.config.travel_limit {
            return None;
        }
        // any i32 is a well-formed reading, so stay out of integer arithmetic
        let radius = (self.config.travel_limit as f64 - position.distance as f64)
            / self.config.radius_divisor;
        Some(ScanSample {
            height: position.height as f64 / self.config.height_divisor,
            point: ScanPoint::new(radius, self.base_degrees(position.base)),
        })
    }
}
