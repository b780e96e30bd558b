#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One distance reading in cylindrical scan space.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanPoint {
    /// Distance from the turntable axis.
    pub radius: f64,
    /// Angle around the vertical axis in degrees.
    pub angle: f64,
}

impl ScanPoint {
    pub fn new(radius: f64, angle: f64) -> ScanPoint {
        ScanPoint { radius, angle }
    }

    /// Cartesian position of this point on a slice at `height`.
    /// The vertical axis is `y`.
    pub fn to_cartesian(&self, height: f64) -> [f64; 3] {
        let angle_radian = degree_to_radian(self.angle);
        [
            self.radius * angle_radian.cos(),
            height,
            self.radius * angle_radian.sin(),
        ]
    }
}

/// A point tagged with the height of the slice it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanSample {
    pub height: f64,
    pub point: ScanPoint,
}

/// All points captured at one height.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanSlice {
    pub height: f64,
    pub points: Vec<ScanPoint>,
}

impl ScanSlice {
    pub fn new(height: f64, points: Vec<ScanPoint>) -> ScanSlice {
        ScanSlice { height, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub(crate) fn degree_to_radian(degree: f64) -> f64 {
    degree * std::f64::consts::PI / 180.
}
