#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MIN_LAYERS: u32 = 50;
const MAX_LAYERS: u32 = 500;
const VOLUME_PER_LAYER: f64 = 10.;

/// Bounding volume of a scan. Only used to estimate the number of layers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanVolume {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Default for ScanVolume {
    fn default() -> Self {
        ScanVolume {
            width: 10.,
            height: 10.,
            depth: 10.,
        }
    }
}

impl ScanVolume {
    pub fn new(width: f64, height: f64, depth: f64) -> ScanVolume {
        ScanVolume {
            width,
            height,
            depth,
        }
    }

    /// Estimated layer count, clamped to `[50, 500]`.
    /// The default volume yields 100 layers.
    pub fn estimated_layers(&self) -> u32 {
        let layers = (self.width * self.height * self.depth / VOLUME_PER_LAYER).ceil();
        if layers.is_nan() || layers < MIN_LAYERS as f64 {
            return MIN_LAYERS;
        }
        if layers > MAX_LAYERS as f64 {
            return MAX_LAYERS;
        }
        layers as u32
    }
}
