use crate::mesh::{reconstruct, Mesh};
use crate::scan::{ScanPoint, ScanSample, ScanSlice};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slices of one scan session, kept in ascending height order.
///
/// A `Model` has a single owner. Consumers that need the data for rendering
/// or export take a [`Model::snapshot`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    slices: Vec<ScanSlice>,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn slices(&self) -> &[ScanSlice] {
        &self.slices
    }

    /// Appends `point` to the slice at exactly `height`, creating the slice
    /// if there is none.
    pub fn add_point(&mut self, point: ScanPoint, height: f64) {
        match self.slices.iter_mut().find(|s| s.height == height) {
            Some(slice) => slice.points.push(point),
            None => self.insert_sorted(ScanSlice::new(height, vec![point])),
        }
    }

    /// Appends drained samples in order.
    pub fn extend<I: IntoIterator<Item = ScanSample>>(&mut self, samples: I) {
        for sample in samples {
            self.add_point(sample.point, sample.height);
        }
    }

    /// Inserts `slice`, replacing any slice at the same height.
    pub fn add_slice(&mut self, slice: ScanSlice) {
        self.slices.retain(|s| s.height != slice.height);
        self.insert_sorted(slice);
    }

    /// Replaces the slice at `original_height` with `slice`, which may carry
    /// a different height.
    pub fn update_slice(&mut self, original_height: f64, slice: ScanSlice) {
        self.slices.retain(|s| s.height != original_height);
        self.insert_sorted(slice);
    }

    pub fn remove_slice(&mut self, height: f64) {
        self.slices.retain(|s| s.height != height);
    }

    pub fn clear(&mut self) {
        self.slices.clear();
    }

    pub fn snapshot(&self) -> Vec<ScanSlice> {
        self.slices.clone()
    }

    /// True when at least one slice holds a point.
    pub fn has_data(&self) -> bool {
        self.slices.iter().any(|s| !s.is_empty())
    }

    pub fn total_points(&self) -> usize {
        self.slices.iter().map(|s| s.points.len()).sum()
    }

    pub fn reconstruct(&self) -> Mesh {
        reconstruct(&self.slices)
    }

    fn insert_sorted(&mut self, slice: ScanSlice) {
        let index = self.slices.partition_point(|s| s.height <= slice.height);
        self.slices.insert(index, slice);
    }
}

impl From<Vec<ScanSlice>> for Model {
    fn from(slices: Vec<ScanSlice>) -> Self {
        let mut model = Model::new();
        for slice in slices {
            model.add_slice(slice);
        }
        model
    }
}
