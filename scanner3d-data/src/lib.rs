//! Data model and surface reconstruction for a rotary 3D scanner.
//!
//! Scan data is cylindrical: each [`ScanPoint`] is a radius and an angle
//! around the vertical axis, grouped into [`ScanSlice`]s by height. A
//! [`Model`] accumulates slices and [`reconstruct`] turns them into a
//! closed triangle [`Mesh`].

pub mod device_state;
pub mod hull;
pub mod mesh;
pub mod model;
pub mod scan;
pub mod volume;

pub use device_state::DeviceState;
pub use hull::{compute_slice_convex_hull, convex_hull_indices};
pub use mesh::{reconstruct, Mesh};
pub use model::Model;
pub use scan::{ScanPoint, ScanSample, ScanSlice};
pub use volume::ScanVolume;
