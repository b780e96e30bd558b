//! Convex hull of a slice projected onto the horizontal (X-Z) plane.
//!
//! Graham scan: the pivot is the point with the smallest `z` (smallest `x`
//! on ties), the remaining points are swept in order of polar angle around
//! it and the top of the stack is popped while the last three points do not
//! make a strict left turn. The hull is returned counter-clockwise, starting
//! at the pivot.

use crate::scan::{ScanPoint, ScanSlice};
use std::cmp::Ordering;

/// Indices into `vertices` forming their convex hull in the X-Z plane.
///
/// Fewer than three vertices have no hull; their indices are returned
/// unchanged.
pub fn convex_hull_indices(vertices: &[[f64; 3]]) -> Vec<usize> {
    if vertices.len() < 3 {
        return (0..vertices.len()).collect();
    }

    let pivot = match (0..vertices.len()).min_by(|&a, &b| lowest_first(vertices[a], vertices[b])) {
        Some(i) => i,
        None => return Vec::new(),
    };
    let origin = vertices[pivot];

    let mut rest: Vec<usize> = (0..vertices.len()).filter(|&i| i != pivot).collect();
    rest.sort_by(|&a, &b| {
        polar_angle(origin, vertices[a])
            .total_cmp(&polar_angle(origin, vertices[b]))
            .then_with(|| distance_squared(origin, vertices[a]).total_cmp(&distance_squared(origin, vertices[b])))
    });

    let mut hull = vec![pivot];
    for i in rest {
        while hull.len() >= 2 {
            let top = hull[hull.len() - 1];
            let below = hull[hull.len() - 2];
            if cross(vertices[below], vertices[top], vertices[i]) > 0. {
                break;
            }
            hull.pop();
        }
        hull.push(i);
    }
    hull
}

/// Hull points of `slice`, counter-clockwise when viewed from above the
/// X-Z plane. Slices with fewer than three points are returned unchanged.
pub fn compute_slice_convex_hull(slice: &ScanSlice) -> Vec<ScanPoint> {
    let vertices: Vec<[f64; 3]> = slice
        .points
        .iter()
        .map(|p| p.to_cartesian(slice.height))
        .collect();
    convex_hull_indices(&vertices)
        .into_iter()
        .map(|i| slice.points[i])
        .collect()
}

/// Z component of `(b - a) x (c - a)` in the X-Z plane.
/// Positive when `a -> b -> c` turns left.
pub(crate) fn cross(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    (b[0] - a[0]) * (c[2] - a[2]) - (b[2] - a[2]) * (c[0] - a[0])
}

fn lowest_first(a: [f64; 3], b: [f64; 3]) -> Ordering {
    a[2].total_cmp(&b[2]).then_with(|| a[0].total_cmp(&b[0]))
}

fn polar_angle(origin: [f64; 3], p: [f64; 3]) -> f64 {
    f64::atan2(p[2] - origin[2], p[0] - origin[0])
}

fn distance_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dz = b[2] - a[2];
    dx * dx + dz * dz
}
