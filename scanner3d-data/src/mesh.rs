//! Surface reconstruction from height-indexed slices.
//!
//! Every point becomes one vertex. The bottom and top slices are closed with
//! a fan over their convex hull, and each pair of adjacent slices is joined
//! by a band of triangles between their hulls. Slices without points are
//! skipped: they contribute no vertices and the band is built between the
//! nearest slices that do have points.

use crate::hull::convex_hull_indices;
use crate::scan::ScanSlice;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Indexed triangle mesh. `indices` holds three vertex indices per triangle.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub indices: Vec<usize>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Location of one slice in the flattened vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SliceSpan {
    start: usize,
    count: usize,
}

/// Builds a closed triangle mesh from `slices`.
///
/// Slices are processed in ascending height regardless of input order;
/// slices sharing a height keep their input order.
pub fn reconstruct(slices: &[ScanSlice]) -> Mesh {
    let mut ordered: Vec<&ScanSlice> = slices.iter().filter(|s| !s.is_empty()).collect();
    ordered.sort_by(|a, b| a.height.total_cmp(&b.height));

    let mut mesh = Mesh::default();
    let mut hulls: Vec<Vec<usize>> = Vec::with_capacity(ordered.len());
    for slice in &ordered {
        let span = SliceSpan {
            start: mesh.vertices.len(),
            count: slice.points.len(),
        };
        mesh.vertices
            .extend(slice.points.iter().map(|p| p.to_cartesian(slice.height)));
        let local = convex_hull_indices(&mesh.vertices[span.start..span.start + span.count]);
        hulls.push(local.into_iter().map(|i| span.start + i).collect());
    }

    if let Some(bottom) = hulls.first() {
        mesh.indices.extend(cap(bottom, true));
    }
    if hulls.len() > 1 {
        if let Some(top) = hulls.last() {
            mesh.indices.extend(cap(top, false));
        }
    }

    for pair in hulls.windows(2) {
        mesh.indices.extend(bridge(&pair[0], &pair[1]));
    }
    mesh
}

/// Fan triangulation of a hull from its first vertex.
/// The bottom cap uses reversed winding so both caps face outward.
fn cap(hull: &[usize], bottom: bool) -> Vec<usize> {
    if hull.len() < 3 {
        return Vec::new();
    }
    let mut indices = Vec::with_capacity((hull.len() - 2) * 3);
    for i in 1..hull.len() - 1 {
        if bottom {
            indices.extend([hull[0], hull[i + 1], hull[i]]);
        } else {
            indices.extend([hull[0], hull[i], hull[i + 1]]);
        }
    }
    indices
}

/// Side triangles joining the hull of one slice to the hull of the next.
fn bridge(lower: &[usize], upper: &[usize]) -> Vec<usize> {
    let (n1, n2) = (lower.len(), upper.len());
    let mut indices = Vec::new();

    if n1 == 1 && n2 > 1 {
        let apex = lower[0];
        for i in 0..n2 {
            indices.extend([apex, upper[i], upper[(i + 1) % n2]]);
        }
    } else if n1 > 1 && n2 == 1 {
        let apex = upper[0];
        for i in 0..n1 {
            indices.extend([lower[i], apex, lower[(i + 1) % n1]]);
        }
    } else if n1 == n2 && n1 > 1 {
        for i in 0..n1 {
            let next = (i + 1) % n1;
            indices.extend(quad(lower[i], lower[next], upper[i], upper[next]));
        }
    } else if n1 > 1 && n2 > 1 {
        // Proportional walk; not a minimal-area triangulation.
        let steps = n1.max(n2);
        for i in 0..steps {
            let idx1 = i * n1 / steps;
            let idx2 = i * n2 / steps;
            indices.extend(quad(
                lower[idx1],
                lower[(idx1 + 1) % n1],
                upper[idx2],
                upper[(idx2 + 1) % n2],
            ));
        }
    }
    indices
}

fn quad(a: usize, b: usize, c: usize, d: usize) -> [usize; 6] {
    [a, c, b, b, c, d]
}
