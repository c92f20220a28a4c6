// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Triangle clipping
//!
//! A triangle cut by a single plane leaves zero, one or two triangles:
//!
//! ```text
//! inside  result  vertices
//! 0       Zero    -
//! 3       One     v0 v1 v2                     (verbatim copy)
//! 1       One     in, X(in->next), X(in->prev)
//! 2       Two     in0, in1, X(in0->out), X(in1->out)
//!                 triangles (0, 1, 2) and (1, 3, 2)
//! ```
//!
//! `X(a->b)` is the intersection with the plane, interpolated from the inside
//! vertex `a` toward the outside vertex `b`. Both output triangles keep the
//! winding of the source triangle, and the two triangles of a `Two` result
//! share the `in1 - X(in0->out)` diagonal so together they cover the clipped
//! quadrilateral exactly.

use super::lerp_into;
use super::plane::PlaneEquation;
use crate::core::buffer::{VertexBuffer, POSITION_FLOATS};

/// Vertex indices of the first triangle of a pair
pub const FIRST_TRIANGLE: [usize; 3] = [0, 1, 2];

/// Vertex indices of the second triangle of a [`PairKind::Two`] pair
pub const SECOND_TRIANGLE: [usize; 3] = [1, 3, 2];

/// Number of triangles left after a single-plane cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    Zero,
    One,
    Two,
}

/// Result of cutting one triangle against one plane
///
/// Owns its vertex records: three for [`PairKind::One`], four shared
/// vertices for [`PairKind::Two`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrianglePair {
    kind: PairKind,
    floats: usize,
    vertices: Vec<f32>,
}

impl TrianglePair {
    fn zero(floats: usize) -> Self {
        Self {
            kind: PairKind::Zero,
            floats,
            vertices: Vec::new(),
        }
    }

    pub fn kind(&self) -> PairKind {
        self.kind
    }

    /// Number of triangles held (0, 1 or 2)
    pub fn triangle_count(&self) -> usize {
        match self.kind {
            PairKind::Zero => 0,
            PairKind::One => 1,
            PairKind::Two => 2,
        }
    }

    /// Number of vertex records held (0, 3 or 4)
    pub fn vertex_count(&self) -> usize {
        match self.kind {
            PairKind::Zero => 0,
            PairKind::One => 3,
            PairKind::Two => 4,
        }
    }

    /// Floats per vertex record
    pub fn floats_per_vertex(&self) -> usize {
        self.floats
    }

    /// Vertex record `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is not valid for the pair's kind (above 2 for `One`,
    /// above 3 for `Two`, any index for `Zero`).
    pub fn vertex(&self, index: usize) -> &[f32] {
        assert!(
            index < self.vertex_count(),
            "vertex {index} accessed on a {:?} triangle pair",
            self.kind
        );
        &self.vertices[index * self.floats..(index + 1) * self.floats]
    }

    /// Triangle `n` as three vertex records
    ///
    /// # Panics
    ///
    /// Panics if `n >= triangle_count()`.
    pub fn triangle(&self, n: usize) -> [&[f32]; 3] {
        assert!(
            n < self.triangle_count(),
            "triangle {n} accessed on a {:?} triangle pair",
            self.kind
        );
        let corners = if n == 0 { FIRST_TRIANGLE } else { SECOND_TRIANGLE };
        corners.map(|i| self.vertex(i))
    }

    /// All triangles held by the pair
    pub fn triangles(&self) -> impl Iterator<Item = [&[f32]; 3]> + '_ {
        (0..self.triangle_count()).map(|n| self.triangle(n))
    }
}

/// Append the plane intersection of `inside -> outside` to `out`
fn push_intersection(out: &mut Vec<f32>, plane: &PlaneEquation, inside: &[f32], outside: &[f32]) {
    let t = plane.intersection(inside, outside);
    let start = out.len();
    lerp_into(out, inside, outside, t);
    plane.snap(&mut out[start..]);
}

/// Cut one triangle against one plane
///
/// # Panics
///
/// Panics if the three records differ in length or are shorter than a
/// homogeneous position.
///
/// # Examples
///
/// ```
/// use softpipe::core::clip::{cut_triangle, PairKind, PlaneEquation};
///
/// let v0 = [0.0, 0.0, 0.0, 1.0];
/// let v1 = [3.0, 0.0, 0.0, 1.0];
/// let v2 = [0.0, 0.5, 0.0, 1.0];
///
/// // v1 is right of x = w: the remaining quadrilateral becomes two triangles
/// let pair = cut_triangle(&PlaneEquation::right(), [&v0, &v1, &v2]);
/// assert_eq!(pair.kind(), PairKind::Two);
/// assert_eq!(pair.vertex(0), &v2);
/// assert_eq!(pair.vertex(1), &v0);
/// ```
pub fn cut_triangle(plane: &PlaneEquation, triangle: [&[f32]; 3]) -> TrianglePair {
    let floats = triangle[0].len();
    assert!(
        triangle.iter().all(|v| v.len() == floats),
        "triangle vertices have different sizes"
    );
    assert!(floats >= POSITION_FLOATS, "vertex record shorter than a position");

    let distance = triangle.map(|v| plane.eval(v));
    let inside = distance.map(|d| d > 0.0);
    let inside_count = inside.iter().filter(|&&i| i).count();
    let on_plane = distance.iter().filter(|&&d| d == 0.0).count();

    // Vertices lying exactly on the plane need no cut once anything is inside
    let whole = inside_count > 0 && inside_count + on_plane == 3;

    match inside_count {
        0 => TrianglePair::zero(floats),
        _ if whole => {
            let mut vertices = Vec::with_capacity(3 * floats);
            for v in triangle {
                vertices.extend_from_slice(v);
            }
            TrianglePair {
                kind: PairKind::One,
                floats,
                vertices,
            }
        }
        1 => {
            let i = inside.iter().position(|&b| b).unwrap_or(0);
            let a = triangle[i];
            let next = triangle[(i + 1) % 3];
            let prev = triangle[(i + 2) % 3];

            let mut vertices = Vec::with_capacity(3 * floats);
            vertices.extend_from_slice(a);
            push_intersection(&mut vertices, plane, a, next);
            push_intersection(&mut vertices, plane, a, prev);
            TrianglePair {
                kind: PairKind::One,
                floats,
                vertices,
            }
        }
        _ => {
            let o = inside.iter().position(|&b| !b).unwrap_or(0);
            let outside = triangle[o];
            let a = triangle[(o + 1) % 3];
            let b = triangle[(o + 2) % 3];

            let mut vertices = Vec::with_capacity(4 * floats);
            vertices.extend_from_slice(a);
            vertices.extend_from_slice(b);
            push_intersection(&mut vertices, plane, a, outside);
            push_intersection(&mut vertices, plane, b, outside);
            TrianglePair {
                kind: PairKind::Two,
                floats,
                vertices,
            }
        }
    }
}

/// Clip one triangle against an ordered list of planes
///
/// Appends every surviving triangle (three records each) to `out` and
/// returns how many were appended. A `Two` cut clips both halves against
/// the remaining planes independently. Plane order changes how the clipped
/// polygon is split into triangles, never the covered region.
pub fn clip_triangle(triangle: [&[f32]; 3], planes: &[PlaneEquation], out: &mut Vec<f32>) -> usize {
    let Some((plane, rest)) = planes.split_first() else {
        for v in triangle {
            out.extend_from_slice(v);
        }
        return 1;
    };

    let pair = cut_triangle(plane, triangle);
    pair.triangles()
        .map(|tri| clip_triangle(tri, rest, out))
        .sum()
}

/// Clip an indexed triangle list against an ordered list of planes
///
/// Returns a new vertex buffer with three records per surviving triangle
/// and the matching sequential index list.
///
/// # Panics
///
/// Panics if an index is out of range or the index count is not a multiple
/// of 3; the pipeline validates both before clipping.
pub fn clip_triangle_list(
    indices: &[u32],
    vertices: &VertexBuffer,
    stride: usize,
    planes: &[PlaneEquation],
) -> (VertexBuffer, Vec<u32>) {
    assert!(indices.len() % 3 == 0, "triangle list index count is not a multiple of 3");

    let mut out = Vec::with_capacity(indices.len() * stride / 4);
    let mut produced = 0;
    for tri in indices.chunks_exact(3) {
        let corners = [
            vertices.element(tri[0] as usize, stride),
            vertices.element(tri[1] as usize, stride),
            vertices.element(tri[2] as usize, stride),
        ];
        produced += clip_triangle(corners, planes, &mut out);
    }

    log::trace!(
        "Triangle clipper: {} triangles in, {} triangles out",
        indices.len() / 3,
        produced
    );
    let count = (produced * 3) as u32;
    (VertexBuffer::from_floats(out), (0..count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clip::plane::{Axis, DepthRange, Keep};

    const V0: [f32; 5] = [0.0, 0.0, 0.0, 1.0, 10.0];
    const V1: [f32; 5] = [3.0, 0.0, 0.0, 1.0, 40.0];
    const V2: [f32; 5] = [0.0, 0.5, 0.0, 1.0, 20.0];

    #[test]
    fn test_all_inside_is_verbatim() {
        let pair = cut_triangle(&PlaneEquation::left(), [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::One);
        assert_eq!(pair.triangle(0), [&V0[..], &V1[..], &V2[..]]);
    }

    #[test]
    fn test_all_outside_is_zero() {
        let pair = cut_triangle(&PlaneEquation::left().inverted(), [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::Zero);
        assert_eq!(pair.triangle_count(), 0);

        let far_right = PlaneEquation::box_face(Axis::X, 10.0, Keep::Positive);
        let pair = cut_triangle(&far_right, [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::Zero);
    }

    #[test]
    fn test_one_inside_keeps_rotation_order() {
        // Only V1 (x = 3) is right of x = 2
        let plane = PlaneEquation::box_face(Axis::X, 2.0, Keep::Positive);
        let pair = cut_triangle(&plane, [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::One);
        assert_eq!(pair.vertex(0), &V1);

        // Edge V1 -> V2 first, then V1 -> V0
        let x_next = pair.vertex(1);
        let x_prev = pair.vertex(2);
        assert_eq!(x_next[0], 2.0);
        assert!(x_next[1] > 0.0);
        assert_eq!(x_prev[0], 2.0);
        assert_eq!(x_prev[1], 0.0);
        assert!((x_prev[4] - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_two_inside_shares_fixed_indices() {
        let pair = cut_triangle(&PlaneEquation::right(), [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::Two);

        // Inside vertices follow the outside one in rotation order
        assert_eq!(pair.vertex(0), &V2);
        assert_eq!(pair.vertex(1), &V0);

        // Index 2 lies on V2 -> V1, index 3 on V0 -> V1
        let x2 = pair.vertex(2);
        let x3 = pair.vertex(3);
        assert_eq!(x2[0], x2[3]);
        assert_eq!(x3[0], x3[3]);
        assert!(x2[1] > 0.0);
        assert_eq!(x3[1], 0.0);
        assert!((x3[4] - 20.0).abs() < 1e-4);

        let second = pair.triangle(1);
        assert_eq!(second, [pair.vertex(1), pair.vertex(3), pair.vertex(2)]);
    }

    #[test]
    fn test_vertices_on_plane_need_no_cut() {
        // V0 and V2 lie on x = 0
        let plane = PlaneEquation::box_face(Axis::X, 0.0, Keep::Positive);
        let pair = cut_triangle(&plane, [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::One);
        assert_eq!(pair.triangle(0), [&V0[..], &V1[..], &V2[..]]);

        // Nothing is strictly inside the complement
        let pair = cut_triangle(&plane.inverted(), [&V0, &V1, &V2]);
        assert_eq!(pair.kind(), PairKind::Zero);
    }

    #[test]
    #[should_panic]
    fn test_one_pair_rejects_fourth_vertex() {
        let pair = cut_triangle(&PlaneEquation::left(), [&V0, &V1, &V2]);
        let _ = pair.vertex(3);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_vertex_sizes_panic() {
        let short = [0.0, 0.0, 0.0, 1.0];
        let _ = cut_triangle(&PlaneEquation::left(), [&V0, &V1, &short]);
    }

    #[test]
    fn test_clip_triangle_against_frustum() {
        let planes = PlaneEquation::frustum(DepthRange::NegativeOneToOne);
        let mut out = Vec::new();
        let count = clip_triangle([&V0, &V1, &V2], &planes, &mut out);
        assert!(count >= 1);
        assert_eq!(out.len(), count * 3 * 5);
        for v in out.chunks_exact(5) {
            assert!(v[0] <= v[3] && v[0] >= -v[3]);
        }

        let behind = [0.0, 0.0, 0.0, -1.0, 0.0];
        let mut out = Vec::new();
        assert_eq!(clip_triangle([&behind, &behind, &behind], &planes, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_clip_triangle_list_indices() {
        let mut floats = Vec::new();
        floats.extend_from_slice(&V0[..4]);
        floats.extend_from_slice(&V1[..4]);
        floats.extend_from_slice(&V2[..4]);
        let vertices = VertexBuffer::from_floats(floats);

        let planes = [PlaneEquation::right()];
        let (buffer, indices) = clip_triangle_list(&[0, 1, 2, 2, 1, 0], &vertices, 16, &planes);
        assert_eq!(indices, (0..12).collect::<Vec<u32>>());
        assert_eq!(buffer.record_count(16), 12);
    }
}
