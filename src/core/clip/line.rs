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

//! Line clipping
//!
//! # Liang-Barsky in homogeneous space
//!
//! A segment `P(t) = v1 + t * (v2 - v1)` is inside the frustum where every
//! half-space constraint `p_i * t <= q_i` holds:
//!
//! ```text
//! plane   q                 p
//! left    w1 + x1          -(dw + dx)
//! right   w1 - x1           dx - dw
//! bottom  w1 + y1          -(dw + dy)
//! top     w1 - y1           dy - dw
//! near    w1 + z1 | z1     -(dw + dz) | -dz      (depth range dependent)
//! far     w1 - z1           dz - dw
//! ```
//!
//! Constraints with `p < 0` enter the volume and raise `t0`; constraints
//! with `p > 0` leave it and lower `t1`. A segment lying wholly at negative
//! `w` describes the same projective points as its negation, so the
//! inequalities invert and the entering/leaving classification is flipped.
//!
//! # References
//!
//! - [Liang-Barsky algorithm](https://en.wikipedia.org/wiki/Liang%E2%80%93Barsky_algorithm)
//! - [Blinn & Newell, Clipping using homogeneous coordinates](https://doi.org/10.1145/800248.807398)

use super::plane::{DepthRange, PlaneEquation};
use super::{lerp_into, lerp_vertex};
use crate::core::buffer::{VertexBuffer, POSITION_FLOATS};

/// `|p|` below this means the segment is parallel to the plane
pub const PARALLEL_EPSILON: f32 = 1e-7;

/// Largest drift (relative to `|w|`) the post-clip clamp absorbs silently
pub const CLAMP_TOLERANCE: f32 = 0.01;

/// Visible parameter range `[t0, t1]` of a homogeneous segment
///
/// Returns `None` when no part of the segment is inside the frustum.
///
/// # Examples
///
/// ```
/// use softpipe::core::clip::{liang_barsky, DepthRange};
///
/// // From the centre out through the right plane at x = w
/// let range = liang_barsky(&[0.0, 0.0, 0.0, 1.0], &[2.0, 0.0, 0.0, 1.0], DepthRange::NegativeOneToOne);
/// assert_eq!(range, Some((0.0, 0.5)));
/// ```
pub fn liang_barsky(v1: &[f32], v2: &[f32], depth: DepthRange) -> Option<(f32, f32)> {
    let (x1, y1, z1, w1) = (v1[0], v1[1], v1[2], v1[3]);
    let dx = v2[0] - x1;
    let dy = v2[1] - y1;
    let dz = v2[2] - z1;
    let dw = v2[3] - w1;

    let near = match depth {
        DepthRange::NegativeOneToOne => (-(dw + dz), w1 + z1),
        DepthRange::ZeroToOne => (-dz, z1),
    };
    let constraints = [
        (-(dw + dx), w1 + x1),
        (dx - dw, w1 - x1),
        (-(dw + dy), w1 + y1),
        (dy - dw, w1 - y1),
        near,
        (dz - dw, w1 - z1),
    ];

    // Both endpoints behind the eye: every inequality is reversed
    let flip = w1 < 0.0 && v2[3] < 0.0;

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in constraints {
        if p.abs() < PARALLEL_EPSILON {
            if q * w1 < 0.0 {
                return None;
            }
            continue;
        }

        let t = q / p;
        let entering = if flip { p > 0.0 } else { p < 0.0 };
        if entering {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((t0, t1))
}

/// Clamp the NDC-relevant components of a clipped vertex into `[-|w|, |w|]`
///
/// Only absorbs floating-point drift left by the interpolation; a correctly
/// clipped vertex is never moved by more than [`CLAMP_TOLERANCE`] of `|w|`.
pub fn clamp_to_clip_volume(v: &mut [f32], depth: DepthRange) {
    let w = v[3];
    let (lo, hi) = if w >= 0.0 { (-w, w) } else { (w, -w) };
    let z_range = match depth {
        DepthRange::NegativeOneToOne => (lo, hi),
        DepthRange::ZeroToOne => {
            if w >= 0.0 {
                (0.0, w)
            } else {
                (w, 0.0)
            }
        }
    };
    let ranges = [(lo, hi), (lo, hi), z_range];

    for (component, (lo, hi)) in v.iter_mut().zip(ranges) {
        let clamped = component.clamp(lo, hi);
        let drift = (clamped - *component).abs();
        if drift > CLAMP_TOLERANCE * w.abs().max(1.0) {
            log::warn!(
                "Clip clamp moved component {} -> {} (w={}), beyond drift tolerance",
                component,
                clamped,
                w
            );
        }
        *component = clamped;
    }
}

/// Clip one homogeneous segment against the view frustum
///
/// Appends the two clipped endpoint records to `out` and returns `true`, or
/// leaves `out` untouched and returns `false` if the segment is invisible.
/// The first appended vertex is `lerp(v1, v2, t0)`, the second
/// `lerp(v1, v2, t1)`, where `t = 0` is `v1`.
///
/// # Panics
///
/// Panics if the records differ in length or are shorter than a position.
pub fn clip_line_homogeneous(
    v1: &[f32],
    v2: &[f32],
    depth: DepthRange,
    out: &mut Vec<f32>,
) -> bool {
    assert_eq!(v1.len(), v2.len(), "line endpoints have different vertex sizes");
    assert!(v1.len() >= POSITION_FLOATS, "vertex record shorter than a position");

    let Some((t0, t1)) = liang_barsky(v1, v2, depth) else {
        return false;
    };

    for t in [t0, t1] {
        let start = out.len();
        lerp_into(out, v1, v2, t);
        clamp_to_clip_volume(&mut out[start..], depth);
    }
    true
}

/// Cut a segment against an ordered list of arbitrary planes
///
/// Each plane replaces an outside endpoint with the intersection point,
/// interpolated from the surviving inside endpoint toward the outside one.
/// Appends the two surviving records to `out` and returns `true`, or
/// returns `false` if a plane rejects the whole segment.
///
/// # Panics
///
/// Panics if the records differ in length.
pub fn cut_line(planes: &[PlaneEquation], v1: &[f32], v2: &[f32], out: &mut Vec<f32>) -> bool {
    assert_eq!(v1.len(), v2.len(), "line endpoints have different vertex sizes");

    let mut a = v1.to_vec();
    let mut b = v2.to_vec();
    for plane in planes {
        match (plane.is_inside(&a), plane.is_inside(&b)) {
            (false, false) => return false,
            (true, true) => {}
            (true, false) => {
                let t = plane.intersection(&a, &b);
                b = lerp_vertex(&a, &b, t);
                plane.snap(&mut b);
            }
            (false, true) => {
                let t = plane.intersection(&b, &a);
                a = lerp_vertex(&b, &a, t);
                plane.snap(&mut a);
            }
        }
    }

    out.extend_from_slice(&a);
    out.extend_from_slice(&b);
    true
}

/// Clip an indexed line list against the frustum and any extra planes
///
/// Returns a new vertex buffer holding two records per surviving line and
/// the matching sequential index list. Lines that are fully clipped away
/// contribute nothing.
///
/// # Panics
///
/// Panics if an index is out of range or the index count is odd; the
/// pipeline validates both before clipping.
pub fn clip_line_list(
    indices: &[u32],
    vertices: &VertexBuffer,
    stride: usize,
    depth: DepthRange,
    extra_planes: &[PlaneEquation],
) -> (VertexBuffer, Vec<u32>) {
    assert!(indices.len() % 2 == 0, "line list with an odd index count");

    let mut out = Vec::with_capacity(indices.len() * stride / 4);
    let mut scratch = Vec::new();
    for pair in indices.chunks_exact(2) {
        let v1 = vertices.element(pair[0] as usize, stride);
        let v2 = vertices.element(pair[1] as usize, stride);

        if extra_planes.is_empty() {
            clip_line_homogeneous(v1, v2, depth, &mut out);
            continue;
        }

        scratch.clear();
        if clip_line_homogeneous(v1, v2, depth, &mut scratch) {
            let (a, b) = scratch.split_at(scratch.len() / 2);
            cut_line(extra_planes, a, b, &mut out);
        }
    }

    let floats = stride / 4;
    let count = (out.len() / floats) as u32;
    log::trace!("Line clipper: {} lines in, {} lines out", indices.len() / 2, count / 2);
    (VertexBuffer::from_floats(out), (0..count).collect())
}
