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

//! Homogeneous-space clipping
//!
//! Primitives leave the vertex shader in homogeneous clip space and are
//! clipped here, before the perspective divide, so that vertices at or behind
//! the eye plane never reach the division by `w`.
//!
//! # Clippers
//!
//! - [`line::clip_line_homogeneous`]: Liang-Barsky against the six frustum
//!   planes, producing the visible sub-segment
//! - [`line::cut_line`]: sequential cut of a segment against arbitrary planes
//! - [`triangle::cut_triangle`]: one triangle against one plane, yielding a
//!   [`TrianglePair`] of zero, one or two triangles
//! - [`triangle::clip_triangle`]: one triangle against an ordered plane list
//!
//! The `*_list` functions apply these to indexed primitive lists and produce a
//! fresh vertex buffer plus sequential indices. Every output vertex carries
//! all of its attributes, linearly interpolated exactly like the position.
//!
//! Clipping never fails: primitives that lie outside simply vanish.

pub mod line;
pub mod plane;
pub mod triangle;


pub use line::{clip_line_homogeneous, clip_line_list, cut_line, liang_barsky};
pub use plane::{Axis, Bound, DepthRange, FrustumPlanes, Keep, PlaneEquation};
pub use triangle::{clip_triangle, clip_triangle_list, cut_triangle, PairKind, TrianglePair};

/// Append `from + t * (to - from)` for every float of the record
#[inline]
pub(crate) fn lerp_into(out: &mut Vec<f32>, from: &[f32], to: &[f32], t: f32) {
    debug_assert_eq!(from.len(), to.len());
    // t = 0 and t = 1 reproduce the endpoint bit-exact
    if t == 0.0 {
        out.extend_from_slice(from);
    } else if t == 1.0 {
        out.extend_from_slice(to);
    } else {
        out.extend(from.iter().zip(to).map(|(a, b)| a + (b - a) * t));
    }
}

/// Interpolate a full vertex record; `t = 0` yields `from`
pub fn lerp_vertex(from: &[f32], to: &[f32], t: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(from.len());
    lerp_into(&mut out, from, to, t);
    out
}
