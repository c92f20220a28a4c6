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

//! Plane equations used by the clippers
//!
//! Every plane evaluates a vertex record to a signed value that is positive on
//! the kept ("inside") side. All variants are linear in the record, so the
//! parameter of the intersection between an inside and an outside vertex is
//! always `d_in / (d_in - d_out)`.
//!
//! # Variants
//!
//! | Variant    | Space       | Raw value            |
//! |------------|-------------|----------------------|
//! | `Box`      | 3D world    | `p[axis] - offset`   |
//! | `Frustum`  | homogeneous | `w - p[axis]` (upper) / `w + p[axis]` (lower) |
//! | `NearZero` | homogeneous | `z`                  |
//! | `Screen`   | 2D screen   | `a*x + b*y + c`      |

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Denominators below this are treated as a segment parallel to the plane
pub const PLANE_EPSILON: f32 = 1e-7;

/// Coordinate axis of a homogeneous or world-space point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index inside a vertex record
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Which half-space a plane keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    /// Points with a positive raw value are inside
    Positive,
    /// Points with a negative raw value are inside
    Negative,
}

impl Keep {
    #[inline]
    fn sign(self) -> f32 {
        match self {
            Keep::Positive => 1.0,
            Keep::Negative => -1.0,
        }
    }

    fn flipped(self) -> Self {
        match self {
            Keep::Positive => Keep::Negative,
            Keep::Negative => Keep::Positive,
        }
    }
}

/// Which end of the `[-w, +w]` interval a frustum plane bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// `p[axis] = +w`
    Upper,
    /// `p[axis] = -w`
    Lower,
}

/// Clip-space depth convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthRange {
    /// OpenGL style: `-w <= z <= w`
    #[default]
    NegativeOneToOne,
    /// Direct3D style: `0 <= z <= w`
    ZeroToOne,
}

bitflags! {
    /// Subset of the six view-frustum planes
    ///
    /// Bit order is also the order in which the planes are applied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrustumPlanes: u8 {
        const LEFT   = 0b000001;
        const RIGHT  = 0b000010;
        const BOTTOM = 0b000100;
        const TOP    = 0b001000;
        const NEAR   = 0b010000;
        const FAR    = 0b100000;
    }
}

impl Default for FrustumPlanes {
    fn default() -> Self {
        Self::all()
    }
}

impl FrustumPlanes {
    /// Plane equations for the selected planes, in bit order
    pub fn equations(self, depth: DepthRange) -> Vec<PlaneEquation> {
        let table = PlaneEquation::frustum(depth);
        Self::all()
            .iter()
            .zip(table)
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, plane)| plane)
            .collect()
    }
}

/// A clip plane
///
/// Constructed once per draw call (or frustum configuration) and stateless
/// afterwards.
///
/// # Examples
///
/// ```
/// use softpipe::core::clip::PlaneEquation;
///
/// let right = PlaneEquation::right();
/// assert!(right.is_inside(&[0.5, 0.0, 0.0, 1.0]));
/// assert!(!right.is_inside(&[1.5, 0.0, 0.0, 1.0]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaneEquation {
    /// Axis-aligned box face in non-homogeneous 3D space
    Box { axis: Axis, offset: f32, keep: Keep },
    /// One of the `p[axis] = ±w` frustum planes
    Frustum { axis: Axis, bound: Bound, keep: Keep },
    /// The `z = 0` near plane of the zero-to-one depth convention
    NearZero { keep: Keep },
    /// Arbitrary line in screen space; inside where `a*x + b*y + c > 0`
    Screen { a: f32, b: f32, c: f32 },
}

impl PlaneEquation {
    /// `x >= -w`
    pub const fn left() -> Self {
        Self::Frustum {
            axis: Axis::X,
            bound: Bound::Lower,
            keep: Keep::Positive,
        }
    }

    /// `x <= w`
    pub const fn right() -> Self {
        Self::Frustum {
            axis: Axis::X,
            bound: Bound::Upper,
            keep: Keep::Positive,
        }
    }

    /// `y >= -w`
    pub const fn bottom() -> Self {
        Self::Frustum {
            axis: Axis::Y,
            bound: Bound::Lower,
            keep: Keep::Positive,
        }
    }

    /// `y <= w`
    pub const fn top() -> Self {
        Self::Frustum {
            axis: Axis::Y,
            bound: Bound::Upper,
            keep: Keep::Positive,
        }
    }

    /// `z >= -w` or `z >= 0` depending on the depth convention
    pub const fn near(depth: DepthRange) -> Self {
        match depth {
            DepthRange::NegativeOneToOne => Self::Frustum {
                axis: Axis::Z,
                bound: Bound::Lower,
                keep: Keep::Positive,
            },
            DepthRange::ZeroToOne => Self::NearZero {
                keep: Keep::Positive,
            },
        }
    }

    /// `z <= w`
    pub const fn far() -> Self {
        Self::Frustum {
            axis: Axis::Z,
            bound: Bound::Upper,
            keep: Keep::Positive,
        }
    }

    /// The six frustum planes: left, right, bottom, top, near, far
    pub const fn frustum(depth: DepthRange) -> [Self; 6] {
        [
            Self::left(),
            Self::right(),
            Self::bottom(),
            Self::top(),
            Self::near(depth),
            Self::far(),
        ]
    }

    /// Box face keeping `p[axis] >= offset` (or `<=` with [`Keep::Negative`])
    pub const fn box_face(axis: Axis, offset: f32, keep: Keep) -> Self {
        Self::Box { axis, offset, keep }
    }

    /// Screen-space line through `from` and `to`; the left side is kept
    ///
    /// "Left" is taken with `y` pointing up, so a counter-clockwise run of
    /// lines keeps the interior.
    pub fn screen_line(from: (f32, f32), to: (f32, f32)) -> Self {
        let a = from.1 - to.1;
        let b = to.0 - from.0;
        let c = -(a * from.0 + b * from.1);
        Self::Screen { a, b, c }
    }

    /// Signed distance of a vertex record; positive means inside
    ///
    /// Only the leading position floats of the record are read.
    #[inline]
    pub fn eval(&self, p: &[f32]) -> f32 {
        match *self {
            Self::Box { axis, offset, keep } => keep.sign() * (p[axis.index()] - offset),
            Self::Frustum { axis, bound, keep } => {
                let raw = match bound {
                    Bound::Upper => p[3] - p[axis.index()],
                    Bound::Lower => p[3] + p[axis.index()],
                };
                keep.sign() * raw
            }
            Self::NearZero { keep } => keep.sign() * p[2],
            Self::Screen { a, b, c } => a * p[0] + b * p[1] + c,
        }
    }

    /// Strict inside test: points exactly on the plane are outside
    #[inline]
    pub fn is_inside(&self, p: &[f32]) -> bool {
        self.eval(p) > 0.0
    }

    /// Parameter `t` along `inside -> outside` where the segment meets the plane
    ///
    /// Always measured from the inside vertex. A segment (nearly) parallel to
    /// the plane yields `0.0` rather than a division by zero.
    pub fn intersection(&self, inside: &[f32], outside: &[f32]) -> f32 {
        let d_in = self.eval(inside);
        let d_out = self.eval(outside);
        let denom = d_in - d_out;
        if denom.abs() < PLANE_EPSILON {
            return 0.0;
        }
        (d_in / denom).clamp(0.0, 1.0)
    }

    /// Move an interpolated position exactly onto the plane
    ///
    /// Removes the rounding residue of the interpolation so the vertex is
    /// classified as "on the plane" (outside) by this plane and by its
    /// complement.
    pub fn snap(&self, v: &mut [f32]) {
        match *self {
            Self::Box { axis, offset, .. } => v[axis.index()] = offset,
            Self::Frustum { axis, bound, .. } => {
                v[axis.index()] = match bound {
                    Bound::Upper => v[3],
                    Bound::Lower => -v[3],
                };
            }
            Self::NearZero { .. } => v[2] = 0.0,
            Self::Screen { a, b, c } => {
                let norm = a * a + b * b;
                if norm > PLANE_EPSILON {
                    let d = (a * v[0] + b * v[1] + c) / norm;
                    v[0] -= d * a;
                    v[1] -= d * b;
                }
            }
        }
    }

    /// The complementary half-space
    pub fn inverted(&self) -> Self {
        match *self {
            Self::Box { axis, offset, keep } => Self::Box {
                axis,
                offset,
                keep: keep.flipped(),
            },
            Self::Frustum { axis, bound, keep } => Self::Frustum {
                axis,
                bound,
                keep: keep.flipped(),
            },
            Self::NearZero { keep } => Self::NearZero {
                keep: keep.flipped(),
            },
            Self::Screen { a, b, c } => Self::Screen {
                a: -a,
                b: -b,
                c: -c,
            },
        }
    }
}
