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

//! Software rasterizer
//!
//! Converts screen-space primitives into pixel writes on a [`FrameTargets`]
//! pair. Input vertices have been through the perspective divide and the
//! viewport transform: the record's `x, y` are pixel coordinates with pixel
//! centres on integers, `z` is the depth compared against the depth buffer,
//! and the side-channel `inv_w` is the reciprocal of the clip-space `w` used
//! for perspective-correct interpolation.
//!
//! # Primitives
//!
//! - Shaded lines: integer Bresenham DDA, see [`line`]
//! - Triangles: edge-function scan conversion over the bounding box, see
//!   [`triangle`]
//! - Debug lines: flat Bresenham and an antialiased coverage blend that
//!   bypass shaders and depth, see [`antialias`]
//!
//! Every write is clipped to the active rectangle (the viewport).
//!
//! # References
//!
//! - [Bresenham's line algorithm](https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm)
//! - [Xiaolin Wu's line algorithm](https://en.wikipedia.org/wiki/Xiaolin_Wu%27s_line_algorithm)
//! - [Scratchapixel: Rasterization](https://www.scratchapixel.com/lessons/3d-basic-rendering/rasterization-practical-implementation)

pub mod antialias;
pub mod line;
pub mod triangle;

use super::pso::{
    CullFace, DepthFunc, FillMode, Interpolation, PipelineStateObject, PixelShader, Viewport,
};
use super::target::FrameTargets;

/// Below this the perspective weight sum falls back to affine weights
const INV_W_EPSILON: f32 = 1e-12;

/// A screen-space vertex handed to the rasterizer
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex<'a> {
    /// Full record: `[x, y, z, w, attributes...]`
    pub record: &'a [f32],
    /// `1 / w_clip` of the vertex before the divide
    pub inv_w: f32,
}

impl<'a> ScreenVertex<'a> {
    pub fn new(record: &'a [f32], inv_w: f32) -> Self {
        Self { record, inv_w }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.record[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.record[1]
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.record[2]
    }
}

/// Pixel counters accumulated across draws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Pixels that passed the depth test and ran the pixel shader
    pub pixels_shaded: u64,
    /// Pixels discarded by the depth test
    pub pixels_depth_rejected: u64,
    /// Triangles discarded by face culling
    pub triangles_culled: u64,
}

/// Round a pixel-space coordinate to the pixel whose centre is nearest
#[inline]
pub(crate) fn pixel_index(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Screen-space rasterizer
///
/// Holds the fixed-function state copied from a [`PipelineStateObject`] and
/// the active rectangle every write is clipped to.
///
/// # Examples
///
/// ```
/// use softpipe::core::raster::{Rasterizer, ScreenVertex};
/// use softpipe::core::target::{FrameTargets, Rgba};
///
/// let mut targets = FrameTargets::new(16, 16);
/// let mut rasterizer = Rasterizer::new();
/// rasterizer.set_clip_rect(0, 15, 0, 15);
///
/// let red = |_: &[f32]| Rgba::rgb(255, 0, 0);
/// let a = [0.0, 5.0, 0.5, 1.0];
/// let b = [10.0, 5.0, 0.5, 1.0];
/// rasterizer.draw_line(
///     &mut targets,
///     &red,
///     ScreenVertex::new(&a, 1.0),
///     ScreenVertex::new(&b, 1.0),
/// );
/// assert_eq!(targets.color.pixel(10, 5), Some(Rgba::rgb(255, 0, 0)));
/// ```
#[derive(Debug, Clone)]
pub struct Rasterizer {
    /// Active rectangle: (left, right, bottom, top), all inclusive
    clip_rect: (i32, i32, i32, i32),
    cull_face: CullFace,
    fill_mode: FillMode,
    depth_func: DepthFunc,
    depth_write: bool,
    interpolation: Interpolation,
    trace_primitives: bool,
    stats: RasterStats,
    /// Interpolated record reused between pixels
    scratch: Vec<f32>,
}

impl Rasterizer {
    /// Create a rasterizer with default state and an empty clip rectangle
    pub fn new() -> Self {
        Self {
            clip_rect: (0, -1, 0, -1),
            cull_face: CullFace::default(),
            fill_mode: FillMode::default(),
            depth_func: DepthFunc::default(),
            depth_write: true,
            interpolation: Interpolation::default(),
            trace_primitives: false,
            stats: RasterStats::default(),
            scratch: Vec::new(),
        }
    }

    /// Create a rasterizer configured from a pipeline state
    pub fn from_state(pso: &PipelineStateObject) -> Self {
        let mut rasterizer = Self::new();
        rasterizer.apply_state(pso);
        rasterizer
    }

    /// Copy the fixed-function switches and viewport of a pipeline state
    pub fn apply_state(&mut self, pso: &PipelineStateObject) {
        self.cull_face = pso.cull_face;
        self.fill_mode = pso.fill_mode;
        self.depth_func = pso.depth_func;
        self.depth_write = pso.depth_write;
        self.interpolation = pso.interpolation;
        self.trace_primitives = pso.debug.trace_primitives;
        self.set_viewport(pso.viewport());
    }

    /// Set the active rectangle
    ///
    /// # Arguments
    ///
    /// * `left` - Leftmost column
    /// * `right` - Rightmost column
    /// * `bottom` - Lowest row
    /// * `top` - Highest row
    pub fn set_clip_rect(&mut self, left: i32, right: i32, bottom: i32, top: i32) {
        self.clip_rect = (left, right, bottom, top);
    }

    /// Use a viewport as the active rectangle
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.set_clip_rect(
            viewport.left as i32,
            viewport.right as i32,
            viewport.bottom as i32,
            viewport.top as i32,
        );
    }

    pub fn clip_rect(&self) -> (i32, i32, i32, i32) {
        self.clip_rect
    }

    pub fn set_cull_face(&mut self, cull_face: CullFace) {
        self.cull_face = cull_face;
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        self.fill_mode = fill_mode;
    }

    pub fn set_depth_func(&mut self, depth_func: DepthFunc) {
        self.depth_func = depth_func;
    }

    pub fn set_depth_write(&mut self, depth_write: bool) {
        self.depth_write = depth_write;
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    pub fn stats(&self) -> RasterStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RasterStats::default();
    }

    #[inline]
    fn in_clip_rect(&self, x: i32, y: i32) -> bool {
        let (left, right, bottom, top) = self.clip_rect;
        x >= left && x <= right && y >= bottom && y <= top
    }

    /// Depth test one fragment and update the depth buffer on success
    #[inline]
    fn depth_test(&mut self, targets: &mut FrameTargets, x: i32, y: i32, z: f32) -> bool {
        let Some(stored) = targets.depth.value(x, y) else {
            return false;
        };
        if !self.depth_func.passes(z, *stored) {
            self.stats.pixels_depth_rejected += 1;
            return false;
        }
        if self.depth_write {
            *stored = z;
        }
        true
    }

    /// Depth test, shade and write the fragment held in `scratch`
    #[inline]
    fn shade_fragment(
        &mut self,
        targets: &mut FrameTargets,
        shader: &dyn PixelShader,
        x: i32,
        y: i32,
    ) {
        let z = self.scratch[2];
        if !self.depth_test(targets, x, y, z) {
            return;
        }
        let color = shader.shade(&self.scratch);
        targets.color.set_pixel(x, y, color);
        self.stats.pixels_shaded += 1;
    }

    /// Blend vertex records into `scratch` with screen-space weights
    ///
    /// Position floats always use the weights as given; attributes are
    /// corrected by `inv_w` in perspective mode.
    fn interpolate(&mut self, vertices: &[ScreenVertex<'_>], weights: &[f32]) {
        let floats = vertices[0].record.len();
        self.scratch.clear();
        self.scratch.resize(floats, 0.0);

        for (v, &l) in vertices.iter().zip(weights) {
            for (out, &value) in self.scratch[..4].iter_mut().zip(&v.record[..4]) {
                *out += l * value;
            }
        }
        if floats == 4 {
            return;
        }

        let perspective_sum: f32 = vertices.iter().zip(weights).map(|(v, &l)| l * v.inv_w).sum();
        let perspective =
            self.interpolation == Interpolation::Perspective && perspective_sum.abs() > INV_W_EPSILON;

        for (v, &l) in vertices.iter().zip(weights) {
            let weight = if perspective {
                l * v.inv_w / perspective_sum
            } else {
                l
            };
            for (out, &value) in self.scratch[4..].iter_mut().zip(&v.record[4..]) {
                *out += weight * value;
            }
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_index_rounds_to_nearest_centre() {
        assert_eq!(pixel_index(-0.5), 0);
        assert_eq!(pixel_index(-0.6), -1);
        assert_eq!(pixel_index(2.49), 2);
        assert_eq!(pixel_index(2.5), 3);
        assert_eq!(pixel_index(255.5), 256);
    }

    #[test]
    fn test_interpolate_affine_and_perspective() {
        let a = [0.0, 0.0, 0.0, 1.0, 0.0];
        let b = [10.0, 0.0, 1.0, 1.0, 1.0];
        // b is three times as far away as a
        let vertices = [ScreenVertex::new(&a, 1.0), ScreenVertex::new(&b, 1.0 / 3.0)];

        let mut rasterizer = Rasterizer::new();
        rasterizer.set_interpolation(Interpolation::Affine);
        rasterizer.interpolate(&vertices, &[0.5, 0.5]);
        assert_eq!(rasterizer.scratch, vec![5.0, 0.0, 0.5, 1.0, 0.5]);

        rasterizer.set_interpolation(Interpolation::Perspective);
        rasterizer.interpolate(&vertices, &[0.5, 0.5]);
        assert_eq!(rasterizer.scratch[..4], [5.0, 0.0, 0.5, 1.0]);
        // The screen midpoint is a quarter of the way along the 3D segment
        assert!((rasterizer.scratch[4] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clip_rect_from_state() {
        use crate::core::buffer::VertexLayout;

        let layout = VertexLayout::new(16, 16).unwrap();
        let mut pso = PipelineStateObject::new(layout, Viewport::new(2, 9, 3, 7));
        pso.cull_face = CullFace::Ccw;
        let rasterizer = Rasterizer::from_state(&pso);
        assert_eq!(rasterizer.clip_rect(), (2, 9, 3, 7));
        assert_eq!(rasterizer.cull_face, CullFace::Ccw);
        assert!(rasterizer.in_clip_rect(2, 7));
        assert!(!rasterizer.in_clip_rect(10, 7));
    }
}
