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

//! Pipeline state object
//!
//! The [`PipelineStateObject`] holds everything a draw call needs besides
//! the geometry and the render targets: topology, culling, fill mode, the
//! depth test, the two shader callables, the vertex layout and the viewport
//! with its precomputed transform.
//!
//! # Shaders
//!
//! Shaders are trait objects. Any closure with the right signature is a
//! shader, and captured state (camera matrices, material constants) moves
//! into the closure, so its lifetime is the lifetime of the PSO binding.
//!
//! ```
//! use softpipe::core::buffer::VertexLayout;
//! use softpipe::core::pso::{PipelineStateObject, Viewport};
//! use softpipe::core::target::Rgba;
//!
//! let layout = VertexLayout::new(12, 16).unwrap();
//! let mut pso = PipelineStateObject::new(layout, Viewport::new(0, 63, 0, 63));
//!
//! let scale = 0.5;
//! pso.set_vertex_shader(move |input: &[f32], output: &mut [f32]| {
//!     output[0] = input[0] * scale;
//!     output[1] = input[1] * scale;
//!     output[2] = input[2];
//!     output[3] = 1.0;
//! });
//! pso.set_pixel_shader(|_: &[f32]| Rgba::WHITE);
//! assert!(pso.vertex_shader().is_some());
//! ```

use std::fmt;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::buffer::VertexLayout;
use super::clip::{DepthRange, FrustumPlanes, PlaneEquation};
use super::error::{PipelineError, Result};
use super::target::Rgba;

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Every two indices form a line
    LineList,
    /// Every three indices form a triangle
    #[default]
    TriangleList,
}

impl Topology {
    /// Indices consumed per primitive
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Topology::LineList => 2,
            Topology::TriangleList => 3,
        }
    }
}

/// Which screen-space winding is discarded
///
/// Winding is measured with `y` pointing up, so a positive doubled area is
/// counter-clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullFace {
    /// Draw both windings
    #[default]
    None,
    /// Discard clockwise triangles
    Cw,
    /// Discard counter-clockwise triangles
    Ccw,
}

impl CullFace {
    /// Whether a triangle with the given doubled signed area is discarded
    #[inline]
    pub fn culls(self, signed_area: f32) -> bool {
        match self {
            CullFace::None => false,
            CullFace::Cw => signed_area < 0.0,
            CullFace::Ccw => signed_area > 0.0,
        }
    }
}

/// Triangle fill mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    #[default]
    Solid,
    /// Only the three edges, drawn as shaded lines
    Wireframe,
}

/// Depth comparison: the incoming fragment passes when
/// `incoming <op> stored` holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFunc {
    Never,
    Less,
    #[default]
    LessEqual,
    Equal,
    Greater,
    GreaterEqual,
    NotEqual,
    Always,
}

impl DepthFunc {
    #[inline]
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            DepthFunc::Never => false,
            DepthFunc::Less => incoming < stored,
            DepthFunc::LessEqual => incoming <= stored,
            DepthFunc::Equal => incoming == stored,
            DepthFunc::Greater => incoming > stored,
            DepthFunc::GreaterEqual => incoming >= stored,
            DepthFunc::NotEqual => incoming != stored,
            DepthFunc::Always => true,
        }
    }
}

/// Attribute interpolation across a primitive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Weights corrected by `1/w` of each vertex
    #[default]
    Perspective,
    /// Plain screen-space weights
    Affine,
}

/// Diagnostics carried by the pipeline state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Re-check every clipped vertex against the frustum and log violations
    pub validate_clip_output: bool,
    /// Log every primitive at trace level
    pub trace_primitives: bool,
}

/// Inclusive pixel rectangle the primitives are mapped to
///
/// `bottom` is the smaller `y`: NDC `y = -1` maps near row `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
    pub top: u32,
}

impl Viewport {
    pub const fn new(left: u32, right: u32, bottom: u32, top: u32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Viewport covering a whole `width` x `height` target
    ///
    /// A zero dimension yields a one-pixel span that fails validation
    /// against the empty target.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, width.saturating_sub(1), 0, height.saturating_sub(1))
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left) + 1
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.top.saturating_sub(self.bottom) + 1
    }

    /// Check the rectangle is ordered and fits a target
    ///
    /// # Errors
    ///
    /// `ViewportOutOfBounds` if `left > right`, `bottom > top` or the
    /// rectangle reaches past the target.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.left > self.right
            || self.bottom > self.top
            || self.right >= width
            || self.top >= height
        {
            return Err(PipelineError::ViewportOutOfBounds {
                left: self.left,
                right: self.right,
                bottom: self.bottom,
                top: self.top,
                width,
                height,
            });
        }
        Ok(())
    }

    /// NDC to pixel transform
    ///
    /// Maps `[-1, 1]` onto `[left - 0.5, right + 0.5]` (and likewise for
    /// `y`), so pixel centres sit on integer coordinates. `z` passes
    /// through unchanged.
    pub fn matrix(&self) -> Mat4 {
        let sx = self.width() as f32 * 0.5;
        let sy = self.height() as f32 * 0.5;
        let tx = sx + self.left as f32 - 0.5;
        let ty = sy + self.bottom as f32 - 0.5;
        Mat4::from_translation(Vec3::new(tx, ty, 0.0)) * Mat4::from_scale(Vec3::new(sx, sy, 1.0))
    }
}

/// Per-vertex transform from an input record to a shader-output record
///
/// `input` holds `layout.input_floats()` floats; `output` holds
/// `layout.output_floats()` floats, zeroed, and must receive the homogeneous
/// position in its first four slots.
pub trait VertexShader {
    fn shade(&self, input: &[f32], output: &mut [f32]);
}

impl<F> VertexShader for F
where
    F: Fn(&[f32], &mut [f32]),
{
    fn shade(&self, input: &[f32], output: &mut [f32]) {
        self(input, output)
    }
}

/// Per-pixel color from an interpolated shader-output record
pub trait PixelShader {
    fn shade(&self, vertex: &[f32]) -> Rgba;
}

impl<F> PixelShader for F
where
    F: Fn(&[f32]) -> Rgba,
{
    fn shade(&self, vertex: &[f32]) -> Rgba {
        self(vertex)
    }
}

/// Complete configuration of a draw call
///
/// Plain public fields for the fixed-function switches; the viewport, the
/// layout and the shaders go through setters because they carry derived
/// state or need boxing.
pub struct PipelineStateObject {
    pub topology: Topology,
    pub cull_face: CullFace,
    pub fill_mode: FillMode,
    pub depth_func: DepthFunc,
    /// Store passing depths back into the depth buffer
    pub depth_write: bool,
    pub depth_range: DepthRange,
    pub interpolation: Interpolation,
    /// Frustum planes used when clipping triangles
    pub clip_planes: FrustumPlanes,
    /// Additional homogeneous-space planes applied after the frustum
    pub extra_clip_planes: Vec<PlaneEquation>,
    /// Screen-space planes applied after the viewport transform
    pub screen_cut_planes: Vec<PlaneEquation>,
    pub debug: DebugOptions,

    layout: VertexLayout,
    viewport: Viewport,
    viewport_matrix: Mat4,
    vertex_shader: Option<Box<dyn VertexShader>>,
    pixel_shader: Option<Box<dyn PixelShader>>,
}

impl PipelineStateObject {
    /// Create a state with default switches and no shaders bound
    pub fn new(layout: VertexLayout, viewport: Viewport) -> Self {
        Self {
            topology: Topology::default(),
            cull_face: CullFace::default(),
            fill_mode: FillMode::default(),
            depth_func: DepthFunc::default(),
            depth_write: true,
            depth_range: DepthRange::default(),
            interpolation: Interpolation::default(),
            clip_planes: FrustumPlanes::default(),
            extra_clip_planes: Vec::new(),
            screen_cut_planes: Vec::new(),
            debug: DebugOptions::default(),
            layout,
            viewport,
            viewport_matrix: viewport.matrix(),
            vertex_shader: None,
            pixel_shader: None,
        }
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: VertexLayout) {
        self.layout = layout;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport and rebuild its transform
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.viewport_matrix = viewport.matrix();
    }

    /// Precomputed NDC to pixel transform
    pub fn viewport_matrix(&self) -> &Mat4 {
        &self.viewport_matrix
    }

    pub fn set_vertex_shader(&mut self, shader: impl VertexShader + 'static) {
        self.vertex_shader = Some(Box::new(shader));
    }

    pub fn set_pixel_shader(&mut self, shader: impl PixelShader + 'static) {
        self.pixel_shader = Some(Box::new(shader));
    }

    pub fn vertex_shader(&self) -> Option<&dyn VertexShader> {
        self.vertex_shader.as_deref()
    }

    pub fn pixel_shader(&self) -> Option<&dyn PixelShader> {
        self.pixel_shader.as_deref()
    }

    /// Unbind both shaders
    pub fn clear_shaders(&mut self) {
        self.vertex_shader = None;
        self.pixel_shader = None;
    }

    /// Planes the triangle clipper runs through, in order
    pub fn triangle_clip_planes(&self) -> Vec<PlaneEquation> {
        let mut planes = self.clip_planes.equations(self.depth_range);
        planes.extend_from_slice(&self.extra_clip_planes);
        planes
    }
}

impl fmt::Debug for PipelineStateObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStateObject")
            .field("topology", &self.topology)
            .field("cull_face", &self.cull_face)
            .field("fill_mode", &self.fill_mode)
            .field("depth_func", &self.depth_func)
            .field("depth_write", &self.depth_write)
            .field("depth_range", &self.depth_range)
            .field("interpolation", &self.interpolation)
            .field("clip_planes", &self.clip_planes)
            .field("extra_clip_planes", &self.extra_clip_planes)
            .field("screen_cut_planes", &self.screen_cut_planes)
            .field("debug", &self.debug)
            .field("layout", &self.layout)
            .field("viewport", &self.viewport)
            .field("vertex_shader", &self.vertex_shader.is_some())
            .field("pixel_shader", &self.pixel_shader.is_some())
            .finish()
    }
}
