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

//! Draw-call orchestration
//!
//! [`Pipeline::draw_instance`] runs one indexed draw through every stage:
//!
//! ```text
//! Idle -> VertexShaded -> Clipped -> ViewportTransformed -> Rasterized -> Idle
//! ```
//!
//! 1. Validation: shaders bound, strides and buffer size consistent, index
//!    count and range, viewport and targets. Errors abort the draw before
//!    any pixel is touched.
//! 2. Vertex shading: a pure per-vertex map from the input stride to the
//!    shader-output stride.
//! 3. Homogeneous clipping: Liang-Barsky for lines, the plane list of the
//!    PSO for triangles. Produces a fresh, sequentially indexed buffer.
//! 4. Perspective divide, then the viewport matrix. `w` becomes 1 and its
//!    reciprocal moves to a side channel for perspective-correct
//!    interpolation. Optional screen-space cut planes are applied here.
//! 5. Rasterization into the [`FrameTargets`].
//!
//! A stage that leaves no geometry ends the draw early; that is a normal
//! outcome, reported through [`DrawStats`].


use glam::{Mat4, Vec3};

use super::buffer::{VertexBuffer, VertexLayout, ELEMENT_SIZE, POSITION_FLOATS};
use super::clip::{
    clip_line_list, clip_triangle_list, cut_line, DepthRange, FrustumPlanes, PlaneEquation,
};
use super::error::{PipelineError, Result};
use super::pso::{PipelineStateObject, PixelShader, Topology, VertexShader};
use super::raster::{Rasterizer, ScreenVertex};
use super::target::FrameTargets;

/// `|w|` below this is replaced before the divide
pub const W_EPSILON: f32 = 1e-6;

/// Relative slack allowed when validating clipped vertices
const CLIP_VALIDATION_TOLERANCE: f32 = 1e-4;

/// Stage of a draw call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum DrawStage {
    #[default]
    Idle,
    VertexShaded,
    Clipped,
    ViewportTransformed,
    Rasterized,
}

/// Outcome of one draw call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Vertices run through the vertex shader
    pub vertices_shaded: usize,
    /// Primitives described by the index list
    pub primitives_submitted: usize,
    /// Primitives left after homogeneous and screen-space clipping
    pub primitives_clipped: usize,
    /// Triangles discarded by face culling
    pub primitives_culled: u64,
    /// Pixels written
    pub pixels_shaded: u64,
    /// Pixels discarded by the depth test
    pub pixels_depth_rejected: u64,
    /// Last stage that completed before the draw returned to idle
    pub last_stage: DrawStage,
}

/// Clip, transform and rasterize draw calls
///
/// Owns the rasterizer and its scratch storage so consecutive draws reuse
/// allocations. Draws run to completion synchronously.
///
/// # Examples
///
/// ```
/// use softpipe::core::buffer::{VertexBuffer, VertexLayout};
/// use softpipe::core::pipeline::{DrawStage, Pipeline};
/// use softpipe::core::pso::{PipelineStateObject, Viewport};
/// use softpipe::core::target::{FrameTargets, Rgba};
///
/// let layout = VertexLayout::new(16, 16).unwrap();
/// let mut pso = PipelineStateObject::new(layout, Viewport::full(32, 32));
/// pso.set_vertex_shader(|input: &[f32], output: &mut [f32]| output.copy_from_slice(input));
/// pso.set_pixel_shader(|_: &[f32]| Rgba::WHITE);
///
/// let vertices = VertexBuffer::from_floats(vec![
///     -1.0, -1.0, 0.0, 1.0,
///      1.0, -1.0, 0.0, 1.0,
///     -1.0,  1.0, 0.0, 1.0,
/// ]);
/// let mut targets = FrameTargets::new(32, 32);
/// let mut pipeline = Pipeline::new();
/// let stats = pipeline.draw_instance(&pso, &[0, 1, 2], &vertices, &mut targets).unwrap();
///
/// assert_eq!(stats.last_stage, DrawStage::Rasterized);
/// assert_eq!(targets.color.pixel(2, 2), Some(Rgba::WHITE));
/// ```
#[derive(Debug, Default)]
pub struct Pipeline {
    rasterizer: Rasterizer,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            rasterizer: Rasterizer::new(),
        }
    }

    /// Rasterizer used by the last draw
    ///
    /// Exposed for debug overlays drawn with the same clip rectangle.
    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    /// Run one indexed draw call
    ///
    /// # Arguments
    ///
    /// * `pso` - Pipeline state
    /// * `indices` - Vertex indices, 2 per line or 3 per triangle
    /// * `vertices` - Input vertices at the layout's input stride
    /// * `targets` - Color and depth targets
    ///
    /// # Errors
    ///
    /// Configuration errors only; see [`validate_draw`]. Geometry that
    /// clips away returns `Ok` with zero primitives.
    pub fn draw_instance(
        &mut self,
        pso: &PipelineStateObject,
        indices: &[u32],
        vertices: &VertexBuffer,
        targets: &mut FrameTargets,
    ) -> Result<DrawStats> {
        let (vertex_shader, pixel_shader) = validate_draw(pso, indices, vertices, targets)?;

        let layout = pso.layout();
        let per_primitive = pso.topology.vertices_per_primitive();
        let mut stats = DrawStats {
            primitives_submitted: indices.len() / per_primitive,
            ..Default::default()
        };
        if indices.is_empty() {
            log::debug!("Draw: no primitives submitted");
            return Ok(stats);
        }

        // Vertex shader
        let shaded = run_vertex_shader(vertex_shader, layout, vertices);
        stats.vertices_shaded = shaded.record_count(layout.output_stride());
        stats.last_stage = DrawStage::VertexShaded;

        // Homogeneous clipping
        let stride = layout.output_stride();
        let (mut clipped, clipped_indices) = match pso.topology {
            Topology::LineList => clip_line_list(
                indices,
                &shaded,
                stride,
                pso.depth_range,
                &pso.extra_clip_planes,
            ),
            Topology::TriangleList => {
                clip_triangle_list(indices, &shaded, stride, &pso.triangle_clip_planes())
            }
        };
        stats.primitives_clipped = clipped_indices.len() / per_primitive;
        stats.last_stage = DrawStage::Clipped;

        if pso.debug.validate_clip_output {
            let planes = match pso.topology {
                Topology::LineList => FrustumPlanes::all(),
                Topology::TriangleList => pso.clip_planes,
            };
            let violations = count_clip_violations(&clipped, stride, pso.depth_range, planes);
            if violations > 0 {
                log::warn!("Clip validation: {} vertices outside the clip volume", violations);
            }
        }

        if clipped_indices.is_empty() {
            log::debug!(
                "Draw: all {} primitives clipped away",
                stats.primitives_submitted
            );
            return Ok(stats);
        }

        // Perspective divide and viewport
        let mut inv_w = perspective_divide(&mut clipped, stride, pso.viewport_matrix());
        let mut screen_indices = clipped_indices;
        if !pso.screen_cut_planes.is_empty() {
            let (cut, cut_inv_w, cut_indices) = cut_screen_space(
                &clipped,
                &inv_w,
                &screen_indices,
                stride,
                pso.topology,
                &pso.screen_cut_planes,
            );
            clipped = cut;
            inv_w = cut_inv_w;
            screen_indices = cut_indices;
            stats.primitives_clipped = screen_indices.len() / per_primitive;
        }
        stats.last_stage = DrawStage::ViewportTransformed;

        if screen_indices.is_empty() {
            log::debug!("Draw: all primitives removed by screen-space cuts");
            return Ok(stats);
        }

        // Rasterization
        self.rasterizer.apply_state(pso);
        self.rasterizer.reset_stats();
        rasterize(
            &mut self.rasterizer,
            pixel_shader,
            pso.topology,
            &clipped,
            &inv_w,
            &screen_indices,
            stride,
            targets,
        );
        let raster = self.rasterizer.stats();
        stats.primitives_culled = raster.triangles_culled;
        stats.pixels_shaded = raster.pixels_shaded;
        stats.pixels_depth_rejected = raster.pixels_depth_rejected;
        stats.last_stage = DrawStage::Rasterized;

        log::debug!(
            "Draw: {} vertices, {} -> {} primitives, {} culled, {} pixels ({} depth rejected)",
            stats.vertices_shaded,
            stats.primitives_submitted,
            stats.primitives_clipped,
            stats.primitives_culled,
            stats.pixels_shaded,
            stats.pixels_depth_rejected
        );
        Ok(stats)
    }
}

/// Check everything a draw call depends on
///
/// Returns the bound shaders on success.
///
/// # Errors
///
/// - `MissingVertexShader` / `MissingPixelShader`
/// - `BufferLayoutMismatch` if the vertex buffer is not a whole number of
///   input records
/// - `IncompletePrimitive` if the index count does not fit the topology
/// - `IndexOutOfRange` for the first index past the last vertex
/// - `TargetSizeMismatch` if color and depth sizes differ
/// - `ViewportOutOfBounds` if the viewport does not fit the targets
pub fn validate_draw<'a>(
    pso: &'a PipelineStateObject,
    indices: &[u32],
    vertices: &VertexBuffer,
    targets: &FrameTargets,
) -> Result<(&'a dyn VertexShader, &'a dyn PixelShader)> {
    let vertex_shader = pso
        .vertex_shader()
        .ok_or(PipelineError::MissingVertexShader)?;
    let pixel_shader = pso.pixel_shader().ok_or(PipelineError::MissingPixelShader)?;

    let stride = pso.layout().input_stride();
    if vertices.size_in_bytes() % stride != 0 {
        return Err(PipelineError::BufferLayoutMismatch {
            size: vertices.size_in_bytes(),
            stride,
        });
    }

    let per_primitive = pso.topology.vertices_per_primitive();
    if indices.len() % per_primitive != 0 {
        return Err(PipelineError::IncompletePrimitive {
            indices: indices.len(),
            per_primitive,
        });
    }

    let count = vertices.record_count(stride);
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(PipelineError::IndexOutOfRange { index, count });
    }

    targets.validate()?;
    pso.viewport().validate(targets.width(), targets.height())?;

    Ok((vertex_shader, pixel_shader))
}

/// Run the vertex shader over every input record
///
/// Output records start zeroed, so attributes the shader leaves alone read
/// as 0.
pub fn run_vertex_shader(
    shader: &dyn VertexShader,
    layout: VertexLayout,
    input: &VertexBuffer,
) -> VertexBuffer {
    let count = input.record_count(layout.input_stride());
    let mut output = VertexBuffer::from_floats(vec![0.0; count * layout.output_floats()]);
    for (src, dst) in input
        .records(layout.input_stride())
        .zip(output.records_mut(layout.output_stride()))
    {
        shader.shade(src, dst);
    }
    output
}

/// Divide by `w` and apply the viewport matrix, in that order
///
/// Returns `1 / w` of every record. A `|w|` below [`W_EPSILON`] is replaced
/// by `±W_EPSILON` so the divide stays finite.
pub fn perspective_divide(buffer: &mut VertexBuffer, stride: usize, viewport: &Mat4) -> Vec<f32> {
    let mut inv_w = Vec::with_capacity(buffer.record_count(stride));
    let mut rescued = 0usize;
    for record in buffer.records_mut(stride) {
        let mut w = record[3];
        if w.abs() < W_EPSILON {
            rescued += 1;
            w = W_EPSILON.copysign(w);
        }
        let r = if w == 1.0 { 1.0 } else { 1.0 / w };
        let ndc = Vec3::new(record[0] * r, record[1] * r, record[2] * r);
        let screen = viewport.transform_point3(ndc);
        record[0] = screen.x;
        record[1] = screen.y;
        record[2] = screen.z;
        record[3] = 1.0;
        inv_w.push(r);
    }
    if rescued > 0 {
        log::warn!("Perspective divide: {} vertices with |w| < {}", rescued, W_EPSILON);
    }
    inv_w
}

/// Count records outside the selected frustum planes, with a small slack
pub fn count_clip_violations(
    buffer: &VertexBuffer,
    stride: usize,
    depth: DepthRange,
    planes: FrustumPlanes,
) -> usize {
    let equations = planes.equations(depth);
    buffer
        .records(stride)
        .filter(|v| {
            let slack = CLIP_VALIDATION_TOLERANCE * v[3].abs().max(1.0);
            equations.iter().any(|p| p.eval(v) < -slack)
        })
        .count()
}

/// Apply screen-space cut planes to post-viewport geometry
///
/// Records are rewritten as `[x, y, z, 1/w, attr/w...]`, all affine in
/// screen space, cut, and converted back, so new vertices keep
/// perspective-correct attributes.
fn cut_screen_space(
    buffer: &VertexBuffer,
    inv_w: &[f32],
    indices: &[u32],
    stride: usize,
    topology: Topology,
    planes: &[PlaneEquation],
) -> (VertexBuffer, Vec<f32>, Vec<u32>) {
    let floats = stride / ELEMENT_SIZE;
    let mut premultiplied = Vec::with_capacity(buffer.element_count());
    for (record, &r) in buffer.records(stride).zip(inv_w) {
        premultiplied.extend_from_slice(&record[..3]);
        premultiplied.push(r);
        premultiplied.extend(record[POSITION_FLOATS..].iter().map(|a| a * r));
    }
    let premultiplied = VertexBuffer::from_floats(premultiplied);

    let (mut cut, cut_indices) = match topology {
        Topology::TriangleList => clip_triangle_list(indices, &premultiplied, stride, planes),
        Topology::LineList => {
            let mut out = Vec::new();
            for pair in indices.chunks_exact(2) {
                cut_line(
                    planes,
                    premultiplied.element(pair[0] as usize, stride),
                    premultiplied.element(pair[1] as usize, stride),
                    &mut out,
                );
            }
            let count = (out.len() / floats) as u32;
            (VertexBuffer::from_floats(out), (0..count).collect())
        }
    };

    let mut cut_inv_w = Vec::with_capacity(cut.record_count(stride));
    for record in cut.records_mut(stride) {
        let r = record[3];
        let w = if r.abs() < W_EPSILON { 0.0 } else { 1.0 / r };
        for attribute in &mut record[POSITION_FLOATS..] {
            *attribute *= w;
        }
        record[3] = 1.0;
        cut_inv_w.push(r);
    }
    log::trace!(
        "Screen cuts: {} -> {} primitives",
        indices.len() / topology.vertices_per_primitive(),
        cut_indices.len() / topology.vertices_per_primitive()
    );
    (cut, cut_inv_w, cut_indices)
}

/// Feed every assembled primitive to the rasterizer
#[allow(clippy::too_many_arguments)]
fn rasterize(
    rasterizer: &mut Rasterizer,
    shader: &dyn PixelShader,
    topology: Topology,
    buffer: &VertexBuffer,
    inv_w: &[f32],
    indices: &[u32],
    stride: usize,
    targets: &mut FrameTargets,
) {
    let vertex = move |i: u32| {
        ScreenVertex::new(buffer.element(i as usize, stride), inv_w[i as usize])
    };
    match topology {
        Topology::LineList => {
            for pair in indices.chunks_exact(2) {
                rasterizer.draw_line(targets, shader, vertex(pair[0]), vertex(pair[1]));
            }
        }
        Topology::TriangleList => {
            for tri in indices.chunks_exact(3) {
                rasterizer.draw_triangle(
                    targets,
                    shader,
                    [vertex(tri[0]), vertex(tri[1]), vertex(tri[2])],
                );
            }
        }
    }
}
