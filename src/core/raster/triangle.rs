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

//! Triangle rasterization
//!
//! Edge-function scan conversion. For a triangle `(a, b, c)` the edge
//! function of the directed edge `a -> b` is
//!
//! ```text
//! E_ab(p) = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
//! ```
//!
//! which is positive to the left of the edge (with `y` up). A
//! counter-clockwise triangle has all three functions positive inside;
//! clockwise triangles are reordered to counter-clockwise before the walk.
//! The three values divided by the doubled area are the barycentric
//! weights of the opposite vertices.
//!
//! Pixels exactly on an edge belong to the triangle whose inward edge
//! normal points toward `+x`, or toward `+y` for horizontal edges, so two
//! triangles sharing an edge never both cover a pixel on it.

use super::{Rasterizer, ScreenVertex};
use crate::core::pso::{FillMode, PixelShader};
use crate::core::target::FrameTargets;

/// Doubled signed area of `(a, b, p)`: the edge function of `a -> b` at `p`
#[inline]
pub fn edge_function(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Whether the counter-clockwise edge `a -> b` owns the pixels lying on it
#[inline]
fn owns_edge(a: (f32, f32), b: (f32, f32)) -> bool {
    a.1 > b.1 || (a.1 == b.1 && b.0 > a.0)
}

#[inline]
fn covers(value: f32, a: (f32, f32), b: (f32, f32)) -> bool {
    value > 0.0 || (value == 0.0 && owns_edge(a, b))
}

#[inline]
fn xy(v: &ScreenVertex<'_>) -> (f32, f32) {
    (v.x(), v.y())
}

impl Rasterizer {
    /// Rasterize a screen-space triangle
    ///
    /// Applies face culling, then either walks the three edges as shaded
    /// lines (wireframe) or fills the interior.
    ///
    /// # Arguments
    ///
    /// * `targets` - Color and depth targets
    /// * `shader` - Pixel shader
    /// * `vertices` - The triangle in submission order
    ///
    /// # Algorithm
    ///
    /// 1. Compute the doubled signed area; cull or drop degenerate triangles
    /// 2. Clamp the pixel bounding box to the active rectangle
    /// 3. Evaluate the three edge functions at every pixel centre
    /// 4. Interpolate, depth test and shade the covered pixels
    pub fn draw_triangle(
        &mut self,
        targets: &mut FrameTargets,
        shader: &dyn PixelShader,
        vertices: [ScreenVertex<'_>; 3],
    ) {
        let [a, b, c] = vertices;
        let area = edge_function(xy(&a), xy(&b), xy(&c));

        if self.cull_face.culls(area) {
            self.stats.triangles_culled += 1;
            if self.trace_primitives {
                log::trace!("Triangle culled ({:?}, area {:.2})", self.cull_face, area);
            }
            return;
        }
        if area == 0.0 || !area.is_finite() {
            // Zero area: nothing to cover
            return;
        }

        if self.trace_primitives {
            log::trace!(
                "Triangle: ({:.2}, {:.2}) ({:.2}, {:.2}) ({:.2}, {:.2}) area={:.2}",
                a.x(),
                a.y(),
                b.x(),
                b.y(),
                c.x(),
                c.y(),
                area * 0.5
            );
        }

        if self.fill_mode == FillMode::Wireframe {
            self.draw_line(targets, shader, a, b);
            self.draw_line(targets, shader, b, c);
            self.draw_line(targets, shader, c, a);
            return;
        }

        let (vertices, area) = if area < 0.0 {
            ([a, c, b], -area)
        } else {
            ([a, b, c], area)
        };
        self.fill_triangle(targets, shader, vertices, area);
    }

    /// Fill a counter-clockwise triangle of doubled area `area`
    fn fill_triangle(
        &mut self,
        targets: &mut FrameTargets,
        shader: &dyn PixelShader,
        vertices: [ScreenVertex<'_>; 3],
        area: f32,
    ) {
        let [p0, p1, p2] = [xy(&vertices[0]), xy(&vertices[1]), xy(&vertices[2])];

        let (left, right, bottom, top) = self.clip_rect;
        let min_x = (p0.0.min(p1.0).min(p2.0).floor() as i32).max(left);
        let max_x = (p0.0.max(p1.0).max(p2.0).ceil() as i32).min(right);
        let min_y = (p0.1.min(p1.1).min(p2.1).floor() as i32).max(bottom);
        let max_y = (p0.1.max(p1.1).max(p2.1).ceil() as i32).min(top);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let inv_area = 1.0 / area;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32, y as f32);
                let w0 = edge_function(p1, p2, p);
                let w1 = edge_function(p2, p0, p);
                let w2 = edge_function(p0, p1, p);

                if !(covers(w0, p1, p2) && covers(w1, p2, p0) && covers(w2, p0, p1)) {
                    continue;
                }

                self.interpolate(&vertices, &[w0 * inv_area, w1 * inv_area, w2 * inv_area]);
                self.shade_fragment(targets, shader, x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pso::{CullFace, DepthFunc, Interpolation};
    use crate::core::target::Rgba;

    fn rasterizer(size: i32) -> Rasterizer {
        let mut rasterizer = Rasterizer::new();
        rasterizer.set_clip_rect(0, size - 1, 0, size - 1);
        rasterizer
    }

    fn vertex(x: f32, y: f32, z: f32) -> [f32; 4] {
        [x, y, z, 1.0]
    }

    fn draw(
        r: &mut Rasterizer,
        targets: &mut FrameTargets,
        shader: &dyn PixelShader,
        tri: &[[f32; 4]; 3],
    ) {
        r.draw_triangle(
            targets,
            shader,
            [
                ScreenVertex::new(&tri[0], 1.0),
                ScreenVertex::new(&tri[1], 1.0),
                ScreenVertex::new(&tri[2], 1.0),
            ],
        );
    }

    #[test]
    fn test_edge_function_sign() {
        // Left of a rightward edge is positive
        assert!(edge_function((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)) > 0.0);
        assert!(edge_function((0.0, 0.0), (1.0, 0.0), (0.5, -1.0)) < 0.0);
        assert_eq!(edge_function((0.0, 0.0), (4.0, 0.0), (0.0, 4.0)), 16.0);
    }

    #[test]
    fn test_basic_triangle_coverage() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        let white = |_: &[f32]| Rgba::WHITE;

        let tri = [vertex(0.0, 0.0, 0.5), vertex(4.0, 0.0, 0.5), vertex(0.0, 4.0, 0.5)];
        draw(&mut r, &mut targets, &white, &tri);

        assert_eq!(targets.color.pixel(1, 1), Some(Rgba::WHITE));
        assert_eq!(targets.color.pixel(3, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_clockwise_triangle_is_filled() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        let white = |_: &[f32]| Rgba::WHITE;

        let tri = [vertex(0.0, 0.0, 0.5), vertex(0.0, 4.0, 0.5), vertex(4.0, 0.0, 0.5)];
        draw(&mut r, &mut targets, &white, &tri);

        assert_eq!(targets.color.pixel(1, 1), Some(Rgba::WHITE));
        assert_eq!(targets.color.pixel(3, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_shared_edge_covered_once() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        r.set_depth_func(DepthFunc::Less);
        let white = |_: &[f32]| Rgba::WHITE;

        let lower = [vertex(0.0, 0.0, 0.5), vertex(4.0, 0.0, 0.5), vertex(4.0, 4.0, 0.5)];
        let upper = [vertex(0.0, 0.0, 0.5), vertex(4.0, 4.0, 0.5), vertex(0.0, 4.0, 0.5)];
        draw(&mut r, &mut targets, &white, &lower);
        draw(&mut r, &mut targets, &white, &upper);

        // A second write to any pixel would be rejected by Less
        assert_eq!(r.stats().pixels_depth_rejected, 0);
        assert_eq!(r.stats().pixels_shaded, 16);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(targets.color.pixel(x, y), Some(Rgba::WHITE), "({x}, {y})");
            }
        }
        assert_eq!(targets.color.pixel(4, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(targets.color.pixel(2, 4), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_depth_test_near_wins() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        let red = |_: &[f32]| Rgba::rgb(255, 0, 0);
        let green = |_: &[f32]| Rgba::rgb(0, 255, 0);

        let far = [vertex(0.0, 0.0, 0.8), vertex(6.0, 0.0, 0.8), vertex(0.0, 6.0, 0.8)];
        let near = [vertex(0.0, 0.0, 0.2), vertex(6.0, 0.0, 0.2), vertex(0.0, 6.0, 0.2)];
        draw(&mut r, &mut targets, &red, &far);
        draw(&mut r, &mut targets, &green, &near);
        assert_eq!(targets.color.pixel(1, 1), Some(Rgba::rgb(0, 255, 0)));

        // Drawing the far one again changes nothing
        draw(&mut r, &mut targets, &red, &far);
        assert_eq!(targets.color.pixel(1, 1), Some(Rgba::rgb(0, 255, 0)));
        assert!(r.stats().pixels_depth_rejected > 0);
    }

    #[test]
    fn test_cull_modes() {
        let ccw = [vertex(0.0, 0.0, 0.5), vertex(4.0, 0.0, 0.5), vertex(0.0, 4.0, 0.5)];
        let white = |_: &[f32]| Rgba::WHITE;

        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        r.set_cull_face(CullFace::Ccw);
        draw(&mut r, &mut targets, &white, &ccw);
        assert_eq!(r.stats().triangles_culled, 1);
        assert_eq!(r.stats().pixels_shaded, 0);

        r.set_cull_face(CullFace::Cw);
        draw(&mut r, &mut targets, &white, &ccw);
        assert_eq!(r.stats().triangles_culled, 1);
        assert!(r.stats().pixels_shaded > 0);
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        let white = |_: &[f32]| Rgba::WHITE;

        let tri = [vertex(0.0, 0.0, 0.5), vertex(2.0, 2.0, 0.5), vertex(4.0, 4.0, 0.5)];
        draw(&mut r, &mut targets, &white, &tri);
        assert_eq!(r.stats(), Default::default());
    }

    #[test]
    fn test_bounding_box_clamped_to_viewport() {
        let mut targets = FrameTargets::new(4, 4);
        let mut r = rasterizer(4);
        let white = |_: &[f32]| Rgba::WHITE;

        // Full-viewport quad from NDC corners: (-0.5, -0.5) .. (3.5, 3.5)
        let lo = -0.5;
        let hi = 3.5;
        let first = [vertex(lo, lo, 0.0), vertex(hi, lo, 0.0), vertex(hi, hi, 0.0)];
        let second = [vertex(lo, lo, 0.0), vertex(hi, hi, 0.0), vertex(lo, hi, 0.0)];
        draw(&mut r, &mut targets, &white, &first);
        draw(&mut r, &mut targets, &white, &second);

        assert!(targets.color.pixels().iter().all(|&p| p == Rgba::WHITE));
    }

    #[test]
    fn test_wireframe_draws_edges_only() {
        let mut targets = FrameTargets::new(16, 16);
        let mut r = rasterizer(16);
        r.set_fill_mode(FillMode::Wireframe);
        let white = |_: &[f32]| Rgba::WHITE;

        let tri = [vertex(0.0, 0.0, 0.5), vertex(10.0, 0.0, 0.5), vertex(0.0, 10.0, 0.5)];
        draw(&mut r, &mut targets, &white, &tri);

        assert_eq!(targets.color.pixel(5, 0), Some(Rgba::WHITE));
        assert_eq!(targets.color.pixel(0, 5), Some(Rgba::WHITE));
        assert_eq!(targets.color.pixel(5, 5), Some(Rgba::WHITE));
        assert_eq!(targets.color.pixel(2, 2), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_perspective_correct_attribute() {
        let mut targets = FrameTargets::new(32, 32);
        let mut r = rasterizer(32);
        r.set_interpolation(Interpolation::Perspective);
        let shader = |v: &[f32]| Rgba::from_f32(v[4], 0.0, 0.0, 1.0);

        // Right edge is three times further away than the left edge
        let a = [0.0, 0.0, 0.5, 1.0, 0.0];
        let b = [30.0, 0.0, 0.5, 1.0, 1.0];
        let c = [0.0, 30.0, 0.5, 1.0, 0.0];
        r.draw_triangle(
            &mut targets,
            &shader,
            [
                ScreenVertex::new(&a, 1.0),
                ScreenVertex::new(&b, 1.0 / 3.0),
                ScreenVertex::new(&c, 1.0),
            ],
        );
        // Screen midpoint of a-b sits a quarter of the way along in 3D
        let red = targets.color.pixel(15, 0).map(|c| c.r).unwrap();
        assert!((63..=65).contains(&red), "red = {red}");

        let mut affine_targets = FrameTargets::new(32, 32);
        r.set_interpolation(Interpolation::Affine);
        r.draw_triangle(
            &mut affine_targets,
            &shader,
            [
                ScreenVertex::new(&a, 1.0),
                ScreenVertex::new(&b, 1.0 / 3.0),
                ScreenVertex::new(&c, 1.0),
            ],
        );
        let red = affine_targets.color.pixel(15, 0).map(|c| c.r).unwrap();
        assert!((127..=128).contains(&red), "red = {red}");
    }
}
