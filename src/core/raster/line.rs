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

//! Line rasterization
//!
//! Both the shaded line and the flat debug line walk the major axis with an
//! integer Bresenham DDA. Steep segments are handled by swapping the axes,
//! and segments running toward negative `x` by swapping the endpoints, so
//! the walk always advances one column at a time.

use super::{pixel_index, Rasterizer, ScreenVertex};
use crate::core::pso::PixelShader;
use crate::core::target::{ColorBuffer, FrameTargets, Rgba};

/// Integer Bresenham walk between two pixels
///
/// Yields `(x, y, u)` for every pixel of the segment. `u` is `1` at the
/// first pixel and falls by `1 / dx` per step to `0` at the last; it
/// weights the walk's end endpoint, so the attributes run from
/// end-weighted to start-weighted along the walk.
#[derive(Debug, Clone)]
pub struct LineWalk {
    x: i32,
    x_end: i32,
    y: i32,
    y_step: i32,
    dx: i32,
    dy: i32,
    error: i32,
    steep: bool,
    reversed: bool,
}

impl LineWalk {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        let (x0, y0, x1, y1) = if steep {
            (y0, x0, y1, x1)
        } else {
            (x0, y0, x1, y1)
        };
        let reversed = x0 > x1;
        let (x0, y0, x1, y1) = if reversed {
            (x1, y1, x0, y0)
        } else {
            (x0, y0, x1, y1)
        };

        Self {
            x: x0,
            x_end: x1,
            y: y0,
            y_step: if y0 < y1 { 1 } else { -1 },
            dx: x1 - x0,
            dy: (y1 - y0).abs(),
            error: 0,
            steep,
            reversed,
        }
    }

    /// Whether the walk starts at the second endpoint
    pub fn reversed(&self) -> bool {
        self.reversed
    }
}

impl Iterator for LineWalk {
    type Item = (i32, i32, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x > self.x_end {
            return None;
        }

        let u = if self.dx == 0 {
            1.0
        } else {
            (self.x_end - self.x) as f32 / self.dx as f32
        };
        let item = if self.steep {
            (self.y, self.x, u)
        } else {
            (self.x, self.y, u)
        };

        self.error += 2 * self.dy;
        if self.error > self.dx {
            self.y += self.y_step;
            self.error -= 2 * self.dx;
        }
        self.x += 1;

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.x_end - self.x + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LineWalk {}

impl Rasterizer {
    /// Rasterize a shaded, depth-tested line
    ///
    /// Endpoints are rounded to the nearest pixel centre. Every pixel gets
    /// the endpoint records blended by the walk weight `u`: the walk's end
    /// endpoint weighted `u`, its start endpoint `1 - u`. The first pixel
    /// therefore carries the end endpoint's attributes. The pixel is then
    /// depth tested and on success runs the pixel shader.
    ///
    /// # Arguments
    ///
    /// * `targets` - Color and depth targets
    /// * `shader` - Pixel shader
    /// * `a` - First endpoint
    /// * `b` - Second endpoint
    pub fn draw_line(
        &mut self,
        targets: &mut FrameTargets,
        shader: &dyn PixelShader,
        a: ScreenVertex<'_>,
        b: ScreenVertex<'_>,
    ) {
        let walk = LineWalk::new(
            pixel_index(a.x()),
            pixel_index(a.y()),
            pixel_index(b.x()),
            pixel_index(b.y()),
        );

        if self.trace_primitives {
            log::trace!(
                "Line: ({:.2}, {:.2}, {:.3}) -> ({:.2}, {:.2}, {:.3}), {} pixels",
                a.x(),
                a.y(),
                a.z(),
                b.x(),
                b.y(),
                b.z(),
                walk.len()
            );
        }

        let endpoints = if walk.reversed() { [b, a] } else { [a, b] };
        for (x, y, u) in walk {
            if !self.in_clip_rect(x, y) {
                continue;
            }
            self.interpolate(&endpoints, &[1.0 - u, u]);
            self.shade_fragment(targets, shader, x, y);
        }
    }

    /// Draw a flat-colored line, bypassing shaders and the depth buffer
    ///
    /// Used for overlays such as grids and bounding boxes.
    ///
    /// # Arguments
    ///
    /// * `target` - Color buffer to draw into
    /// * `from` - Start pixel
    /// * `to` - End pixel (inclusive)
    /// * `color` - Line color
    pub fn draw_debug_line(
        &self,
        target: &mut ColorBuffer,
        from: (i32, i32),
        to: (i32, i32),
        color: Rgba,
    ) {
        for (x, y, _) in LineWalk::new(from.0, from.1, to.0, to.1) {
            if self.in_clip_rect(x, y) {
                target.set_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pso::DepthFunc;

    fn rasterizer(size: i32) -> Rasterizer {
        let mut rasterizer = Rasterizer::new();
        rasterizer.set_clip_rect(0, size - 1, 0, size - 1);
        rasterizer
    }

    fn touched(targets: &FrameTargets) -> Vec<(i32, i32)> {
        let mut pixels = Vec::new();
        for y in 0..targets.height() as i32 {
            for x in 0..targets.width() as i32 {
                if targets.color.pixel(x, y) != Some(Rgba::TRANSPARENT) {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }

    #[test]
    fn test_horizontal_line_pixels() {
        let mut targets = FrameTargets::new(16, 16);
        let mut r = rasterizer(16);
        let white = |_: &[f32]| Rgba::WHITE;

        let a = [0.0, 5.0, 0.0, 1.0];
        let b = [10.0, 5.0, 0.0, 1.0];
        r.draw_line(&mut targets, &white, ScreenVertex::new(&a, 1.0), ScreenVertex::new(&b, 1.0));

        let expected: Vec<_> = (0..=10).map(|x| (x, 5)).collect();
        assert_eq!(touched(&targets), expected);
        assert_eq!(r.stats().pixels_shaded, 11);
    }

    #[test]
    fn test_walk_weights() {
        let walk: Vec<_> = LineWalk::new(0, 0, 4, 2).collect();
        assert_eq!(walk.len(), 5);
        assert_eq!(walk[0], (0, 0, 1.0));
        assert_eq!(walk[2].2, 0.5);
        assert_eq!(walk[4], (4, 2, 0.0));
    }

    #[test]
    fn test_steep_and_reversed_walks_cover_same_pixels() {
        let forward: Vec<_> = LineWalk::new(1, 1, 4, 9).map(|(x, y, _)| (x, y)).collect();
        let mut backward: Vec<_> = LineWalk::new(4, 9, 1, 1).map(|(x, y, _)| (x, y)).collect();
        backward.sort_by_key(|p| p.1);
        assert_eq!(forward.len(), 9);
        assert_eq!(forward.first(), Some(&(1, 1)));
        assert_eq!(forward.last(), Some(&(4, 9)));
        assert_eq!(forward, backward);
        assert!(LineWalk::new(4, 9, 1, 1).reversed());
    }

    #[test]
    fn test_single_point_line() {
        let walk: Vec<_> = LineWalk::new(3, 3, 3, 3).collect();
        assert_eq!(walk, vec![(3, 3, 1.0)]);
    }

    #[test]
    fn test_line_attributes_run_from_second_to_first_endpoint() {
        let mut targets = FrameTargets::new(16, 16);
        let mut r = rasterizer(16);
        let shader = |v: &[f32]| Rgba::from_f32(v[4], 0.0, 0.0, 1.0);

        let a = [0.0, 0.0, 0.0, 1.0, 0.0];
        let b = [8.0, 0.0, 0.0, 1.0, 1.0];
        r.draw_line(&mut targets, &shader, ScreenVertex::new(&a, 1.0), ScreenVertex::new(&b, 1.0));

        assert_eq!(targets.color.pixel(0, 0).map(|c| c.r), Some(255));
        assert_eq!(targets.color.pixel(4, 0).map(|c| c.r), Some(128));
        assert_eq!(targets.color.pixel(8, 0).map(|c| c.r), Some(0));
    }

    #[test]
    fn test_reversed_line_weights_walk_end() {
        let mut targets = FrameTargets::new(16, 16);
        let mut r = rasterizer(16);
        let shader = |v: &[f32]| Rgba::from_f32(v[4], 0.0, 0.0, 1.0);

        // Drawn right to left: the walk starts at b and ends at a
        let a = [8.0, 1.0, 0.0, 1.0, 1.0];
        let b = [0.0, 1.0, 0.0, 1.0, 0.0];
        r.draw_line(&mut targets, &shader, ScreenVertex::new(&a, 1.0), ScreenVertex::new(&b, 1.0));

        assert_eq!(targets.color.pixel(0, 1).map(|c| c.r), Some(255));
        assert_eq!(targets.color.pixel(8, 1).map(|c| c.r), Some(0));
    }

    #[test]
    fn test_line_depth_test() {
        let mut targets = FrameTargets::new(8, 8);
        let mut r = rasterizer(8);
        r.set_depth_func(DepthFunc::Less);
        let red = |_: &[f32]| Rgba::rgb(255, 0, 0);
        let blue = |_: &[f32]| Rgba::rgb(0, 0, 255);

        let near = [[0.0, 2.0, 0.2, 1.0], [7.0, 2.0, 0.2, 1.0]];
        let far = [[0.0, 2.0, 0.8, 1.0], [7.0, 2.0, 0.8, 1.0]];
        r.draw_line(&mut targets, &red, ScreenVertex::new(&near[0], 1.0), ScreenVertex::new(&near[1], 1.0));
        r.draw_line(&mut targets, &blue, ScreenVertex::new(&far[0], 1.0), ScreenVertex::new(&far[1], 1.0));

        assert_eq!(targets.color.pixel(3, 2), Some(Rgba::rgb(255, 0, 0)));
        let depth = targets.depth.value_at(3, 2).unwrap();
        assert!((depth - 0.2).abs() < 1e-6);
        assert_eq!(r.stats().pixels_depth_rejected, 8);
    }

    #[test]
    fn test_line_clipped_to_rect() {
        let mut targets = FrameTargets::new(16, 16);
        let mut r = Rasterizer::new();
        r.set_clip_rect(4, 7, 0, 15);
        let white = |_: &[f32]| Rgba::WHITE;

        let a = [0.0, 1.0, 0.0, 1.0];
        let b = [15.0, 1.0, 0.0, 1.0];
        r.draw_line(&mut targets, &white, ScreenVertex::new(&a, 1.0), ScreenVertex::new(&b, 1.0));
        assert_eq!(touched(&targets), vec![(4, 1), (5, 1), (6, 1), (7, 1)]);
    }

    #[test]
    fn test_debug_line() {
        let mut targets = FrameTargets::new(8, 8);
        let r = rasterizer(8);
        r.draw_debug_line(&mut targets.color, (0, 0), (7, 7), Rgba::WHITE);
        let diagonal: Vec<_> = (0..8).map(|i| (i, i)).collect();
        assert_eq!(touched(&targets), diagonal);
        // Depth untouched
        assert!(targets.depth.values().iter().all(|&d| d == 1.0));
    }
}
