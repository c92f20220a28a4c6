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

//! Antialiased debug lines
//!
//! Xiaolin Wu's algorithm: the ideal line is sampled once per major-axis
//! column and its coverage is split between the two pixels straddling the
//! ideal minor-axis position, weighted by the fractional part. Coverage
//! blends a foreground over a background color; the existing contents of
//! the target are not read. Not part of the shaded path: no pixel shader,
//! no depth test.

use super::Rasterizer;
use crate::core::target::{ColorBuffer, Rgba};

/// Slopes with a major-axis extent below this are drawn as a point
const MIN_EXTENT: f32 = 1e-3;

impl Rasterizer {
    /// Draw an antialiased line with sub-pixel endpoints
    ///
    /// # Arguments
    ///
    /// * `target` - Color buffer to draw into
    /// * `from` - Start point in pixel coordinates
    /// * `to` - End point in pixel coordinates
    /// * `foreground` - Color at full coverage
    /// * `background` - Color at zero coverage
    pub fn draw_line_antialiased(
        &self,
        target: &mut ColorBuffer,
        from: (f32, f32),
        to: (f32, f32),
        foreground: Rgba,
        background: Rgba,
    ) {
        let (mut x0, mut y0) = from;
        let (mut x1, mut y1) = to;

        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let gradient = if dx < MIN_EXTENT { 0.0 } else { (y1 - y0) / dx };

        let mut plot = |major: i32, minor: i32, coverage: f32| {
            let (x, y) = if steep { (minor, major) } else { (major, minor) };
            if self.in_clip_rect(x, y) {
                target.set_pixel(x, y, background.lerp(foreground, coverage));
            }
        };

        // First endpoint
        let x_end = x0.round();
        let y_end = y0 + gradient * (x_end - x0);
        let x_gap = 1.0 - (x0 + 0.5).fract();
        let x_first = x_end as i32;
        let fraction = y_end - y_end.floor();
        plot(x_first, y_end.floor() as i32, (1.0 - fraction) * x_gap);
        plot(x_first, y_end.floor() as i32 + 1, fraction * x_gap);
        let first_y = y_end;

        // Second endpoint
        let x_end = x1.round();
        let y_end = y1 + gradient * (x_end - x1);
        let x_gap = (x1 + 0.5).fract();
        let x_last = x_end as i32;
        if x_last != x_first {
            let fraction = y_end - y_end.floor();
            plot(x_last, y_end.floor() as i32, (1.0 - fraction) * x_gap);
            plot(x_last, y_end.floor() as i32 + 1, fraction * x_gap);
        }

        // Body, limited to the clip rect along the major axis
        let (left, right, bottom, top) = self.clip_rect();
        let (low, high) = if steep { (bottom, top) } else { (left, right) };
        let body_start = x_first.saturating_add(1).max(low);
        let body_end = x_last.min(high.saturating_add(1));
        let mut inter_y = first_y + gradient * (body_start - x_first) as f32;
        for major in body_start..body_end {
            let minor = inter_y.floor();
            let fraction = inter_y - minor;
            plot(major, minor as i32, 1.0 - fraction);
            plot(major, minor as i32 + 1, fraction);
            inter_y += gradient;
        }
    }
}
