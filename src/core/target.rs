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

//! Render targets
//!
//! A draw call writes into a [`FrameTargets`] pair: an RGBA8 color backbuffer
//! and a float depth buffer of the same size. Both are dense row-major
//! arrays indexed `y * width + x`; out-of-range coordinates are ignored on
//! write and read back as `None`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

/// Depth value a fresh depth buffer is filled with
pub const DEFAULT_CLEAR_DEPTH: f32 = 1.0;

/// 32-bit RGBA color
///
/// # Examples
///
/// ```
/// use softpipe::core::target::Rgba;
///
/// let color = Rgba::from_u32(0x11223344);
/// assert_eq!(color, Rgba::new(0x11, 0x22, 0x33, 0x44));
/// assert_eq!(color.to_u32(), 0x11223344);
/// ```
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Unpack `0xRRGGBBAA`
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: (value >> 24) as u8,
            g: (value >> 16) as u8,
            b: (value >> 8) as u8,
            a: value as u8,
        }
    }

    /// Pack as `0xRRGGBBAA`
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | self.a as u32
    }

    /// Convert normalized float channels, clamping each to `[0, 1]`
    ///
    /// NaN channels become 0.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        fn channel(v: f32) -> u8 {
            if v.is_nan() {
                return 0;
            }
            (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        }
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    /// Channel-wise blend: `self` at `t = 0`, `other` at `t = 1`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t + 0.5) as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// RGBA8 color backbuffer
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl ColorBuffer {
    /// Create a buffer filled with transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Write a pixel; out-of-range coordinates are ignored
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, row-major, for an external image encoder
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Per-pixel depth values
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DepthBuffer {
    /// Create a buffer filled with [`DEFAULT_CLEAR_DEPTH`]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![DEFAULT_CLEAR_DEPTH; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Depth at `(x, y)`
    #[inline]
    pub fn value_at(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.values[i])
    }

    /// Mutable depth at `(x, y)`
    #[inline]
    pub fn value(&mut self, x: i32, y: i32) -> Option<&mut f32> {
        self.index(x, y).map(move |i| &mut self.values[i])
    }

    /// Reset every pixel to `depth`
    pub fn set_all(&mut self, depth: f32) {
        self.values.fill(depth);
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Color and depth target of a draw call
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTargets {
    pub color: ColorBuffer,
    pub depth: DepthBuffer,
}

impl FrameTargets {
    /// Allocate a matching color/depth pair
    ///
    /// # Examples
    ///
    /// ```
    /// use softpipe::core::target::{FrameTargets, Rgba};
    ///
    /// let mut targets = FrameTargets::new(4, 4);
    /// targets.color.set_pixel(1, 2, Rgba::WHITE);
    /// assert_eq!(targets.color.pixel(1, 2), Some(Rgba::WHITE));
    /// assert_eq!(targets.depth.value_at(1, 2), Some(1.0));
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: ColorBuffer::new(width, height),
            depth: DepthBuffer::new(width, height),
        }
    }

    /// Pair existing buffers
    ///
    /// # Errors
    ///
    /// `TargetSizeMismatch` if the dimensions differ.
    pub fn from_parts(color: ColorBuffer, depth: DepthBuffer) -> Result<Self> {
        if color.width != depth.width || color.height != depth.height {
            return Err(PipelineError::TargetSizeMismatch {
                color_width: color.width,
                color_height: color.height,
                depth_width: depth.width,
                depth_height: depth.height,
            });
        }
        Ok(Self { color, depth })
    }

    pub fn width(&self) -> u32 {
        self.color.width
    }

    pub fn height(&self) -> u32 {
        self.color.height
    }

    /// Clear both targets
    pub fn clear(&mut self, color: Rgba, depth: f32) {
        self.color.clear(color);
        self.depth.set_all(depth);
    }

    /// Check the pair still agrees on its size
    pub(crate) fn validate(&self) -> Result<()> {
        if self.color.width != self.depth.width || self.color.height != self.depth.height {
            return Err(PipelineError::TargetSizeMismatch {
                color_width: self.color.width,
                color_height: self.color.height,
                depth_width: self.depth.width,
                depth_height: self.depth.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_from_f32_clamps() {
        assert_eq!(Rgba::from_f32(1.5, -0.2, 0.5, f32::NAN), Rgba::new(255, 0, 128, 0));
    }

    #[test]
    fn test_rgba_lerp_endpoints() {
        let a = Rgba::rgb(0, 100, 200);
        let b = Rgba::rgb(255, 0, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgba::rgb(128, 50, 100));
    }

    #[test]
    fn test_color_buffer_bounds() {
        let mut buffer = ColorBuffer::new(8, 4);
        buffer.set_pixel(-1, 0, Rgba::WHITE);
        buffer.set_pixel(8, 0, Rgba::WHITE);
        buffer.set_pixel(0, 4, Rgba::WHITE);
        assert!(buffer.pixels().iter().all(|&p| p == Rgba::TRANSPARENT));
        assert_eq!(buffer.pixel(8, 0), None);

        buffer.set_pixel(7, 3, Rgba::rgb(1, 2, 3));
        assert_eq!(buffer.pixel(7, 3), Some(Rgba::rgb(1, 2, 3)));
        let bytes = buffer.as_bytes();
        assert_eq!(bytes.len(), 8 * 4 * 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_depth_buffer_access() {
        let mut depth = DepthBuffer::new(2, 2);
        assert_eq!(depth.value_at(1, 1), Some(DEFAULT_CLEAR_DEPTH));
        if let Some(d) = depth.value(1, 1) {
            *d = 0.25;
        }
        assert_eq!(depth.value_at(1, 1), Some(0.25));
        assert!(depth.value(2, 0).is_none());

        depth.set_all(0.5);
        assert!(depth.values().iter().all(|&d| d == 0.5));
    }

    #[test]
    fn test_frame_targets_size_check() {
        let result = FrameTargets::from_parts(ColorBuffer::new(4, 4), DepthBuffer::new(4, 2));
        assert!(matches!(result, Err(PipelineError::TargetSizeMismatch { .. })));
    }
}
