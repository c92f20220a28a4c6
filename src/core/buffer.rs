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

//! Generic vertex buffers
//!
//! Vertex data flows through the pipeline as an untyped arena of 4-byte
//! elements. There is no static vertex type: every stage addresses records by
//! index and a runtime stride, and the only thing the pipeline knows about a
//! shader-output record is that its first four floats are the homogeneous
//! position `(x, y, z, w)`.
//!
//! # Layout
//!
//! ```text
//! record i  = elements[i * stride / 4 .. (i + 1) * stride / 4]
//! output    = [x, y, z, w, attr0, attr1, ...]
//! ```
//!
//! Typed access goes through [`VertexBuffer::view`], which checks the record
//! size against the stride and the buffer length once, up front.

use bytemuck::Pod;

use super::error::{PipelineError, Result};

/// Size of one buffer element in bytes
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f32>();

/// Size of the homogeneous position that starts every shader-output record
pub const POSITION_SIZE: usize = 4 * ELEMENT_SIZE;

/// Number of floats in the homogeneous position
pub const POSITION_FLOATS: usize = 4;

/// Check that a stride is usable for element access
///
/// # Errors
///
/// `InvalidStride` when the stride is zero or not a multiple of 4 bytes.
pub fn validate_stride(stride: usize) -> Result<()> {
    if stride == 0 || stride % ELEMENT_SIZE != 0 {
        return Err(PipelineError::InvalidStride { stride });
    }
    Ok(())
}

/// Byte strides of the vertex stream before and after the vertex shader
///
/// # Examples
///
/// ```
/// use softpipe::core::buffer::VertexLayout;
///
/// // 3 floats in (position), position + RGB out
/// let layout = VertexLayout::new(12, 28).unwrap();
/// assert_eq!(layout.attribute_count(), 3);
/// assert_eq!(layout.output_floats(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    input_stride: usize,
    output_stride: usize,
}

impl VertexLayout {
    /// Create a layout from the input and shader-output strides
    ///
    /// # Errors
    ///
    /// - `InvalidStride` if either stride is zero or not 4-byte aligned
    /// - `StrideTooSmall` if the output stride cannot hold the position
    pub fn new(input_stride: usize, output_stride: usize) -> Result<Self> {
        validate_stride(input_stride)?;
        validate_stride(output_stride)?;
        if output_stride < POSITION_SIZE {
            return Err(PipelineError::StrideTooSmall {
                stride: output_stride,
                minimum: POSITION_SIZE,
            });
        }
        Ok(Self {
            input_stride,
            output_stride,
        })
    }

    /// Input record stride in bytes
    pub fn input_stride(&self) -> usize {
        self.input_stride
    }

    /// Shader-output record stride in bytes
    pub fn output_stride(&self) -> usize {
        self.output_stride
    }

    /// Floats per input record
    pub fn input_floats(&self) -> usize {
        self.input_stride / ELEMENT_SIZE
    }

    /// Floats per shader-output record
    pub fn output_floats(&self) -> usize {
        self.output_stride / ELEMENT_SIZE
    }

    /// Number of opaque attributes trailing the position
    pub fn attribute_count(&self) -> usize {
        (self.output_stride - POSITION_SIZE) / ELEMENT_SIZE
    }
}

/// Untyped, 4-byte aligned vertex storage
///
/// The buffer is a flat arena; the caller decides the stride of every access.
/// Buffers are moved between pipeline stages, never shared, so a stage's
/// input and output can never alias.
///
/// # Examples
///
/// ```
/// use softpipe::core::buffer::VertexBuffer;
///
/// let buffer = VertexBuffer::new(32).unwrap();
/// assert_eq!(buffer.element_count(), 8);
/// assert_eq!(buffer.element(1, 16), &[0.0; 4]);
///
/// assert!(VertexBuffer::new(30).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
}

impl VertexBuffer {
    /// Allocate a zero-filled buffer of `size_bytes`
    ///
    /// # Errors
    ///
    /// `UnalignedBufferSize` if `size_bytes` is not a multiple of 4.
    pub fn new(size_bytes: usize) -> Result<Self> {
        if size_bytes % ELEMENT_SIZE != 0 {
            return Err(PipelineError::UnalignedBufferSize { size: size_bytes });
        }
        Ok(Self {
            data: vec![0.0; size_bytes / ELEMENT_SIZE],
        })
    }

    /// Wrap an existing float vector
    pub fn from_floats(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Copy a slice of plain-old-data records into a new buffer
    ///
    /// # Errors
    ///
    /// `UnalignedBufferSize` if the record type is not a multiple of 4 bytes.
    pub fn from_records<T: Pod>(records: &[T]) -> Result<Self> {
        let record = std::mem::size_of::<T>();
        if record % ELEMENT_SIZE != 0 {
            return Err(PipelineError::UnalignedBufferSize {
                size: std::mem::size_of_val(records),
            });
        }
        Ok(Self {
            data: bytemuck::pod_collect_to_vec(records),
        })
    }

    /// Total size in bytes (always a multiple of 4)
    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * ELEMENT_SIZE
    }

    /// Number of 4-byte elements
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    /// Number of whole records of `stride` bytes
    pub fn record_count(&self, stride: usize) -> usize {
        self.size_in_bytes() / stride
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record `index` at `stride` bytes spacing
    ///
    /// # Panics
    ///
    /// Panics if the stride is not 4-byte aligned or the record lies outside
    /// the buffer. Both are caller bugs; strides are validated by
    /// [`VertexLayout`] before the pipeline touches a buffer.
    #[inline]
    pub fn element(&self, index: usize, stride: usize) -> &[f32] {
        assert!(stride % ELEMENT_SIZE == 0, "stride {stride} is not 4-byte aligned");
        let floats = stride / ELEMENT_SIZE;
        &self.data[index * floats..(index + 1) * floats]
    }

    /// Mutable record `index` at `stride` bytes spacing
    ///
    /// # Panics
    ///
    /// Same conditions as [`VertexBuffer::element`].
    #[inline]
    pub fn element_mut(&mut self, index: usize, stride: usize) -> &mut [f32] {
        assert!(stride % ELEMENT_SIZE == 0, "stride {stride} is not 4-byte aligned");
        let floats = stride / ELEMENT_SIZE;
        &mut self.data[index * floats..(index + 1) * floats]
    }

    /// Iterate over whole records of `stride` bytes
    pub fn records(&self, stride: usize) -> std::slice::ChunksExact<'_, f32> {
        assert!(stride % ELEMENT_SIZE == 0 && stride > 0, "invalid stride {stride}");
        self.data.chunks_exact(stride / ELEMENT_SIZE)
    }

    /// Mutable iteration over whole records of `stride` bytes
    pub fn records_mut(&mut self, stride: usize) -> std::slice::ChunksExactMut<'_, f32> {
        assert!(stride % ELEMENT_SIZE == 0 && stride > 0, "invalid stride {stride}");
        self.data.chunks_exact_mut(stride / ELEMENT_SIZE)
    }

    /// Append one record
    pub fn push_record(&mut self, record: &[f32]) {
        self.data.extend_from_slice(record);
    }

    pub fn as_floats(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes of the arena
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Typed view over the whole buffer
    ///
    /// # Errors
    ///
    /// - `InvalidStride` if `stride` is not a non-zero multiple of 4
    /// - `RecordSizeMismatch` if `T` is not exactly `stride` bytes or needs
    ///   stricter alignment than 4
    /// - `BufferLayoutMismatch` if the buffer is not a whole number of records
    ///
    /// # Examples
    ///
    /// ```
    /// use bytemuck::{Pod, Zeroable};
    /// use softpipe::core::buffer::VertexBuffer;
    ///
    /// #[repr(C)]
    /// #[derive(Clone, Copy, Pod, Zeroable)]
    /// struct Position {
    ///     x: f32,
    ///     y: f32,
    /// }
    ///
    /// let buffer = VertexBuffer::from_floats(vec![1.0, 2.0, 3.0, 4.0]);
    /// let view = buffer.view::<Position>(8).unwrap();
    /// assert_eq!(view.len(), 2);
    /// assert_eq!(view.get(1).map(|p| p.y), Some(4.0));
    /// ```
    pub fn view<T: Pod>(&self, stride: usize) -> Result<VertexView<'_, T>> {
        validate_stride(stride)?;
        let record = std::mem::size_of::<T>();
        if record != stride {
            return Err(PipelineError::RecordSizeMismatch { stride, record });
        }
        if self.size_in_bytes() % stride != 0 {
            return Err(PipelineError::BufferLayoutMismatch {
                size: self.size_in_bytes(),
                stride,
            });
        }
        let records = bytemuck::try_cast_slice::<f32, T>(&self.data)
            .map_err(|_| PipelineError::RecordSizeMismatch { stride, record })?;
        Ok(VertexView { records })
    }
}

/// Validated, typed window over a [`VertexBuffer`]
#[derive(Debug, Clone, Copy)]
pub struct VertexView<'a, T> {
    records: &'a [T],
}

impl<'a, T> VertexView<'a, T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct ColoredVertex {
        position: [f32; 3],
        color: [f32; 3],
    }

    #[test]
    fn test_new_rejects_unaligned_size() {
        assert!(matches!(
            VertexBuffer::new(10),
            Err(PipelineError::UnalignedBufferSize { size: 10 })
        ));
        let buffer = VertexBuffer::new(12).unwrap();
        assert_eq!(buffer.element_count(), 3);
        assert_eq!(buffer.size_in_bytes(), 12);
    }

    #[test]
    fn test_element_access_by_stride() {
        let mut buffer = VertexBuffer::from_floats((0..12).map(|i| i as f32).collect());
        assert_eq!(buffer.element(0, 12), &[0.0, 1.0, 2.0]);
        assert_eq!(buffer.element(2, 16), &[8.0, 9.0, 10.0, 11.0]);

        buffer.element_mut(1, 24)[0] = 99.0;
        assert_eq!(buffer.as_floats()[6], 99.0);
    }

    #[test]
    fn test_push_record_grows_buffer() {
        let mut buffer = VertexBuffer::default();
        assert!(buffer.is_empty());

        buffer.push_record(&[1.0, 2.0, 3.0, 1.0]);
        buffer.push_record(&[4.0, 5.0, 6.0, 1.0]);
        assert_eq!(buffer.record_count(16), 2);
        assert_eq!(buffer.size_in_bytes(), 32);
        assert_eq!(buffer.element(1, 16), &[4.0, 5.0, 6.0, 1.0]);
    }

    #[test]
    #[should_panic]
    fn test_element_unaligned_stride_panics() {
        let buffer = VertexBuffer::new(16).unwrap();
        let _ = buffer.element(0, 6);
    }

    #[test]
    fn test_from_records_round_trips_through_view() {
        let vertices = [
            ColoredVertex {
                position: [0.0, 1.0, 2.0],
                color: [1.0, 0.0, 0.0],
            },
            ColoredVertex {
                position: [3.0, 4.0, 5.0],
                color: [0.0, 1.0, 0.0],
            },
        ];
        let buffer = VertexBuffer::from_records(&vertices).unwrap();
        assert_eq!(buffer.size_in_bytes(), 48);
        assert_eq!(buffer.element(1, 24), &[3.0, 4.0, 5.0, 0.0, 1.0, 0.0]);

        let view = buffer.view::<ColoredVertex>(24).unwrap();
        assert_eq!(view.as_slice(), &vertices);
    }

    #[test]
    fn test_view_validates_stride_and_length() {
        let buffer = VertexBuffer::from_floats(vec![0.0; 7]);
        assert!(matches!(
            buffer.view::<ColoredVertex>(28),
            Err(PipelineError::RecordSizeMismatch { stride: 28, record: 24 })
        ));
        assert!(matches!(
            buffer.view::<ColoredVertex>(24),
            Err(PipelineError::BufferLayoutMismatch { size: 28, stride: 24 })
        ));
        assert!(matches!(
            buffer.view::<ColoredVertex>(0),
            Err(PipelineError::InvalidStride { stride: 0 })
        ));
    }

    #[test]
    fn test_layout_validation() {
        assert!(VertexLayout::new(12, 16).is_ok());
        assert!(matches!(
            VertexLayout::new(10, 16),
            Err(PipelineError::InvalidStride { stride: 10 })
        ));
        assert!(matches!(
            VertexLayout::new(12, 8),
            Err(PipelineError::StrideTooSmall { stride: 8, minimum: 16 })
        ));

        let layout = VertexLayout::new(24, 32).unwrap();
        assert_eq!(layout.input_floats(), 6);
        assert_eq!(layout.output_floats(), 8);
        assert_eq!(layout.attribute_count(), 4);
    }

    #[test]
    fn test_records_iterates_whole_records() {
        let buffer = VertexBuffer::from_floats((0..8).map(|i| i as f32).collect());
        let firsts: Vec<f32> = buffer.records(16).map(|r| r[0]).collect();
        assert_eq!(firsts, vec![0.0, 4.0]);
        assert_eq!(buffer.record_count(16), 2);
        assert_eq!(buffer.as_bytes().len(), 32);
    }
}
