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

//! Error types for the rendering pipeline
//!
//! Only configuration problems are errors. Geometry that clips away, lines of
//! zero length and zero-area triangles are normal outcomes and simply produce
//! no pixels.

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline configuration and resource errors
///
/// Returned before any pixel of the affected draw call is touched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Vertex buffer size is not a multiple of 4 bytes
    #[error("buffer size {size} is not a multiple of 4 bytes")]
    UnalignedBufferSize { size: usize },

    /// Stride is zero or not a multiple of 4 bytes
    #[error("invalid stride {stride}: must be a non-zero multiple of 4 bytes")]
    InvalidStride { stride: usize },

    /// Shader output stride cannot hold the homogeneous position
    #[error("stride {stride} is smaller than the minimum of {minimum} bytes")]
    StrideTooSmall { stride: usize, minimum: usize },

    /// Buffer size is not a whole number of records
    #[error("buffer of {size} bytes does not hold a whole number of {stride}-byte records")]
    BufferLayoutMismatch { size: usize, stride: usize },

    /// Typed view record size differs from the declared stride
    #[error("record type is {record} bytes but the layout stride is {stride} bytes")]
    RecordSizeMismatch { stride: usize, record: usize },

    /// No vertex shader bound to the pipeline state
    #[error("no vertex shader bound")]
    MissingVertexShader,

    /// No pixel shader bound to the pipeline state
    #[error("no pixel shader bound")]
    MissingPixelShader,

    /// Index references a vertex past the end of the buffer
    #[error("index {index} out of range for {count} vertices")]
    IndexOutOfRange { index: u32, count: usize },

    /// Index count does not form whole primitives
    #[error("{indices} indices do not form whole primitives of {per_primitive} vertices")]
    IncompletePrimitive { indices: usize, per_primitive: usize },

    /// Viewport rectangle is inverted or exceeds the render target
    #[error(
        "viewport (left={left}, right={right}, bottom={bottom}, top={top}) does not fit a {width}x{height} target"
    )]
    ViewportOutOfBounds {
        left: u32,
        right: u32,
        bottom: u32,
        top: u32,
        width: u32,
        height: u32,
    },

    /// Color and depth targets have different dimensions
    #[error("color target is {color_width}x{color_height} but depth target is {depth_width}x{depth_height}")]
    TargetSizeMismatch {
        color_width: u32,
        color_height: u32,
        depth_width: u32,
        depth_height: u32,
    },

    /// Render configuration could not be parsed or serialized
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure while reading or writing configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
