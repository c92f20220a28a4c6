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

//! softpipe: A CPU software-rendering pipeline
//!
//! This crate turns indexed vertex streams into pixels: a user vertex
//! shader, clipping in homogeneous space, perspective divide and viewport
//! mapping, then line and triangle rasterization with a depth test and a
//! user pixel shader.
//!
//! # Architecture
//!
//! The pipeline is organized into the following modules:
//!
//! - [`core::buffer`]: Untyped, stride-addressed vertex buffers
//! - [`core::clip`]: Plane equations and homogeneous line/triangle clippers
//! - [`core::pso`]: Pipeline state object, shader traits, viewport
//! - [`core::raster`]: Bresenham lines, edge-function triangles, depth test
//! - [`core::target`]: Color and depth render targets
//! - [`core::pipeline`]: Draw-call orchestration
//! - [`core::config`]: TOML render configuration
//!
//! # Example
//!
//! ```
//! use softpipe::core::buffer::{VertexBuffer, VertexLayout};
//! use softpipe::core::pipeline::Pipeline;
//! use softpipe::core::pso::{PipelineStateObject, Viewport};
//! use softpipe::core::target::{FrameTargets, Rgba};
//!
//! // Input: x, y. Output: clip-space position
//! let layout = VertexLayout::new(8, 16)?;
//! let mut pso = PipelineStateObject::new(layout, Viewport::full(64, 64));
//! pso.set_vertex_shader(|input: &[f32], output: &mut [f32]| {
//!     output[0] = input[0];
//!     output[1] = input[1];
//!     output[3] = 1.0;
//! });
//! pso.set_pixel_shader(|_: &[f32]| Rgba::rgb(255, 128, 0));
//!
//! let vertices = VertexBuffer::from_floats(vec![-0.5, -0.5, 0.5, -0.5, 0.0, 0.5]);
//! let mut targets = FrameTargets::new(64, 64);
//! let stats = Pipeline::new().draw_instance(&pso, &[0, 1, 2], &vertices, &mut targets)?;
//! assert!(stats.pixels_shaded > 0);
//! # Ok::<(), softpipe::PipelineError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an alias for
//! `Result<T, PipelineError>`. Geometry that clips away is not an error.

pub mod core;

// Re-export commonly used types
pub use core::error::{PipelineError, Result};
pub use core::pipeline::{DrawStats, Pipeline};
pub use core::pso::PipelineStateObject;
