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

//! Pipeline benchmarks: triangle clipping, triangle fill and a full draw

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use softpipe::core::buffer::{VertexBuffer, VertexLayout};
use softpipe::core::clip::{clip_triangle, DepthRange, PlaneEquation};
use softpipe::core::pipeline::Pipeline;
use softpipe::core::pso::{PipelineStateObject, Viewport};
use softpipe::core::raster::{Rasterizer, ScreenVertex};
use softpipe::core::target::{FrameTargets, Rgba};

fn bench_clip(c: &mut Criterion) {
    let planes = PlaneEquation::frustum(DepthRange::NegativeOneToOne);
    // Straddles the left, right and top planes
    let a = [-2.0, -0.5, 0.0, 1.0, 1.0, 0.0, 0.0];
    let b = [2.0, -0.5, 0.0, 1.0, 0.0, 1.0, 0.0];
    let t = [0.0, 3.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    let mut out = Vec::with_capacity(64);

    c.bench_function("clip_triangle_frustum", |bench| {
        bench.iter(|| {
            out.clear();
            black_box(clip_triangle([&a, &b, &t], black_box(&planes), &mut out))
        })
    });
}

fn bench_fill(c: &mut Criterion) {
    let mut targets = FrameTargets::new(256, 256);
    let mut rasterizer = Rasterizer::new();
    rasterizer.set_viewport(Viewport::full(256, 256));
    let shader = |v: &[f32]| Rgba::from_f32(v[4], v[5], v[6], 1.0);

    let a = [10.0, 10.0, 0.5, 1.0, 1.0, 0.0, 0.0];
    let b = [240.0, 30.0, 0.5, 1.0, 0.0, 1.0, 0.0];
    let t = [120.0, 245.0, 0.5, 1.0, 0.0, 0.0, 1.0];

    c.bench_function("fill_triangle_256", |bench| {
        bench.iter(|| {
            targets.depth.set_all(1.0);
            rasterizer.draw_triangle(
                &mut targets,
                &shader,
                [
                    ScreenVertex::new(&a, 1.0),
                    ScreenVertex::new(&b, 1.0),
                    ScreenVertex::new(&t, 1.0),
                ],
            );
        })
    });
}

fn bench_draw(c: &mut Criterion) {
    let layout = VertexLayout::new(16, 16).unwrap();
    let mut pso = PipelineStateObject::new(layout, Viewport::full(256, 256));
    pso.set_vertex_shader(|input: &[f32], output: &mut [f32]| output.copy_from_slice(input));
    pso.set_pixel_shader(|_: &[f32]| Rgba::WHITE);

    // A strip of triangles, half of them partly off screen
    let mut floats = Vec::new();
    let mut indices = Vec::new();
    for i in 0..64u32 {
        let x = -1.5 + i as f32 * 0.05;
        floats.extend_from_slice(&[x, -1.2, 0.1, 1.0, x + 0.3, -1.2, 0.1, 1.0, x, 1.2, 0.1, 1.0]);
        indices.extend_from_slice(&[3 * i, 3 * i + 1, 3 * i + 2]);
    }
    let vertices = VertexBuffer::from_floats(floats);
    let mut targets = FrameTargets::new(256, 256);
    let mut pipeline = Pipeline::new();

    c.bench_function("draw_instance_64_triangles", |bench| {
        bench.iter(|| {
            targets.clear(Rgba::BLACK, 1.0);
            black_box(
                pipeline
                    .draw_instance(&pso, &indices, &vertices, &mut targets)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_clip, bench_fill, bench_draw);
criterion_main!(benches);
