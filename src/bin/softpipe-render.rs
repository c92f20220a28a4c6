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

//! softpipe demo renderer
//!
//! Renders a small test scene through the software pipeline: a vertex
//! colored cube, a checkered ground plane that reaches behind the camera
//! (exercising near-plane clipping) and a line grid, plus a debug frame.
//! The finished backbuffer can be dumped as raw RGBA8.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use glam::{Mat4, Vec3, Vec4};

use softpipe::core::buffer::{VertexBuffer, VertexLayout};
use softpipe::core::config::RenderConfig;
use softpipe::core::pipeline::{DrawStats, Pipeline};
use softpipe::core::pso::{FillMode, PipelineStateObject, Topology};
use softpipe::core::target::{FrameTargets, Rgba};

/// softpipe - CPU software renderer demo
#[derive(Parser, Debug)]
#[command(name = "softpipe-render", version, about = "Render a test scene on the CPU")]
struct Args {
    /// Path to a TOML render config (default: $SOFTPIPE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target width, overriding the config
    #[arg(long)]
    width: Option<u32>,

    /// Target height, overriding the config
    #[arg(long)]
    height: Option<u32>,

    /// Draw triangles as wireframe
    #[arg(short, long)]
    wireframe: bool,

    /// Write the backbuffer as raw RGBA8 to this file
    #[arg(long)]
    raw_output: Option<PathBuf>,

    /// Write the effective config to this file
    #[arg(long)]
    write_config: Option<PathBuf>,
}

/// Cube corner `i`: bit 0 = x, bit 1 = y, bit 2 = z
fn cube_vertices() -> Vec<f32> {
    let mut floats = Vec::with_capacity(8 * 6);
    for i in 0..8u32 {
        let corner = |bit: u32| if i & bit != 0 { 1.0 } else { -1.0 };
        let (x, y, z) = (corner(1), corner(2), corner(4));
        // Color from position
        floats.extend_from_slice(&[x, y, z, (x + 1.0) * 0.5, (y + 1.0) * 0.5, (z + 1.0) * 0.5]);
    }
    floats
}

/// Counter-clockwise when seen from outside
const CUBE_INDICES: [u32; 36] = [
    4, 5, 7, 4, 7, 6, // +z
    1, 0, 2, 1, 2, 3, // -z
    5, 1, 3, 5, 3, 7, // +x
    0, 4, 6, 0, 6, 2, // -x
    6, 7, 3, 6, 3, 2, // +y
    0, 1, 5, 0, 5, 4, // -y
];

const GROUND_HEIGHT: f32 = -1.01;
const GROUND_EXTENT: f32 = 20.0;
const GRID_EXTENT: i32 = 10;

fn log_stats(name: &str, stats: &DrawStats) {
    log::info!(
        "{}: {} vertices, {} -> {} primitives, {} culled, {} pixels ({} depth rejected)",
        name,
        stats.vertices_shaded,
        stats.primitives_submitted,
        stats.primitives_clipped,
        stats.primitives_culled,
        stats.pixels_shaded,
        stats.pixels_depth_rejected
    );
}

fn draw_cube(
    pipeline: &mut Pipeline,
    config: &RenderConfig,
    view_proj: Mat4,
    targets: &mut FrameTargets,
) -> softpipe::Result<DrawStats> {
    // In: position + RGB. Out: clip position + RGB
    let layout = VertexLayout::new(24, 28)?;
    let mut pso = PipelineStateObject::new(layout, config.viewport());
    config.apply(&mut pso);
    pso.topology = Topology::TriangleList;

    pso.set_vertex_shader(move |input: &[f32], output: &mut [f32]| {
        let clip = view_proj * Vec4::new(input[0], input[1], input[2], 1.0);
        output[..4].copy_from_slice(&clip.to_array());
        output[4..7].copy_from_slice(&input[3..6]);
    });
    pso.set_pixel_shader(|v: &[f32]| Rgba::from_f32(v[4], v[5], v[6], 1.0));

    let vertices = VertexBuffer::from_floats(cube_vertices());
    pipeline.draw_instance(&pso, &CUBE_INDICES, &vertices, targets)
}

fn draw_ground(
    pipeline: &mut Pipeline,
    config: &RenderConfig,
    view_proj: Mat4,
    targets: &mut FrameTargets,
) -> softpipe::Result<DrawStats> {
    // In: position. Out: clip position + world x, z
    let layout = VertexLayout::new(12, 24)?;
    let mut pso = PipelineStateObject::new(layout, config.viewport());
    config.apply(&mut pso);
    pso.topology = Topology::TriangleList;

    pso.set_vertex_shader(move |input: &[f32], output: &mut [f32]| {
        let clip = view_proj * Vec4::new(input[0], input[1], input[2], 1.0);
        output[..4].copy_from_slice(&clip.to_array());
        output[4] = input[0];
        output[5] = input[2];
    });
    pso.set_pixel_shader(|v: &[f32]| {
        let checker = (v[4].floor() as i32 + v[5].floor() as i32) & 1;
        if checker == 0 {
            Rgba::rgb(90, 90, 100)
        } else {
            Rgba::rgb(50, 50, 60)
        }
    });

    let e = GROUND_EXTENT;
    let h = GROUND_HEIGHT;
    let vertices = VertexBuffer::from_floats(vec![
        -e, h, e, //
        e, h, e, //
        e, h, -e, //
        -e, h, -e,
    ]);
    pipeline.draw_instance(&pso, &[0, 1, 2, 0, 2, 3], &vertices, targets)
}

fn draw_grid(
    pipeline: &mut Pipeline,
    config: &RenderConfig,
    view_proj: Mat4,
    targets: &mut FrameTargets,
) -> softpipe::Result<DrawStats> {
    let layout = VertexLayout::new(12, 16)?;
    let mut pso = PipelineStateObject::new(layout, config.viewport());
    config.apply(&mut pso);
    pso.topology = Topology::LineList;

    pso.set_vertex_shader(move |input: &[f32], output: &mut [f32]| {
        let clip = view_proj * Vec4::new(input[0], input[1], input[2], 1.0);
        output.copy_from_slice(&clip.to_array());
    });
    pso.set_pixel_shader(|_: &[f32]| Rgba::rgb(200, 200, 80));

    let y = GROUND_HEIGHT + 0.005;
    let n = GRID_EXTENT as f32;
    let mut floats = Vec::new();
    for i in (-GRID_EXTENT..=GRID_EXTENT).step_by(2) {
        let t = i as f32;
        floats.extend_from_slice(&[t, y, -n, t, y, n]);
        floats.extend_from_slice(&[-n, y, t, n, y, t]);
    }
    let vertices = VertexBuffer::from_floats(floats);
    let indices: Vec<u32> = (0..vertices.record_count(12) as u32).collect();
    pipeline.draw_instance(&pso, &indices, &vertices, targets)
}

fn main() -> Result<(), Box<dyn Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    log::info!("Starting softpipe-render...");

    let mut config = match RenderConfig::resolve_path(args.config.clone()) {
        Some(path) => {
            log::info!("Config: {}", path.display());
            RenderConfig::load(&path)?
        }
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if args.wireframe {
        config.pipeline.fill_mode = FillMode::Wireframe;
    }
    if args.width.is_some() || args.height.is_some() {
        // A configured viewport may not fit the new size
        config.viewport = None;
    }
    config.validate()?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        log::info!("Wrote config to {}", path.display());
    }

    log::info!(
        "Target {}x{}, fill {:?}, cull {:?}, depth {:?}",
        config.width,
        config.height,
        config.pipeline.fill_mode,
        config.pipeline.cull_face,
        config.pipeline.depth_func
    );

    let aspect = config.width as f32 / config.height.max(1) as f32;
    let projection = Mat4::perspective_rh_gl(60f32.to_radians(), aspect, 0.5, 50.0);
    let view = Mat4::look_at_rh(Vec3::new(3.0, 2.5, 5.0), Vec3::ZERO, Vec3::Y);
    let view_proj = projection * view;

    let mut targets = config.create_targets();
    let mut pipeline = Pipeline::new();

    let stats = draw_ground(&mut pipeline, &config, view_proj, &mut targets)?;
    log_stats("Ground", &stats);
    let stats = draw_grid(&mut pipeline, &config, view_proj, &mut targets)?;
    log_stats("Grid", &stats);
    let stats = draw_cube(&mut pipeline, &config, view_proj, &mut targets)?;
    log_stats("Cube", &stats);

    // Viewport frame and a horizon marker on top of everything
    let viewport = config.viewport();
    let (l, r, b, t) = (
        viewport.left as i32,
        viewport.right as i32,
        viewport.bottom as i32,
        viewport.top as i32,
    );
    let rasterizer = pipeline.rasterizer();
    let frame = Rgba::rgb(255, 255, 255);
    rasterizer.draw_debug_line(&mut targets.color, (l, b), (r, b), frame);
    rasterizer.draw_debug_line(&mut targets.color, (r, b), (r, t), frame);
    rasterizer.draw_debug_line(&mut targets.color, (l, t), (r, t), frame);
    rasterizer.draw_debug_line(&mut targets.color, (l, t), (l, b), frame);
    let horizon = (b + t) as f32 * 0.5 + 0.25;
    rasterizer.draw_line_antialiased(
        &mut targets.color,
        (l as f32, horizon),
        (r as f32, horizon + 0.5),
        Rgba::rgb(255, 64, 64),
        config.clear_color,
    );

    if let Some(path) = &args.raw_output {
        std::fs::write(path, targets.color.as_bytes())?;
        log::info!(
            "Wrote {}x{} RGBA8 backbuffer to {}",
            targets.width(),
            targets.height(),
            path.display()
        );
    }

    Ok(())
}
