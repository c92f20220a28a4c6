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

//! Render configuration
//!
//! [`RenderConfig`] is the on-disk form of a render setup: target size,
//! viewport, fixed-function pipeline switches, debug options and clear
//! values. Stored as TOML; every field has a default, so a partial file is
//! valid.
//!
//! ```toml
//! width = 640
//! height = 480
//! clear_depth = 1.0
//!
//! [clear_color]
//! r = 16
//! g = 16
//! b = 24
//! a = 255
//!
//! [pipeline]
//! cull_face = "cw"
//! fill_mode = "solid"
//! depth_func = "less_equal"
//!
//! [debug]
//! validate_clip_output = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::clip::DepthRange;
use super::error::{PipelineError, Result};
use super::pso::{
    CullFace, DebugOptions, DepthFunc, FillMode, Interpolation, PipelineStateObject, Topology,
    Viewport,
};
use super::target::{FrameTargets, Rgba, DEFAULT_CLEAR_DEPTH};

/// Environment variable naming the default configuration file
pub const CONFIG_ENV_VAR: &str = "SOFTPIPE_CONFIG";

/// Fixed-function switches copied into a [`PipelineStateObject`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub topology: Topology,
    pub cull_face: CullFace,
    pub fill_mode: FillMode,
    pub depth_func: DepthFunc,
    pub depth_write: bool,
    pub depth_range: DepthRange,
    pub interpolation: Interpolation,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topology: Topology::default(),
            cull_face: CullFace::default(),
            fill_mode: FillMode::default(),
            depth_func: DepthFunc::default(),
            depth_write: true,
            depth_range: DepthRange::default(),
            interpolation: Interpolation::default(),
        }
    }
}

/// Complete render setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    pub clear_depth: f32,
    /// Viewport rectangle; the whole target when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    pub clear_color: Rgba,
    pub pipeline: PipelineConfig,
    pub debug: DebugOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            clear_depth: DEFAULT_CLEAR_DEPTH,
            viewport: None,
            clear_color: Rgba::BLACK,
            pipeline: PipelineConfig::default(),
            debug: DebugOptions::default(),
        }
    }
}

impl RenderConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Config` if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded render config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_toml_string()?;
        std::fs::write(path.as_ref(), contents)?;
        log::debug!("Saved render config to {}", path.as_ref().display());
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Configuration path from an explicit argument or [`CONFIG_ENV_VAR`]
    pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    /// Effective viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
            .unwrap_or_else(|| Viewport::full(self.width, self.height))
    }

    /// Check the viewport against the target size
    pub fn validate(&self) -> Result<()> {
        self.viewport().validate(self.width, self.height)
    }

    /// Copy the pipeline switches, viewport and debug options into a PSO
    pub fn apply(&self, pso: &mut PipelineStateObject) {
        let p = &self.pipeline;
        pso.topology = p.topology;
        pso.cull_face = p.cull_face;
        pso.fill_mode = p.fill_mode;
        pso.depth_func = p.depth_func;
        pso.depth_write = p.depth_write;
        pso.depth_range = p.depth_range;
        pso.interpolation = p.interpolation;
        pso.debug = self.debug;
        pso.set_viewport(self.viewport());
    }

    /// Allocate targets of the configured size, cleared to the clear values
    pub fn create_targets(&self) -> FrameTargets {
        let mut targets = FrameTargets::new(self.width, self.height);
        targets.clear(self.clear_color, self.clear_depth);
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::VertexLayout;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = RenderConfig::from_toml_str(
            r#"
            width = 32
            [pipeline]
            cull_face = "ccw"
            depth_func = "greater"
            "#,
        )
        .unwrap();

        assert_eq!(config.width, 32);
        assert_eq!(config.height, 480);
        assert_eq!(config.pipeline.cull_face, CullFace::Ccw);
        assert_eq!(config.pipeline.depth_func, DepthFunc::Greater);
        assert!(config.pipeline.depth_write);
        assert_eq!(config.viewport(), Viewport::new(0, 31, 0, 479));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = RenderConfig::from_toml_str("width = \"wide\"");
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");

        let config = RenderConfig {
            width: 100,
            height: 50,
            viewport: Some(Viewport::new(10, 89, 5, 44)),
            clear_color: Rgba::rgb(1, 2, 3),
            pipeline: PipelineConfig {
                fill_mode: FillMode::Wireframe,
                interpolation: Interpolation::Affine,
                depth_range: DepthRange::ZeroToOne,
                ..Default::default()
            },
            debug: DebugOptions {
                validate_clip_output: true,
                trace_primitives: false,
            },
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenderConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_apply_to_pso() {
        let config = RenderConfig {
            width: 64,
            height: 64,
            pipeline: PipelineConfig {
                cull_face: CullFace::Cw,
                depth_write: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let layout = VertexLayout::new(16, 16).unwrap();
        let mut pso = PipelineStateObject::new(layout, Viewport::full(8, 8));
        config.apply(&mut pso);

        assert_eq!(pso.cull_face, CullFace::Cw);
        assert!(!pso.depth_write);
        assert_eq!(pso.viewport(), Viewport::full(64, 64));
    }

    #[test]
    fn test_create_targets_cleared() {
        let config = RenderConfig {
            width: 4,
            height: 2,
            clear_color: Rgba::rgb(7, 7, 7),
            clear_depth: 0.5,
            ..Default::default()
        };
        let targets = config.create_targets();
        assert_eq!(targets.color.pixel(3, 1), Some(Rgba::rgb(7, 7, 7)));
        assert_eq!(targets.depth.value_at(0, 0), Some(0.5));
    }
}
