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

//! Backend configuration
//!
//! Settings that select decoder steps and framebuffer policies. Loaded from a
//! TOML file; every field is optional and falls back to its default.
//!
//! # Example
//!
//! ```
//! use pspge::core::config::BackendConfig;
//!
//! let config = BackendConfig::from_toml_str("render_scale = 2\ntrue_color = false").unwrap();
//! assert_eq!(config.render_scale, 2);
//! assert!(!config.true_color);
//! assert_eq!(config.eviction_threshold, 5);
//! ```

use crate::core::error::{GeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of frames a framebuffer may stay unused before eviction
pub const DEFAULT_EVICTION_THRESHOLD: u32 = 5;

/// Default capacity of the decoded vertex scratch buffer, in vertices
pub const DEFAULT_SCRATCH_VERTICES: usize = 65536;

/// Rendering backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Apply the texture scale/offset to UVs while decoding
    pub prescale_uv: bool,

    /// HD remaster titles store 16-bit UVs at double scale
    pub double_texture_coordinates: bool,

    /// Keep 16-bit normals and positions as integers in the decoded layout
    pub integer_s16_attributes: bool,

    /// Render target upscaling factor (1 = native 480x272)
    pub render_scale: u32,

    /// Always allocate 8888 render targets regardless of guest format
    pub true_color: bool,

    /// Render into backend targets instead of straight to the output
    pub buffered_rendering: bool,

    /// Read the displayed framebuffer back to guest memory when stale
    pub readback_displayed: bool,

    /// Frames of inactivity before a framebuffer is evicted
    pub eviction_threshold: u32,

    /// Capacity of the decoded vertex scratch buffer, in vertices
    pub scratch_vertices: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            prescale_uv: false,
            double_texture_coordinates: false,
            integer_s16_attributes: true,
            render_scale: 1,
            true_color: true,
            buffered_rendering: true,
            readback_displayed: true,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            scratch_vertices: DEFAULT_SCRATCH_VERTICES,
        }
    }
}

impl BackendConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BackendConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.render_scale == 0 {
            return Err(GeError::Config("render_scale must be at least 1".into()));
        }
        if self.scratch_vertices == 0 {
            return Err(GeError::Config(
                "scratch_vertices must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
