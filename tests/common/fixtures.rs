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

//! Test fixtures for common test scenarios

use pspge::core::config::BackendConfig;
use pspge::core::framebuffer::headless::HeadlessBackend;
use pspge::core::framebuffer::{BufferFormat, FramebufferId, FramebufferManager, RenderRequest};
use pspge::core::memory::PspMemory;
use std::fs;
use std::path::{Path, PathBuf};

/// Little-endian bytes of f32 values
#[allow(dead_code)]
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Little-endian bytes of i16 values
#[allow(dead_code)]
pub fn i16_bytes(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Write a TOML config into `dir`
#[allow(dead_code)]
pub fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("pspge.toml");
    fs::write(&path, text).expect("Failed to write config");
    path
}

/// Framebuffer cache wired to a headless backend and flat guest memory
#[allow(dead_code)]
pub struct Gpu {
    pub manager: FramebufferManager,
    pub backend: HeadlessBackend,
    pub memory: PspMemory,
}

#[allow(dead_code)]
impl Gpu {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            manager: FramebufferManager::new(config),
            backend: HeadlessBackend::default(),
            memory: PspMemory::new(),
        }
    }

    /// Draw a full-screen 8888 frame into `address`
    pub fn draw(&mut self, address: u32) -> FramebufferId {
        let request = RenderRequest::new(address, BufferFormat::Rgba8888, 480, 272);
        self.manager
            .set_render_framebuffer(&mut self.backend, &request)
            .expect("Failed to set render framebuffer")
    }

    /// Show `address` and finish the frame
    pub fn present(&mut self, address: u32) {
        self.manager
            .set_display_framebuffer(address, 480, BufferFormat::Rgba8888);
        self.manager
            .copy_display_to_output(&mut self.backend, &self.memory);
        self.manager
            .decimate_framebuffers(&mut self.backend, &mut self.memory);
        self.manager.end_frame(&mut self.backend);
    }
}
