// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Shared fixtures for framebuffer tests

use super::super::headless::HeadlessBackend;
use super::super::*;
use crate::core::config::BackendConfig;
use crate::core::memory::PspMemory;

/// Size in bytes of a full-screen 8888 framebuffer
pub const SCREEN_BYTES: usize = (DISPLAY_WIDTH * DISPLAY_HEIGHT * 4) as usize;

/// Second framebuffer address, right after a full-screen 8888 buffer
pub const SECOND_FB: u32 = 0x0008_8000;

pub struct Fixture {
    pub manager: FramebufferManager,
    pub backend: HeadlessBackend,
    pub memory: PspMemory,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self {
            manager: FramebufferManager::new(&config),
            backend: HeadlessBackend::default(),
            memory: PspMemory::new(),
        }
    }

    /// Render a full-screen 8888 framebuffer at `address`
    pub fn render(&mut self, address: u32) -> FramebufferId {
        self.render_request(&RenderRequest::new(
            address,
            BufferFormat::Rgba8888,
            DISPLAY_WIDTH,
            DISPLAY_HEIGHT,
        ))
    }

    pub fn render_request(&mut self, request: &RenderRequest) -> FramebufferId {
        self.manager
            .set_render_framebuffer(&mut self.backend, request)
            .unwrap()
    }

    /// Display `address`, present and run the eviction sweep
    pub fn flip(&mut self, address: u32) -> usize {
        self.manager
            .set_display_framebuffer(address, 512, BufferFormat::Rgba8888);
        self.manager
            .copy_display_to_output(&mut self.backend, &self.memory);
        self.manager
            .decimate_framebuffers(&mut self.backend, &mut self.memory)
    }

    pub fn target(&self, id: FramebufferId) -> TargetHandle {
        self.manager.get(id).unwrap().target.handle().unwrap()
    }

    pub fn fill(&mut self, id: FramebufferId, rgba: [u8; 4]) {
        let target = self.target(id);
        self.backend.fill(target, rgba).unwrap();
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.manager.device_lost(&mut self.backend);
    }
}

/// Read `len` bytes of guest memory
pub fn guest_bytes(memory: &PspMemory, address: u32, len: usize) -> Vec<u8> {
    use crate::core::memory::GuestMemory;
    memory.slice(address, len).unwrap().to_vec()
}
