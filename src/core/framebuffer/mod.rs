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

//! Virtual framebuffer cache
//!
//! PSP games render into framebuffers identified only by a VRAM address and
//! pixel format. The [`FramebufferManager`] maps those addresses onto backend
//! render targets: it creates a target the first time an address is drawn
//! to, grows it when a larger area is drawn, ages out targets nobody uses,
//! reads pixels back into guest memory when the game needs them, and picks
//! what to present each frame.
//!
//! # Entry Lifecycle
//!
//! ```text
//! Absent -> Created -> [Resized]* -> Evicted | Invalidated | Destroyed
//! ```
//!
//! # Pin Window
//!
//! The displayed framebuffer and the two displayed before it are never
//! evicted, so double and triple buffering keep their targets alive even
//! when a buffer is skipped for a few frames.
//!
//! # Example
//!
//! ```
//! use pspge::core::config::BackendConfig;
//! use pspge::core::framebuffer::headless::HeadlessBackend;
//! use pspge::core::framebuffer::{BufferFormat, FramebufferManager, RenderRequest};
//! use pspge::core::memory::PspMemory;
//!
//! let mut backend = HeadlessBackend::default();
//! let mut memory = PspMemory::new();
//! let mut manager = FramebufferManager::new(&BackendConfig::default());
//!
//! let request = RenderRequest::new(0x0000_0000, BufferFormat::Rgba8888, 480, 272);
//! let id = manager.set_render_framebuffer(&mut backend, &request).unwrap();
//!
//! manager.set_display_framebuffer(0x0400_0000, 512, BufferFormat::Rgba8888);
//! manager.copy_display_to_output(&mut backend, &memory);
//! manager.decimate_framebuffers(&mut backend, &mut memory);
//!
//! assert_eq!(manager.pin_window().display, Some(id));
//! manager.device_lost(&mut backend);
//! assert!(manager.is_empty());
//! ```

mod aging;
pub mod backend;
pub mod convert;
mod display;
pub mod headless;
mod readback;
pub mod types;

#[cfg(test)]
mod tests;

pub use backend::{ChannelOrder, OwnedTarget, PixelBuffer, PresentSource, RenderBackend, TargetHandle};
pub use types::{
    masked_equal, BufferFormat, ColorDepth, DisplayRequest, FramebufferId, FramebufferInfo,
    PinWindow, RenderRequest, UsageFlags, VirtualFramebuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    FB_ADDRESS_MASK, FB_RAW_ADDRESS_MASK, VRAM_BASE,
};

use crate::core::config::BackendConfig;
use crate::core::error::{FramebufferError, Result};
use std::collections::{HashMap, HashSet};

/// Registry of virtual framebuffers
pub struct FramebufferManager {
    config: BackendConfig,

    /// Framebuffers the GE has rendered into
    framebuffers: Vec<VirtualFramebuffer>,

    /// Logical-size copies used to read upscaled targets back
    staging: Vec<VirtualFramebuffer>,

    /// Copy destination (masked) -> framebuffer address it was copied from
    known_copies: HashMap<u32, u32>,

    current_render: Option<FramebufferId>,
    pins: PinWindow,

    /// Skips redundant texture binds; invalidated by every resize or destroy
    last_bound_texture: Option<FramebufferId>,

    display: DisplayRequest,

    /// Number of frames presented
    frame: u32,

    /// Last frame any framebuffer was drawn into or sampled
    frame_last_used: u32,

    next_id: u32,

    /// Output resolution changed; drop everything at the end of the frame
    resized: bool,

    /// Addresses already reported as missing a render target
    reported_missing: HashSet<u32>,
}

impl FramebufferManager {
    /// Create an empty registry
    ///
    /// # Arguments
    ///
    /// * `config` - Render scale, color depth and eviction policy
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            config: config.clone(),
            framebuffers: Vec::new(),
            staging: Vec::new(),
            known_copies: HashMap::new(),
            current_render: None,
            pins: PinWindow::default(),
            last_bound_texture: None,
            display: DisplayRequest::default(),
            frame: 0,
            frame_last_used: 0,
            next_id: 1,
            resized: false,
            reported_missing: HashSet::new(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Number of frames presented so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Frame of the most recent framebuffer activity; ages are relative to it
    pub fn frame_last_used(&self) -> u32 {
        self.frame_last_used
    }

    pub fn current_render_target(&self) -> Option<FramebufferId> {
        self.current_render
    }

    pub fn pin_window(&self) -> PinWindow {
        self.pins
    }

    pub fn display_request(&self) -> DisplayRequest {
        self.display
    }

    /// Number of framebuffers (staging copies excluded)
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    /// Number of staging copies
    pub fn staging_len(&self) -> usize {
        self.staging.len()
    }

    /// Framebuffer address a copy destination was recorded for
    pub fn known_copy_source(&self, destination: u32) -> Option<u32> {
        self.known_copies.get(&(destination & FB_ADDRESS_MASK)).copied()
    }

    pub fn get(&self, id: FramebufferId) -> Option<&VirtualFramebuffer> {
        self.framebuffers.iter().find(|fb| fb.id == id)
    }

    /// Most recently rendered framebuffer at `address`
    pub fn framebuffer_at(&self, address: u32) -> Option<&VirtualFramebuffer> {
        self.framebuffers
            .iter()
            .filter(|fb| masked_equal(fb.fb_address, address))
            .max_by_key(|fb| fb.last_frame_render)
    }

    /// Staging copies, for inspection
    pub fn staging(&self) -> &[VirtualFramebuffer] {
        &self.staging
    }

    fn index_of(&self, id: FramebufferId) -> Option<usize> {
        self.framebuffers.iter().position(|fb| fb.id == id)
    }

    fn require(&self, id: FramebufferId) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| FramebufferError::UnknownFramebuffer(id.0).into())
    }

    fn allocate_id(&mut self) -> FramebufferId {
        let id = FramebufferId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Backend depth for a guest format under the current policy
    fn color_depth_for(&self, format: BufferFormat) -> ColorDepth {
        if self.config.true_color {
            ColorDepth::Rgba8888
        } else {
            format.into()
        }
    }

    fn report_missing_target(&mut self, address: u32) {
        if self.reported_missing.insert(address) {
            log::warn!("{}", FramebufferError::MissingRenderTarget { address });
        }
    }

    /// Select (creating or growing if needed) the framebuffer to draw into
    ///
    /// # Arguments
    ///
    /// * `backend` - Rendering backend
    /// * `request` - Address, format and drawn size
    ///
    /// # Returns
    ///
    /// The id of the now-current framebuffer. A framebuffer whose target
    /// could not be created is still tracked, with a null target.
    pub fn set_render_framebuffer(
        &mut self,
        backend: &mut dyn RenderBackend,
        request: &RenderRequest,
    ) -> Result<FramebufferId> {
        let address = request.fb_address & FB_RAW_ADDRESS_MASK;
        self.frame_last_used = self.frame;

        let existing = self
            .framebuffers
            .iter()
            .position(|fb| masked_equal(fb.fb_address, address) && fb.format == request.format);

        let index = match existing {
            Some(index) => {
                let (id, grow, reshape) = {
                    let fb = &mut self.framebuffers[index];
                    fb.fb_stride = request.fb_stride;
                    fb.z_address = request.z_address;
                    fb.z_stride = request.z_stride;
                    fb.width = request.width;
                    fb.height = request.height;
                    let grow =
                        fb.buffer_width < request.width || fb.buffer_height < request.height;
                    let reshape = request.force
                        && (fb.buffer_width != request.width
                            || fb.buffer_height != request.height);
                    (fb.id, grow, reshape)
                };

                if grow || reshape {
                    self.resize_entry(backend, index, request.width, request.height, request.force);
                } else if self.current_render != Some(id) {
                    self.last_bound_texture = None;
                    match self.framebuffers[index].target.handle() {
                        Some(handle) if self.config.buffered_rendering => {
                            backend.bind_as_render_target(handle)
                        }
                        _ => backend.unbind(),
                    }
                    log::debug!("Switching render target to {:08x}", address);
                }
                index
            }
            None => self.create_entry(backend, address, request),
        };

        let frame = self.frame;
        let fb = &mut self.framebuffers[index];
        fb.usage |= UsageFlags::RENDER_TARGET;
        fb.last_frame_render = frame;
        fb.memory_updated = false;
        fb.dirty_after_display = true;
        fb.really_dirty_after_display = true;

        let id = fb.id;
        self.current_render = Some(id);
        Ok(id)
    }

    fn create_entry(
        &mut self,
        backend: &mut dyn RenderBackend,
        address: u32,
        request: &RenderRequest,
    ) -> usize {
        let id = self.allocate_id();
        let scale = self.config.render_scale;
        let mut fb = VirtualFramebuffer {
            id,
            fb_address: address,
            fb_stride: request.fb_stride,
            z_address: request.z_address,
            z_stride: request.z_stride,
            format: request.format,
            width: request.width,
            height: request.height,
            buffer_width: request.width,
            buffer_height: request.height,
            render_width: request.width * scale,
            render_height: request.height * scale,
            color_depth: self.color_depth_for(request.format),
            usage: UsageFlags::RENDER_TARGET,
            last_frame_render: self.frame,
            last_frame_used: 0,
            dirty_after_display: true,
            really_dirty_after_display: true,
            memory_updated: false,
            target: OwnedTarget::null(),
        };

        log::info!(
            "Creating framebuffer for {:08x} : {} x {} x {}",
            address,
            fb.width,
            fb.height,
            fb.format
        );

        self.last_bound_texture = None;
        if self.config.buffered_rendering {
            match backend.create_color_target(fb.render_width, fb.render_height, fb.color_depth) {
                Ok(handle) => {
                    fb.target = OwnedTarget::new(handle);
                    backend.bind_as_render_target(handle);
                    backend.clear();
                }
                Err(e) => log::error!("Error creating render target for {:08x}: {}", address, e),
            }
        } else {
            backend.unbind();
        }

        self.framebuffers.push(fb);
        self.framebuffers.len() - 1
    }

    /// Grow (or with `force`, reshape) a framebuffer's backing target
    ///
    /// The render scale factor of the entry is preserved.
    ///
    /// # Errors
    ///
    /// `UnknownFramebuffer` if `id` is not tracked.
    pub fn resize_framebuffer(
        &mut self,
        backend: &mut dyn RenderBackend,
        id: FramebufferId,
        width: u32,
        height: u32,
        force: bool,
    ) -> Result<()> {
        let index = self.require(id)?;
        self.resize_entry(backend, index, width, height, force);
        Ok(())
    }

    fn resize_entry(
        &mut self,
        backend: &mut dyn RenderBackend,
        index: usize,
        width: u32,
        height: u32,
        force: bool,
    ) {
        let buffered = self.config.buffered_rendering;
        let depth = self.color_depth_for(self.framebuffers[index].format);
        let fb = &mut self.framebuffers[index];

        let width_factor = fb.render_width as f32 / fb.buffer_width.max(1) as f32;
        let height_factor = fb.render_height as f32 / fb.buffer_height.max(1) as f32;

        if force {
            fb.buffer_width = width;
            fb.buffer_height = height;
        } else {
            if fb.buffer_width >= width && fb.buffer_height >= height {
                return;
            }
            // Never shrink either side.
            fb.buffer_width = fb.buffer_width.max(width);
            fb.buffer_height = fb.buffer_height.max(height);
        }

        fb.render_width = (fb.buffer_width as f32 * width_factor) as u32;
        fb.render_height = (fb.buffer_height as f32 * height_factor) as u32;
        fb.color_depth = depth;

        self.last_bound_texture = None;
        backend.unbind();

        if !buffered {
            fb.target.release(backend);
            return;
        }

        log::info!(
            "Resizing framebuffer for {:08x} : {} x {} x {}",
            fb.fb_address,
            fb.buffer_width,
            fb.buffer_height,
            fb.format
        );

        let result = match fb.target.take() {
            Some(old) => backend.resize_or_recreate(old, fb.render_width, fb.render_height, depth),
            None => backend.create_color_target(fb.render_width, fb.render_height, depth),
        };
        match result {
            Ok(handle) => {
                fb.target = OwnedTarget::new(handle);
                backend.bind_as_render_target(handle);
                backend.clear();
            }
            Err(e) => log::error!(
                "Error resizing render target for {:08x} to {} x {}: {}",
                fb.fb_address,
                fb.render_width,
                fb.render_height,
                e
            ),
        }
    }

    /// Bind a framebuffer for sampling
    ///
    /// Stamps the entry as used this frame. Binding the same framebuffer
    /// twice in a row reaches the backend once.
    ///
    /// # Errors
    ///
    /// `UnknownFramebuffer` if `id` is not tracked.
    pub fn bind_framebuffer_as_texture(
        &mut self,
        backend: &mut dyn RenderBackend,
        id: FramebufferId,
        unit: u32,
    ) -> Result<()> {
        let index = self.require(id)?;
        self.frame_last_used = self.frame;

        let frame = self.frame;
        let fb = &mut self.framebuffers[index];
        fb.last_frame_used = frame;
        fb.usage |= UsageFlags::TEXTURE;
        let address = fb.fb_address;

        match fb.target.handle() {
            None => self.report_missing_target(address),
            Some(_) if self.last_bound_texture == Some(id) => {}
            Some(handle) => {
                backend.bind_as_texture(handle, unit);
                self.last_bound_texture = Some(id);
            }
        }
        Ok(())
    }

    /// Record a guest memory copy out of a framebuffer
    ///
    /// When `src` is a framebuffer and `size` matches its byte size, later
    /// attempts to display `dst` show that framebuffer instead.
    ///
    /// # Returns
    ///
    /// Always `false`: the caller still performs the copy.
    pub fn notify_framebuffer_copy(&mut self, src: u32, dst: u32, size: usize) -> bool {
        for fb in &self.framebuffers {
            if masked_equal(fb.fb_address, src) && size == fb.byte_size() {
                log::debug!(
                    "Framebuffer {:08x} copied to {:08x} ({} bytes)",
                    fb.fb_address,
                    dst,
                    size
                );
                self.known_copies.insert(dst & FB_ADDRESS_MASK, fb.fb_address);
            }
        }
        false
    }

    /// Remove the framebuffer at `index` and release its target
    fn destroy_at(&mut self, backend: &mut dyn RenderBackend, index: usize) {
        let mut fb = self.framebuffers.remove(index);
        self.forget(fb.id);
        fb.target.release(backend);
    }

    /// Wipe every reference to `id`
    fn forget(&mut self, id: FramebufferId) {
        if self.current_render == Some(id) {
            self.current_render = None;
        }
        if self.last_bound_texture == Some(id) {
            self.last_bound_texture = None;
        }
        self.pins.forget(id);
    }

    /// Destroy every framebuffer and staging copy
    pub fn destroy_all(&mut self, backend: &mut dyn RenderBackend) {
        backend.unbind();
        self.current_render = None;
        self.last_bound_texture = None;
        self.pins.clear();

        for mut fb in self.framebuffers.drain(..).chain(self.staging.drain(..)) {
            log::info!(
                "Destroying framebuffer for {:08x} : {} x {} x {}",
                fb.fb_address,
                fb.width,
                fb.height,
                fb.format
            );
            fb.target.release(backend);
        }
    }

    /// The backend lost its resources; drop every entry
    pub fn device_lost(&mut self, backend: &mut dyn RenderBackend) {
        self.destroy_all(backend);
        self.resized = false;
    }

    /// The output resolution changed; entries are dropped at [`end_frame`](Self::end_frame)
    pub fn resized(&mut self) {
        self.resized = true;
    }

    pub fn end_frame(&mut self, backend: &mut dyn RenderBackend) {
        if self.resized {
            self.destroy_all(backend);
            self.resized = false;
        }
    }

    /// Describe every framebuffer and staging copy
    pub fn framebuffer_list(&self) -> Vec<FramebufferInfo> {
        self.framebuffers
            .iter()
            .map(|fb| fb.info(false))
            .chain(self.staging.iter().map(|fb| fb.info(true)))
            .collect()
    }
}
