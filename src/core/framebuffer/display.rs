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

//! Display selection and guest memory invalidation

use super::backend::{ChannelOrder, PixelBuffer, PresentSource, RenderBackend};
use super::convert;
use super::types::{
    masked_equal, BufferFormat, DisplayRequest, FramebufferId, UsageFlags, DISPLAY_HEIGHT,
    DISPLAY_WIDTH, FB_ADDRESS_MASK, VRAM_BASE,
};
use super::FramebufferManager;
use crate::core::error::Result;
use crate::core::memory::GuestMemory;

/// Uncached mirror bit of guest addresses
const UNCACHED_BIT: u32 = 0x4000_0000;

impl FramebufferManager {
    /// Record what the guest wants displayed
    ///
    /// # Arguments
    ///
    /// * `address` - Guest address of the display buffer
    /// * `stride` - Row pitch in pixels
    /// * `format` - Pixel format of the display buffer
    pub fn set_display_framebuffer(&mut self, address: u32, stride: u32, format: BufferFormat) {
        if self.display.address != address {
            log::debug!("Display framebuffer {:08x} stride {} {}", address, stride, format);
        }
        self.display = DisplayRequest {
            address,
            stride,
            format,
        };
    }

    /// Framebuffer whose address matches, most recently rendered first
    fn find_at(&self, address: u32) -> Option<FramebufferId> {
        self.framebuffer_at(address).map(|fb| fb.id)
    }

    /// Present the display framebuffer for this frame
    ///
    /// Falls back to a recorded copy source, then to drawing guest memory
    /// directly. Invalid display addresses present a cleared output. Ends the
    /// frame: the frame counter advances on every path.
    pub fn copy_display_to_output(
        &mut self,
        backend: &mut dyn RenderBackend,
        memory: &dyn GuestMemory,
    ) {
        backend.unbind();
        self.current_render = None;

        if self.resized {
            backend.clear();
        }

        let request = self.display;
        let found = self.find_at(request.address).or_else(|| {
            if !memory.is_valid_address(request.address) {
                return None;
            }
            self.known_copies
                .get(&(request.address & FB_ADDRESS_MASK))
                .and_then(|&source| self.find_at(source))
        });

        match found {
            Some(id) => self.present_framebuffer(backend, id),
            None if memory.is_valid_address(request.address) => {
                match read_guest_pixels(
                    memory,
                    request.address,
                    request.stride,
                    DISPLAY_WIDTH,
                    DISPLAY_HEIGHT,
                    request.format,
                ) {
                    Ok(pixels) => backend.present(PresentSource::Pixels(&pixels)),
                    Err(e) => {
                        log::debug!("Cannot draw display from memory at {:08x}: {}", request.address, e);
                        backend.clear();
                    }
                }
            }
            None => {
                log::debug!("Found no framebuffer to display at {:08x}", request.address);
                backend.clear();
            }
        }

        self.frame = self.frame.wrapping_add(1);
    }

    fn present_framebuffer(&mut self, backend: &mut dyn RenderBackend, id: FramebufferId) {
        self.pins.rotate(id);

        let Some(index) = self.index_of(id) else {
            return;
        };
        let fb = &mut self.framebuffers[index];
        fb.usage |= UsageFlags::DISPLAYED;
        fb.dirty_after_display = false;
        fb.really_dirty_after_display = false;

        match fb.target.handle() {
            Some(handle) => backend.present(PresentSource::Target(handle)),
            None => {
                let address = fb.fb_address;
                backend.clear();
                self.report_missing_target(address);
            }
        }
    }

    /// Guest code wrote over memory that may back a framebuffer
    ///
    /// When the write hits the displayed (or previously displayed) buffer, or
    /// the caller says it is `safe` to act, every framebuffer at that address
    /// is either refreshed from guest memory or destroyed.
    ///
    /// # Arguments
    ///
    /// * `address` - Start of the written range
    /// * `size` - Length of the written range in bytes
    /// * `safe` - Act even when the write does not hit a displayed buffer
    pub fn update_from_memory(
        &mut self,
        backend: &mut dyn RenderBackend,
        memory: &dyn GuestMemory,
        address: u32,
        size: usize,
        safe: bool,
    ) {
        let address = address & !UNCACHED_BIT;

        let hits_pinned = [self.pins.display, self.pins.prev]
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(id))
            .any(|fb| masked_equal(fb.fb_address, address));
        if !hits_pinned && !safe {
            return;
        }

        if !memory.is_valid_address(self.display.address) {
            return;
        }

        log::debug!("Guest memory update at {:08x} ({} bytes)", address, size);
        backend.unbind();
        self.current_render = None;

        let buffered = self.config.buffered_rendering;
        let mut i = 0;
        while i < self.framebuffers.len() {
            if !masked_equal(self.framebuffers[i].fb_address, address) {
                i += 1;
                continue;
            }

            let fb = &mut self.framebuffers[i];
            fb.dirty_after_display = true;
            fb.really_dirty_after_display = true;

            let refreshed = match fb.target.handle() {
                Some(handle) if buffered => {
                    let loaded = read_guest_pixels(
                        memory,
                        VRAM_BASE | fb.fb_address,
                        fb.fb_stride,
                        fb.width,
                        fb.height,
                        fb.format,
                    )
                    .and_then(|pixels| {
                        backend.bind_as_render_target(handle);
                        backend.upload_pixels(handle, &pixels)
                    });
                    match loaded {
                        Ok(()) => true,
                        Err(e) => {
                            log::warn!("Cannot refresh framebuffer {:08x}: {}", fb.fb_address, e);
                            false
                        }
                    }
                }
                _ => false,
            };

            if refreshed {
                fb.memory_updated = true;
                i += 1;
            } else {
                log::info!("Invalidating framebuffer at {:08x}", fb.fb_address);
                self.destroy_at(backend, i);
            }
        }

        backend.unbind();
    }
}

/// Expand a guest pixel rectangle into RGBA8888
///
/// # Errors
///
/// `InvalidMemoryAccess` if any row falls outside mapped memory.
pub(super) fn read_guest_pixels(
    memory: &dyn GuestMemory,
    address: u32,
    stride: u32,
    width: u32,
    height: u32,
    format: BufferFormat,
) -> Result<PixelBuffer> {
    let mut pixels = PixelBuffer::new(width, height, ChannelOrder::Rgba);
    let bpp = format.bytes_per_pixel();
    let pitch = stride as usize * bpp;
    let cols = width.min(stride) as usize;
    let rows = height as usize;
    if rows == 0 || cols == 0 {
        return Ok(pixels);
    }

    let span = pitch * (rows - 1) + cols * bpp;
    let src = memory.slice(address, span)?;
    let out_pitch = pixels.pitch();

    for y in 0..rows {
        let row = &src[y * pitch..y * pitch + cols * bpp];
        let out = &mut pixels.data[y * out_pitch..y * out_pitch + cols * 4];
        convert::unpack_row(row, out, format);
    }
    Ok(pixels)
}
