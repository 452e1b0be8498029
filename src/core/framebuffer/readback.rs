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

//! Framebuffer readback into guest memory
//!
//! Upscaled targets are first downsampled into a logical-size staging copy,
//! then read and packed into the framebuffer's guest format at
//! `VRAM_BASE | fb_address`, one `fb_stride` pitched row at a time.

use super::backend::{ChannelOrder, OwnedTarget, PixelBuffer, RenderBackend, TargetHandle};
use super::convert;
use super::types::{masked_equal, ColorDepth, FramebufferId, UsageFlags, VirtualFramebuffer, VRAM_BASE};
use super::FramebufferManager;
use crate::core::error::Result;
use crate::core::memory::GuestMemory;

impl FramebufferManager {
    /// Copy a framebuffer's pixels into guest memory
    ///
    /// # Arguments
    ///
    /// * `backend` - Rendering backend
    /// * `memory` - Guest memory to write into
    /// * `id` - Framebuffer to read
    ///
    /// # Errors
    ///
    /// `UnknownFramebuffer` if `id` is not tracked, or any backend or memory
    /// error raised while reading. A framebuffer without a target is skipped.
    pub fn read_framebuffer_to_memory(
        &mut self,
        backend: &mut dyn RenderBackend,
        memory: &mut dyn GuestMemory,
        id: FramebufferId,
    ) -> Result<()> {
        let index = self.require(id)?;
        let (source, address) = {
            let fb = &self.framebuffers[index];
            (fb.target.handle(), fb.fb_address)
        };

        let Some(source) = source else {
            self.report_missing_target(address);
            return Ok(());
        };

        let read_from = if self.framebuffers[index].renders_at_logical_size() {
            source
        } else {
            match self.staging_target_for(backend, index) {
                Some(staging) => {
                    backend.blit(source, staging)?;
                    staging
                }
                None => return Ok(()),
            }
        };

        let pixels = backend
            .read_target_pixels(read_from)?
            .into_order(ChannelOrder::Rgba);
        write_pixels_to_guest(memory, &self.framebuffers[index], &pixels)?;

        let fb = &mut self.framebuffers[index];
        fb.memory_updated = true;

        log::debug!(
            "Read framebuffer {:08x} back to memory ({} x {} {})",
            fb.fb_address,
            fb.width,
            fb.height,
            fb.format
        );
        Ok(())
    }

    /// Find or create the logical-size staging copy for a framebuffer
    fn staging_target_for(
        &mut self,
        backend: &mut dyn RenderBackend,
        index: usize,
    ) -> Option<TargetHandle> {
        let frame = self.frame;
        let fb = &self.framebuffers[index];
        let (address, format, width, height) = (fb.fb_address, fb.format, fb.width, fb.height);
        let (buffer_width, buffer_height, fb_stride) = (fb.buffer_width, fb.buffer_height, fb.fb_stride);
        let depth = ColorDepth::from(format);

        let existing = self.staging.iter().position(|s| {
            masked_equal(s.fb_address, address)
                && s.format == format
                && s.buffer_width == buffer_width
                && s.buffer_height == buffer_height
        });

        let Some(at) = existing else {
            let target = match backend.create_color_target(width, height, depth) {
                Ok(handle) => handle,
                Err(e) => {
                    log::error!("Error creating staging target for {:08x}: {}", address, e);
                    return None;
                }
            };
            let id = self.allocate_id();
            log::debug!("Creating staging copy for {:08x} : {} x {}", address, width, height);
            self.staging.push(VirtualFramebuffer {
                id,
                fb_address: address,
                fb_stride,
                z_address: 0,
                z_stride: 0,
                format,
                width,
                height,
                buffer_width,
                buffer_height,
                render_width: width,
                render_height: height,
                color_depth: depth,
                usage: UsageFlags::RENDER_TARGET | UsageFlags::READBACK,
                last_frame_render: frame,
                last_frame_used: 0,
                dirty_after_display: true,
                really_dirty_after_display: true,
                memory_updated: false,
                target: OwnedTarget::new(target),
            });
            return Some(target);
        };

        let staging = &mut self.staging[at];
        staging.fb_stride = fb_stride;
        staging.last_frame_render = frame;
        staging.dirty_after_display = true;
        staging.really_dirty_after_display = true;

        if staging.width != width || staging.height != height || staging.target.is_null() {
            let result = match staging.target.take() {
                Some(old) => backend.resize_or_recreate(old, width, height, depth),
                None => backend.create_color_target(width, height, depth),
            };
            match result {
                Ok(handle) => staging.target = OwnedTarget::new(handle),
                Err(e) => {
                    log::error!("Error resizing staging target for {:08x}: {}", address, e);
                    return None;
                }
            }
            staging.width = width;
            staging.height = height;
            staging.render_width = width;
            staging.render_height = height;
        }
        staging.target.handle()
    }
}

/// Pack RGBA pixels into the framebuffer's guest rows
fn write_pixels_to_guest(
    memory: &mut dyn GuestMemory,
    fb: &VirtualFramebuffer,
    pixels: &PixelBuffer,
) -> Result<()> {
    let bpp = fb.format.bytes_per_pixel();
    let pitch = fb.fb_stride as usize * bpp;
    let rows = fb.height.min(pixels.height) as usize;
    let cols = fb.fb_stride.min(pixels.width) as usize;
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let span = pitch * (rows - 1) + cols * bpp;
    let dst = memory.slice_mut(VRAM_BASE | fb.fb_address, span)?;

    for y in 0..rows {
        let src = &pixels.data[y * pixels.pitch()..y * pixels.pitch() + cols * 4];
        let row = &mut dst[y * pitch..y * pitch + cols * bpp];
        convert::pack_row(src, row, fb.format);
    }
    Ok(())
}
