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

//! In-memory rendering backend
//!
//! Keeps every target as a plain pixel array. Used by tests, benchmarks and
//! the CLI to drive the framebuffer cache without a GPU.

use super::backend::{ChannelOrder, PixelBuffer, PresentSource, RenderBackend, TargetHandle};
use super::types::ColorDepth;
use crate::core::error::{FramebufferError, Result};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug)]
struct HeadlessTarget {
    depth: ColorDepth,
    pixels: PixelBuffer,
}

/// Counters of backend activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    pub created: usize,
    pub destroyed: usize,
    pub clears: usize,
    pub uploads: usize,
    pub blits: usize,
    pub presented: usize,
}

/// What the output last showed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedFrame {
    Target(TargetHandle),
    Pixels { width: u32, height: u32 },
}

/// Software backend with CPU-side targets
#[derive(Debug)]
pub struct HeadlessBackend {
    order: ChannelOrder,
    targets: HashMap<u32, HeadlessTarget>,
    next_handle: u32,
    render_target: Option<TargetHandle>,
    textures: HashMap<u32, TargetHandle>,
    allocation_limit: Option<usize>,
    stats: BackendStats,
    last_presented: Option<PresentedFrame>,
}

impl HeadlessBackend {
    /// Create a backend that stores pixels in `order`
    pub fn new(order: ChannelOrder) -> Self {
        Self {
            order,
            targets: HashMap::new(),
            next_handle: 1,
            render_target: None,
            textures: HashMap::new(),
            allocation_limit: None,
            stats: BackendStats::default(),
            last_presented: None,
        }
    }

    /// Fail target creation once `limit` targets are alive
    pub fn set_allocation_limit(&mut self, limit: Option<usize>) {
        self.allocation_limit = limit;
    }

    /// Number of live targets
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn is_live(&self, target: TargetHandle) -> bool {
        self.targets.contains_key(&target.0)
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn render_target(&self) -> Option<TargetHandle> {
        self.render_target
    }

    pub fn texture(&self, unit: u32) -> Option<TargetHandle> {
        self.textures.get(&unit).copied()
    }

    pub fn last_presented(&self) -> Option<&PresentedFrame> {
        self.last_presented.as_ref()
    }

    /// Size and depth of a live target
    pub fn target_info(&self, target: TargetHandle) -> Option<(u32, u32, ColorDepth)> {
        self.targets
            .get(&target.0)
            .map(|t| (t.pixels.width, t.pixels.height, t.depth))
    }

    /// Fill a target with one RGBA color, standing in for GE drawing
    pub fn fill(&mut self, target: TargetHandle, rgba: [u8; 4]) -> Result<()> {
        let order = self.order;
        let t = self.target_mut(target)?;
        let px = match order {
            ChannelOrder::Rgba => rgba,
            ChannelOrder::Bgra => [rgba[2], rgba[1], rgba[0], rgba[3]],
        };
        for chunk in t.pixels.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(())
    }

    fn target_mut(&mut self, target: TargetHandle) -> Result<&mut HeadlessTarget> {
        self.targets.get_mut(&target.0).ok_or_else(|| {
            FramebufferError::BackendError(format!("{} does not exist", target)).into()
        })
    }

    fn allocate(&mut self, width: u32, height: u32, depth: ColorDepth) -> Result<TargetHandle> {
        let full = self
            .allocation_limit
            .is_some_and(|limit| self.targets.len() >= limit);
        if full || width == 0 || height == 0 {
            return Err(FramebufferError::BackendCreationFailure { width, height }.into());
        }

        let handle = TargetHandle(self.next_handle);
        self.next_handle += 1;
        self.targets.insert(
            handle.0,
            HeadlessTarget {
                depth,
                pixels: PixelBuffer::new(width, height, self.order),
            },
        );
        self.stats.created += 1;
        Ok(handle)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(ChannelOrder::Rgba)
    }
}

/// Nearest-neighbor copy of `src` into `dst`, converting channel order
fn stretch_into(src: &PixelBuffer, dst: &mut PixelBuffer) {
    if src.width == 0 || src.height == 0 {
        return;
    }
    let swap = src.order != dst.order;
    let dst_pitch = dst.pitch();
    for y in 0..dst.height {
        let sy = (y as u64 * src.height as u64 / dst.height as u64) as u32;
        for x in 0..dst.width {
            let sx = (x as u64 * src.width as u64 / dst.width as u64) as u32;
            let mut px = src.pixel(sx, sy);
            if swap {
                px.swap(0, 2);
            }
            let at = y as usize * dst_pitch + x as usize * 4;
            dst.data[at..at + 4].copy_from_slice(&px);
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_color_target(
        &mut self,
        width: u32,
        height: u32,
        depth: ColorDepth,
    ) -> Result<TargetHandle> {
        self.allocate(width, height, depth)
    }

    fn resize_or_recreate(
        &mut self,
        target: TargetHandle,
        width: u32,
        height: u32,
        depth: ColorDepth,
    ) -> Result<TargetHandle> {
        self.destroy_target(target);
        self.allocate(width, height, depth)
    }

    fn bind_as_render_target(&mut self, target: TargetHandle) {
        self.render_target = Some(target);
    }

    fn bind_as_texture(&mut self, target: TargetHandle, unit: u32) {
        self.textures.insert(unit, target);
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if self.targets.remove(&target.0).is_some() {
            self.stats.destroyed += 1;
        } else {
            log::warn!("Destroying unknown {}", target);
        }
        if self.render_target == Some(target) {
            self.render_target = None;
        }
        self.textures.retain(|_, bound| *bound != target);
    }

    fn read_target_pixels(&mut self, target: TargetHandle) -> Result<PixelBuffer> {
        Ok(self.target_mut(target)?.pixels.clone())
    }

    fn clear(&mut self) {
        self.stats.clears += 1;
        if let Some(target) = self.render_target {
            if let Some(t) = self.targets.get_mut(&target.0) {
                t.pixels.data.fill(0);
            }
        }
    }

    fn unbind(&mut self) {
        self.render_target = None;
    }

    fn upload_pixels(&mut self, target: TargetHandle, pixels: &PixelBuffer) -> Result<()> {
        let t = self.target_mut(target)?;
        stretch_into(pixels, &mut t.pixels);
        self.stats.uploads += 1;
        Ok(())
    }

    fn blit(&mut self, src: TargetHandle, dst: TargetHandle) -> Result<()> {
        let source = self.target_mut(src)?.pixels.clone();
        let t = self.target_mut(dst)?;
        stretch_into(&source, &mut t.pixels);
        self.stats.blits += 1;
        Ok(())
    }

    fn present(&mut self, source: PresentSource<'_>) {
        self.stats.presented += 1;
        self.last_presented = Some(match source {
            PresentSource::Target(target) => PresentedFrame::Target(target),
            PresentSource::Pixels(pixels) => PresentedFrame::Pixels {
                width: pixels.width,
                height: pixels.height,
            },
        });
    }
}
