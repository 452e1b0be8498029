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

//! Rendering backend interface
//!
//! The framebuffer cache decides when targets exist; a [`RenderBackend`]
//! owns the actual GPU resources. Targets are referred to by opaque
//! [`TargetHandle`]s, and every handle held by a framebuffer entry is
//! wrapped in an [`OwnedTarget`] so it is released exactly once.

use super::types::ColorDepth;
use crate::core::error::Result;
use std::fmt;

/// Opaque backend render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target {}", self.0)
    }
}

/// Byte order of 32-bit pixels in a [`PixelBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

/// Tightly packed 32-bit pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    /// `width * height * 4` bytes, row-major
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// A zero-filled buffer
    pub fn new(width: u32, height: u32, order: ChannelOrder) -> Self {
        Self {
            width,
            height,
            order,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Bytes of one row
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    /// Pixel at `(x, y)` in the buffer's own channel order
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let at = y as usize * self.pitch() + x as usize * 4;
        [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ]
    }

    /// Convert in place to the requested channel order
    pub fn into_order(mut self, order: ChannelOrder) -> Self {
        if self.order != order {
            super::convert::swap_red_blue(&mut self.data);
            self.order = order;
        }
        self
    }
}

/// What to show on the output
#[derive(Debug, Clone, Copy)]
pub enum PresentSource<'a> {
    /// A render target, scaled to the output
    Target(TargetHandle),
    /// Raw pixels converted from guest memory
    Pixels(&'a PixelBuffer),
}

/// GPU operations the framebuffer cache relies on
pub trait RenderBackend {
    /// Allocate a color render target
    fn create_color_target(
        &mut self,
        width: u32,
        height: u32,
        depth: ColorDepth,
    ) -> Result<TargetHandle>;

    /// Replace `target` with one of a new size
    ///
    /// The old target is released whether or not the new one is created.
    fn resize_or_recreate(
        &mut self,
        target: TargetHandle,
        width: u32,
        height: u32,
        depth: ColorDepth,
    ) -> Result<TargetHandle>;

    fn bind_as_render_target(&mut self, target: TargetHandle);

    fn bind_as_texture(&mut self, target: TargetHandle, unit: u32);

    fn destroy_target(&mut self, target: TargetHandle);

    /// Read a target's pixels as 8888 in the backend's native order
    fn read_target_pixels(&mut self, target: TargetHandle) -> Result<PixelBuffer>;

    /// Clear the bound render target (or the output when none is bound)
    fn clear(&mut self);

    /// Bind the output as the render target
    fn unbind(&mut self);

    /// Draw pixels into a target, stretched to fill it
    fn upload_pixels(&mut self, target: TargetHandle, pixels: &PixelBuffer) -> Result<()>;

    /// Copy `src` into `dst`, scaling to `dst`'s size
    fn blit(&mut self, src: TargetHandle, dst: TargetHandle) -> Result<()>;

    /// Show a frame on the output
    fn present(&mut self, source: PresentSource<'_>);
}

/// A backend target owned by one framebuffer entry
///
/// Release it with [`OwnedTarget::release`] before dropping; dropping a live
/// handle leaks the backend resource and is reported.
#[derive(Debug, Default)]
pub struct OwnedTarget {
    handle: Option<TargetHandle>,
}

impl OwnedTarget {
    pub fn new(handle: TargetHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// An entry without a backend target
    pub fn null() -> Self {
        Self { handle: None }
    }

    pub fn handle(&self) -> Option<TargetHandle> {
        self.handle
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    /// Give up ownership of the handle without destroying it
    pub fn take(&mut self) -> Option<TargetHandle> {
        self.handle.take()
    }

    /// Destroy the target, leaving this wrapper null
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(handle) = self.handle.take() {
            backend.destroy_target(handle);
        }
    }
}

impl Drop for OwnedTarget {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("Render {} dropped without release", handle);
        }
    }
}
