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

//! Framebuffer descriptors

use super::backend::OwnedTarget;
use serde::{Deserialize, Serialize};
use std::fmt;

/// VRAM base address in the guest address space
pub const VRAM_BASE: u32 = 0x0400_0000;

/// Bits compared when matching framebuffer addresses
pub const FB_ADDRESS_MASK: u32 = 0x03FF_FFFF;

/// Bits of a framebuffer pointer kept as the entry's address
pub const FB_RAW_ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Native PSP display width in pixels
pub const DISPLAY_WIDTH: u32 = 480;

/// Native PSP display height in pixels
pub const DISPLAY_HEIGHT: u32 = 272;

/// Compare two guest addresses ignoring cache-control and VRAM base bits
///
/// # Example
///
/// ```
/// use pspge::core::framebuffer::masked_equal;
///
/// assert!(masked_equal(0x0400_0000, 0x4400_0000));
/// assert!(masked_equal(0x0004_4000, 0x0404_4000));
/// assert!(!masked_equal(0x0004_4000, 0x0008_8000));
/// ```
#[inline]
pub fn masked_equal(a: u32, b: u32) -> bool {
    (a & FB_ADDRESS_MASK) == (b & FB_ADDRESS_MASK)
}

/// Guest framebuffer pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferFormat {
    /// 16-bit BGR 5-6-5
    Rgb565,
    /// 16-bit ABGR 1-5-5-5
    Rgba5551,
    /// 16-bit ABGR 4-4-4-4
    Rgba4444,
    /// 32-bit ABGR 8-8-8-8
    Rgba8888,
}

impl BufferFormat {
    /// Parse the GE framebuffer format field
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => BufferFormat::Rgb565,
            1 => BufferFormat::Rgba5551,
            2 => BufferFormat::Rgba4444,
            _ => BufferFormat::Rgba8888,
        }
    }

    /// Bytes per pixel in guest memory
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            BufferFormat::Rgba8888 => 4,
            _ => 2,
        }
    }
}

impl fmt::Display for BufferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BufferFormat::Rgb565 => "565",
            BufferFormat::Rgba5551 => "5551",
            BufferFormat::Rgba4444 => "4444",
            BufferFormat::Rgba8888 => "8888",
        };
        f.write_str(name)
    }
}

/// Backend render target color depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorDepth {
    Rgb565,
    Rgba5551,
    Rgba4444,
    Rgba8888,
}

impl From<BufferFormat> for ColorDepth {
    fn from(format: BufferFormat) -> Self {
        match format {
            BufferFormat::Rgb565 => ColorDepth::Rgb565,
            BufferFormat::Rgba5551 => ColorDepth::Rgba5551,
            BufferFormat::Rgba4444 => ColorDepth::Rgba4444,
            BufferFormat::Rgba8888 => ColorDepth::Rgba8888,
        }
    }
}

bitflags::bitflags! {
    /// How a framebuffer has been used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UsageFlags: u32 {
        /// Drawn into by the GE
        const RENDER_TARGET = 1 << 0;
        /// Shown on screen at least once
        const DISPLAYED = 1 << 1;
        /// Sampled as a texture
        const TEXTURE = 1 << 2;
        /// Staging copy used for readback
        const READBACK = 1 << 3;
    }
}

/// Stable identifier of a framebuffer entry
///
/// Ids are never reused within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FramebufferId(pub u32);

impl fmt::Display for FramebufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request to render into the framebuffer at a guest address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub fb_address: u32,
    /// Row pitch in pixels
    pub fb_stride: u32,
    pub z_address: u32,
    pub z_stride: u32,
    pub format: BufferFormat,
    /// Logical width of the drawn area
    pub width: u32,
    /// Logical height of the drawn area
    pub height: u32,
    /// Allow the backing target to shrink
    pub force: bool,
}

impl RenderRequest {
    /// A full-screen request with matching stride and no depth buffer
    pub fn new(fb_address: u32, format: BufferFormat, width: u32, height: u32) -> Self {
        Self {
            fb_address,
            fb_stride: width,
            z_address: 0,
            z_stride: 0,
            format,
            width,
            height,
            force: false,
        }
    }
}

/// A render target tracked by guest address
#[derive(Debug)]
pub struct VirtualFramebuffer {
    pub id: FramebufferId,

    /// Color buffer address (24 bits, VRAM-relative)
    pub fb_address: u32,
    /// Row pitch in pixels
    pub fb_stride: u32,
    pub z_address: u32,
    pub z_stride: u32,
    pub format: BufferFormat,

    /// Logical size last requested
    pub width: u32,
    pub height: u32,

    /// Size of the backing allocation in guest pixels
    pub buffer_width: u32,
    pub buffer_height: u32,

    /// Backend resolution (buffer size times the render scale)
    pub render_width: u32,
    pub render_height: u32,

    pub color_depth: ColorDepth,
    pub usage: UsageFlags,

    pub last_frame_render: u32,
    pub last_frame_used: u32,

    pub dirty_after_display: bool,
    pub really_dirty_after_display: bool,

    /// Guest memory holds the current pixels
    pub memory_updated: bool,

    pub target: OwnedTarget,
}

impl VirtualFramebuffer {
    /// Bytes the color buffer occupies in guest memory
    pub fn byte_size(&self) -> usize {
        self.fb_stride as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// The backend renders at the logical size, so no downsampling is needed
    pub fn renders_at_logical_size(&self) -> bool {
        self.render_width == self.width && self.render_height == self.height
    }

    /// Most recent frame this entry was drawn into or sampled
    pub fn last_active_frame(&self) -> u32 {
        self.last_frame_render.max(self.last_frame_used)
    }

    pub(super) fn info(&self, staging: bool) -> FramebufferInfo {
        FramebufferInfo {
            id: self.id,
            fb_address: self.fb_address,
            z_address: self.z_address,
            format: self.format,
            width: self.width,
            height: self.height,
            render_width: self.render_width,
            render_height: self.render_height,
            last_frame_render: self.last_frame_render,
            has_target: !self.target.is_null(),
            staging,
        }
    }
}

/// Debug listing row for one framebuffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferInfo {
    pub id: FramebufferId,
    pub fb_address: u32,
    pub z_address: u32,
    pub format: BufferFormat,
    pub width: u32,
    pub height: u32,
    pub render_width: u32,
    pub render_height: u32,
    pub last_frame_render: u32,
    pub has_target: bool,
    pub staging: bool,
}

/// What the guest asked to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRequest {
    pub address: u32,
    /// Row pitch in pixels
    pub stride: u32,
    pub format: BufferFormat,
}

impl Default for DisplayRequest {
    fn default() -> Self {
        Self {
            address: 0,
            stride: 512,
            format: BufferFormat::Rgba8888,
        }
    }
}

/// The displayed framebuffer and the two before it
///
/// Entries in the window are never evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinWindow {
    pub display: Option<FramebufferId>,
    pub prev: Option<FramebufferId>,
    pub prev_prev: Option<FramebufferId>,
}

impl PinWindow {
    /// Rotate the window so that `id` becomes the displayed entry
    pub fn rotate(&mut self, id: FramebufferId) {
        if self.prev != self.display {
            self.prev_prev = self.prev;
        }
        if self.display != Some(id) {
            self.prev = self.display;
        }
        self.display = Some(id);
    }

    /// Whether `id` is pinned
    pub fn contains(&self, id: FramebufferId) -> bool {
        [self.display, self.prev, self.prev_prev].contains(&Some(id))
    }

    /// Drop every reference to `id`
    pub fn forget(&mut self, id: FramebufferId) {
        for slot in [&mut self.display, &mut self.prev, &mut self.prev_prev] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = PinWindow::default();
    }
}
