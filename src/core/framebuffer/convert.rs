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

//! Pixel format conversion
//!
//! Guest framebuffers store 16-bit or 32-bit pixels with red in the low
//! bits. Backends hand back 8888 pixels in RGBA or BGRA byte order.
//!
//! ```
//! use pspge::core::framebuffer::convert::{rgba8888_to_rgb565, rgb565_to_rgba8888};
//!
//! let packed = rgba8888_to_rgb565(0xFF00_00FF); // opaque red
//! assert_eq!(packed, 0x001F);
//! assert_eq!(rgb565_to_rgba8888(packed), [255, 0, 0, 255]);
//! ```

use super::types::BufferFormat;
use crate::core::color::{convert_4_to_8, convert_5_to_8, convert_6_to_8};

/// Pack a little-endian RGBA8888 pixel as 565
#[inline]
pub fn rgba8888_to_rgb565(c: u32) -> u16 {
    (((c >> 3) & 0x001F) | ((c >> 5) & 0x07E0) | ((c >> 8) & 0xF800)) as u16
}

/// Pack a little-endian RGBA8888 pixel as 5551
#[inline]
pub fn rgba8888_to_rgba5551(c: u32) -> u16 {
    (((c >> 3) & 0x001F) | ((c >> 6) & 0x03E0) | ((c >> 9) & 0x7C00) | ((c >> 16) & 0x8000)) as u16
}

/// Pack a little-endian RGBA8888 pixel as 4444
#[inline]
pub fn rgba8888_to_rgba4444(c: u32) -> u16 {
    (((c >> 4) & 0x000F) | ((c >> 8) & 0x00F0) | ((c >> 12) & 0x0F00) | ((c >> 16) & 0xF000)) as u16
}

/// Expand a 565 pixel to RGBA bytes
#[inline]
pub fn rgb565_to_rgba8888(c: u16) -> [u8; 4] {
    [convert_5_to_8(c), convert_6_to_8(c >> 5), convert_5_to_8(c >> 11), 255]
}

/// Expand a 5551 pixel to RGBA bytes
#[inline]
pub fn rgba5551_to_rgba8888(c: u16) -> [u8; 4] {
    [
        convert_5_to_8(c),
        convert_5_to_8(c >> 5),
        convert_5_to_8(c >> 10),
        if c >> 15 != 0 { 255 } else { 0 },
    ]
}

/// Expand a 4444 pixel to RGBA bytes
#[inline]
pub fn rgba4444_to_rgba8888(c: u16) -> [u8; 4] {
    [
        convert_4_to_8(c),
        convert_4_to_8(c >> 4),
        convert_4_to_8(c >> 8),
        convert_4_to_8(c >> 12),
    ]
}

/// Swap the red and blue channels of 32-bit pixels (RGBA <-> BGRA)
pub fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Pack one row of RGBA8888 bytes into guest format
///
/// # Arguments
///
/// * `src` - RGBA bytes, four per pixel
/// * `dst` - Guest row, `bytes_per_pixel` per pixel
/// * `format` - Guest pixel format
pub fn pack_row(src: &[u8], dst: &mut [u8], format: BufferFormat) {
    if format == BufferFormat::Rgba8888 {
        let len = src.len().min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    for (px, out) in src.chunks_exact(4).zip(dst.chunks_exact_mut(2)) {
        let c = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
        let packed = match format {
            BufferFormat::Rgb565 => rgba8888_to_rgb565(c),
            BufferFormat::Rgba5551 => rgba8888_to_rgba5551(c),
            _ => rgba8888_to_rgba4444(c),
        };
        out.copy_from_slice(&packed.to_le_bytes());
    }
}

/// Expand one row of guest pixels into RGBA8888 bytes
pub fn unpack_row(src: &[u8], dst: &mut [u8], format: BufferFormat) {
    if format == BufferFormat::Rgba8888 {
        let len = src.len().min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    for (px, out) in src.chunks_exact(2).zip(dst.chunks_exact_mut(4)) {
        let c = u16::from_le_bytes([px[0], px[1]]);
        let rgba = match format {
            BufferFormat::Rgb565 => rgb565_to_rgba8888(c),
            BufferFormat::Rgba5551 => rgba5551_to_rgba8888(c),
            _ => rgba4444_to_rgba8888(c),
        };
        out.copy_from_slice(&rgba);
    }
}
