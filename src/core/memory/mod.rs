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

//! PSP guest address space
//!
//! The decoder reads vertex and index data from guest memory, and the
//! framebuffer cache reads and writes pixels in VRAM or main RAM.
//! [`GuestMemory`] is the seam between them and whatever owns the address
//! space; [`PspMemory`] is a flat implementation of the PSP memory map.
//!
//! # Memory Map
//!
//! | Address Range           | Region     | Size   |
//! |-------------------------|------------|--------|
//! | 0x00010000-0x00013FFF   | Scratchpad | 16KB   |
//! | 0x04000000-0x041FFFFF   | VRAM       | 2MB    |
//! | 0x08000000-0x09FFFFFF   | Main RAM   | 32MB   |
//!
//! The top two address bits select cached/uncached/kernel views of the same
//! memory and are masked off. VRAM is mirrored up to 0x047FFFFF.
//!
//! # Example
//!
//! ```
//! use pspge::core::memory::{GuestMemory, PspMemory};
//!
//! let mut mem = PspMemory::new();
//!
//! mem.write_u32(0x0880_0000, 0x1234_5678).unwrap();
//!
//! // Uncached mirror sees the same RAM
//! assert_eq!(mem.read_u32(0x4880_0000).unwrap(), 0x1234_5678);
//! assert!(!mem.is_valid_address(0x0200_0000));
//! ```

mod region;

#[cfg(test)]
mod tests;

pub use region::MemoryRegion;

use crate::core::error::{GeError, Result};

/// Guest address space accessed by the pipeline
///
/// Accesses never straddle two regions; a range that does is invalid.
pub trait GuestMemory {
    /// Whether `len` bytes starting at `address` are backed by memory
    fn is_valid_range(&self, address: u32, len: usize) -> bool;

    /// Borrow `len` bytes starting at `address`
    fn slice(&self, address: u32, len: usize) -> Result<&[u8]>;

    /// Mutably borrow `len` bytes starting at `address`
    fn slice_mut(&mut self, address: u32, len: usize) -> Result<&mut [u8]>;

    /// Whether a single byte at `address` is backed by memory
    fn is_valid_address(&self, address: u32) -> bool {
        self.is_valid_range(address, 1)
    }

    /// Copy bytes out of guest memory
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<()> {
        buf.copy_from_slice(self.slice(address, buf.len())?);
        Ok(())
    }

    /// Copy bytes into guest memory
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.slice_mut(address, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Read a little-endian 16-bit value
    fn read_u16(&self, address: u32) -> Result<u16> {
        let mut bytes = [0u8; 2];
        self.read(address, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Read a little-endian 32-bit value
    fn read_u32(&self, address: u32) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Write a little-endian 32-bit value
    fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        self.write(address, &value.to_le_bytes())
    }
}

/// Flat PSP memory: scratchpad, VRAM and main RAM
pub struct PspMemory {
    /// Scratchpad (16KB)
    scratchpad: Vec<u8>,

    /// Video memory (2MB)
    ///
    /// Framebuffers and depth buffers normally live here.
    vram: Vec<u8>,

    /// Main RAM (32MB)
    ram: Vec<u8>,
}

impl PspMemory {
    /// Mask removing the segment bits of an address
    pub const ADDRESS_MASK: u32 = 0x3FFF_FFFF;

    pub const SCRATCHPAD_START: u32 = 0x0001_0000;
    pub const SCRATCHPAD_SIZE: usize = 16 * 1024;

    pub const VRAM_START: u32 = 0x0400_0000;
    pub const VRAM_SIZE: usize = 2 * 1024 * 1024;
    /// End of the VRAM mirror window (exclusive)
    pub const VRAM_MIRROR_END: u32 = 0x0480_0000;

    pub const RAM_START: u32 = 0x0800_0000;
    pub const RAM_SIZE: usize = 32 * 1024 * 1024;

    /// Create zero-filled memory
    pub fn new() -> Self {
        Self {
            scratchpad: vec![0u8; Self::SCRATCHPAD_SIZE],
            vram: vec![0u8; Self::VRAM_SIZE],
            ram: vec![0u8; Self::RAM_SIZE],
        }
    }

    /// Clear every region to zero
    pub fn reset(&mut self) {
        self.scratchpad.fill(0);
        self.vram.fill(0);
        self.ram.fill(0);
    }

    /// Resolve a range to its region and byte offset inside that region
    fn locate(&self, address: u32, len: usize) -> Option<(MemoryRegion, usize)> {
        let region = self.identify_region(address);
        let offset = region.offset_of(address & Self::ADDRESS_MASK)?;
        if offset + len > region.size() {
            return None;
        }
        Some((region, offset))
    }

    fn region_bytes(&self, region: MemoryRegion) -> &[u8] {
        match region {
            MemoryRegion::Scratchpad => &self.scratchpad,
            MemoryRegion::Vram => &self.vram,
            MemoryRegion::Ram => &self.ram,
            MemoryRegion::Unmapped => &[],
        }
    }

    fn region_bytes_mut(&mut self, region: MemoryRegion) -> &mut [u8] {
        match region {
            MemoryRegion::Scratchpad => &mut self.scratchpad,
            MemoryRegion::Vram => &mut self.vram,
            MemoryRegion::Ram => &mut self.ram,
            MemoryRegion::Unmapped => &mut [],
        }
    }
}

impl Default for PspMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestMemory for PspMemory {
    fn is_valid_range(&self, address: u32, len: usize) -> bool {
        self.locate(address, len).is_some()
    }

    fn slice(&self, address: u32, len: usize) -> Result<&[u8]> {
        let (region, offset) = self
            .locate(address, len)
            .ok_or(GeError::InvalidMemoryAccess { address, len })?;
        Ok(&self.region_bytes(region)[offset..offset + len])
    }

    fn slice_mut(&mut self, address: u32, len: usize) -> Result<&mut [u8]> {
        let (region, offset) = self
            .locate(address, len)
            .ok_or(GeError::InvalidMemoryAccess { address, len })?;
        Ok(&mut self.region_bytes_mut(region)[offset..offset + len])
    }
}
