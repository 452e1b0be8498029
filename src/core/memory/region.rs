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

//! Memory region identification
//!
//! Maps a segment-masked PSP address onto the region that backs it.

use super::PspMemory;

/// Memory region identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Scratchpad (16KB)
    Scratchpad,
    /// Video memory (2MB, mirrored)
    Vram,
    /// Main RAM (32MB)
    Ram,
    /// Unmapped region
    Unmapped,
}

impl MemoryRegion {
    /// Size in bytes of the region's backing store
    pub fn size(self) -> usize {
        match self {
            MemoryRegion::Scratchpad => PspMemory::SCRATCHPAD_SIZE,
            MemoryRegion::Vram => PspMemory::VRAM_SIZE,
            MemoryRegion::Ram => PspMemory::RAM_SIZE,
            MemoryRegion::Unmapped => 0,
        }
    }

    /// Offset of a masked address inside this region's backing store
    pub(super) fn offset_of(self, paddr: u32) -> Option<usize> {
        match self {
            MemoryRegion::Scratchpad => Some((paddr - PspMemory::SCRATCHPAD_START) as usize),
            MemoryRegion::Vram => {
                Some(((paddr - PspMemory::VRAM_START) as usize) % PspMemory::VRAM_SIZE)
            }
            MemoryRegion::Ram => Some((paddr - PspMemory::RAM_START) as usize),
            MemoryRegion::Unmapped => None,
        }
    }
}

impl PspMemory {
    /// Identify the memory region for an address
    ///
    /// # Example
    ///
    /// ```
    /// use pspge::core::memory::{MemoryRegion, PspMemory};
    ///
    /// let mem = PspMemory::new();
    ///
    /// assert_eq!(mem.identify_region(0x0001_0000), MemoryRegion::Scratchpad);
    /// assert_eq!(mem.identify_region(0x4400_0000), MemoryRegion::Vram);
    /// assert_eq!(mem.identify_region(0x0880_0000), MemoryRegion::Ram);
    /// assert_eq!(mem.identify_region(0x0000_0000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, address: u32) -> MemoryRegion {
        let paddr = address & Self::ADDRESS_MASK;
        let scratch_end = Self::SCRATCHPAD_START + Self::SCRATCHPAD_SIZE as u32;
        let ram_end = Self::RAM_START + Self::RAM_SIZE as u32;

        if (Self::SCRATCHPAD_START..scratch_end).contains(&paddr) {
            MemoryRegion::Scratchpad
        } else if (Self::VRAM_START..Self::VRAM_MIRROR_END).contains(&paddr) {
            MemoryRegion::Vram
        } else if (Self::RAM_START..ram_end).contains(&paddr) {
            MemoryRegion::Ram
        } else {
            MemoryRegion::Unmapped
        }
    }
}
