// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Helper functions for memory tests

use super::*;

/// Memory with a recognizable byte pattern at the start of VRAM
pub fn create_memory_with_vram_pattern() -> PspMemory {
    let mut mem = PspMemory::new();
    let pattern: Vec<u8> = (0..64u8).collect();
    mem.write(PspMemory::VRAM_START, &pattern).unwrap();
    mem
}
