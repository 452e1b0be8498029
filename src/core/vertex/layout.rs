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

//! Source and canonical vertex layouts
//!
//! A [`SourceLayout`] locates each component inside one packed guest vertex.
//! A [`CanonicalLayout`] describes the fixed layout decoded vertices are
//! written in, one [`DecFormat`] slot per present component.

/// Data type of one slot in the canonical layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecFormat {
    None,
    Float1,
    Float2,
    Float3,
    Float4,
    S8x3,
    S16x3,
    U8x1,
    U8x2,
    U8x3,
    U8x4,
    U16x1,
    U16x2,
    U16x3,
    U16x4,
}

impl DecFormat {
    /// Size of the slot in bytes, padding included
    pub fn size(self) -> usize {
        match self {
            DecFormat::None => 0,
            DecFormat::Float1 => 4,
            DecFormat::Float2 => 8,
            DecFormat::Float3 => 12,
            DecFormat::Float4 => 16,
            DecFormat::S8x3 => 4,
            DecFormat::S16x3 => 8,
            DecFormat::U8x1 | DecFormat::U8x2 | DecFormat::U8x3 | DecFormat::U8x4 => 4,
            DecFormat::U16x1 | DecFormat::U16x2 => 4,
            DecFormat::U16x3 | DecFormat::U16x4 => 8,
        }
    }

    /// Number of meaningful components (padding excluded)
    pub fn components(self) -> usize {
        match self {
            DecFormat::None => 0,
            DecFormat::Float1 | DecFormat::U8x1 | DecFormat::U16x1 => 1,
            DecFormat::Float2 | DecFormat::U8x2 | DecFormat::U16x2 => 2,
            DecFormat::Float3
            | DecFormat::S8x3
            | DecFormat::S16x3
            | DecFormat::U8x3
            | DecFormat::U16x3 => 3,
            DecFormat::Float4 | DecFormat::U8x4 | DecFormat::U16x4 => 4,
        }
    }
}

/// One slot of the canonical layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub format: DecFormat,
    pub offset: usize,
}

impl Slot {
    /// An absent slot
    pub const NONE: Slot = Slot {
        format: DecFormat::None,
        offset: 0,
    };

    /// Whether the slot holds data
    pub fn is_present(&self) -> bool {
        self.format != DecFormat::None
    }

    /// Components of this slot in a canonical record, as plain numbers
    ///
    /// Integer slots are returned unnormalized.
    pub fn values(&self, record: &[u8]) -> Vec<f32> {
        let at = self.offset;
        (0..self.format.components())
            .map(|i| match self.format {
                DecFormat::Float1 | DecFormat::Float2 | DecFormat::Float3 | DecFormat::Float4 => {
                    let o = at + i * 4;
                    f32::from_le_bytes([record[o], record[o + 1], record[o + 2], record[o + 3]])
                }
                DecFormat::S8x3 => record[at + i] as i8 as f32,
                DecFormat::S16x3 => {
                    let o = at + i * 2;
                    i16::from_le_bytes([record[o], record[o + 1]]) as f32
                }
                DecFormat::U16x1 | DecFormat::U16x2 | DecFormat::U16x3 | DecFormat::U16x4 => {
                    let o = at + i * 2;
                    u16::from_le_bytes([record[o], record[o + 1]]) as f32
                }
                _ => record[at + i] as f32,
            })
            .collect()
    }
}

/// Byte offsets of each component within one guest vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLayout {
    pub weight_offset: usize,
    pub texcoord_offset: usize,
    pub color_offset: usize,
    pub normal_offset: usize,
    pub position_offset: usize,
    /// Largest alignment of any present component
    pub alignment: usize,
    /// Size of the data for a single morph target
    pub one_size: usize,
    /// Distance between consecutive vertices (`one_size * morph_count`)
    pub record_stride: usize,
}

/// Layout of one decoded vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalLayout {
    /// Weights 0-3
    pub w0: Slot,
    /// Weights 4-7
    pub w1: Slot,
    pub uv: Slot,
    pub color0: Slot,
    pub normal: Slot,
    pub position: Slot,
    pub stride: usize,
}

impl Default for CanonicalLayout {
    fn default() -> Self {
        Self {
            w0: Slot::NONE,
            w1: Slot::NONE,
            uv: Slot::NONE,
            color0: Slot::NONE,
            normal: Slot::NONE,
            position: Slot::NONE,
            stride: 0,
        }
    }
}

impl CanonicalLayout {
    /// Append a slot at the current end of the layout
    pub(super) fn push(&mut self, format: DecFormat) -> Slot {
        let slot = Slot {
            format,
            offset: self.stride,
        };
        self.stride += format.size();
        slot
    }
}

/// Round `n` up to a multiple of `align` (a power of two)
#[inline(always)]
pub fn align_up(n: usize, align: usize) -> usize {
    if align <= 1 {
        return n;
    }
    (n + (align - 1)) & !(align - 1)
}
