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

//! Vertex format descriptor
//!
//! The GE vertex type register packs the encoding of every vertex component
//! into one 32-bit word:
//!
//! ```text
//! bits  0-1   texture coordinate type
//! bits  2-4   color type
//! bits  5-6   normal type
//! bits  7-8   position type
//! bits  9-10  weight type
//! bits 11-12  index type
//! bits 14-16  weight count - 1
//! bits 18-20  morph target count - 1
//! bit  23     through mode
//! ```

use std::fmt;

/// Encoding of a vertex component
///
/// Normals and positions interpret the 8/16-bit encodings as signed;
/// weights, texture coordinates and indices as unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Component absent
    None,
    /// 8-bit integer
    U8,
    /// 16-bit integer
    U16,
    /// 32-bit IEEE float
    Float,
}

impl ComponentType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => ComponentType::None,
            1 => ComponentType::U8,
            2 => ComponentType::U16,
            _ => ComponentType::Float,
        }
    }

    /// Raw 2-bit field value
    pub fn bits(self) -> u32 {
        match self {
            ComponentType::None => 0,
            ComponentType::U8 => 1,
            ComponentType::U16 => 2,
            ComponentType::Float => 3,
        }
    }

    /// Size in bytes of one element of this type
    pub fn element_size(self) -> usize {
        match self {
            ComponentType::None => 0,
            ComponentType::U8 => 1,
            ComponentType::U16 => 2,
            ComponentType::Float => 4,
        }
    }

    /// Whether the component is present
    pub fn is_present(self) -> bool {
        self != ComponentType::None
    }
}

/// Vertex color encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    /// No vertex color
    None,
    /// Reserved encodings 1-3 (treated as absent)
    Reserved(u8),
    /// 16-bit BGR 5-6-5
    Rgb565,
    /// 16-bit ABGR 1-5-5-5
    Rgba5551,
    /// 16-bit ABGR 4-4-4-4
    Rgba4444,
    /// 32-bit ABGR 8-8-8-8
    Rgba8888,
}

impl ColorType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => ColorType::None,
            4 => ColorType::Rgb565,
            5 => ColorType::Rgba5551,
            6 => ColorType::Rgba4444,
            7 => ColorType::Rgba8888,
            other => ColorType::Reserved(other as u8),
        }
    }

    /// Raw 3-bit field value
    pub fn bits(self) -> u32 {
        match self {
            ColorType::None => 0,
            ColorType::Reserved(v) => v as u32,
            ColorType::Rgb565 => 4,
            ColorType::Rgba5551 => 5,
            ColorType::Rgba4444 => 6,
            ColorType::Rgba8888 => 7,
        }
    }

    /// Size in bytes of one packed color
    pub fn size(self) -> usize {
        match self {
            ColorType::None | ColorType::Reserved(_) => 0,
            ColorType::Rgb565 | ColorType::Rgba5551 | ColorType::Rgba4444 => 2,
            ColorType::Rgba8888 => 4,
        }
    }

    /// Whether a decodable color is present
    pub fn is_present(self) -> bool {
        self.size() != 0
    }
}

/// Index buffer encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Vertices are drawn in order
    None,
    /// 8-bit indices
    U8,
    /// 16-bit little-endian indices
    U16,
}

impl IndexType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            1 => IndexType::U8,
            2 => IndexType::U16,
            // 3 is reserved on the GE
            _ => IndexType::None,
        }
    }

    /// Size in bytes of one index
    pub fn size(self) -> usize {
        match self {
            IndexType::None => 0,
            IndexType::U8 => 1,
            IndexType::U16 => 2,
        }
    }
}

/// Parsed vertex type register
///
/// # Examples
///
/// ```
/// use pspge::core::vertex::{ColorType, ComponentType, FormatDescriptor};
///
/// // 16-bit UVs, 8888 color, float position
/// let desc = FormatDescriptor::from_code(0x0000_019E);
/// assert_eq!(desc.texcoord, ComponentType::U16);
/// assert_eq!(desc.color, ColorType::Rgba8888);
/// assert_eq!(desc.position, ComponentType::Float);
/// assert_eq!(desc.morph_count, 1);
/// assert!(!desc.through_mode);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    /// The raw code this descriptor was parsed from
    pub code: u32,
    /// Coordinates are already in screen space
    pub through_mode: bool,
    pub texcoord: ComponentType,
    pub color: ColorType,
    pub normal: ComponentType,
    pub position: ComponentType,
    pub weight: ComponentType,
    pub index: IndexType,
    /// Number of skinning weights (1-8)
    pub weight_count: usize,
    /// Number of morph targets (1-8)
    pub morph_count: usize,
}

impl FormatDescriptor {
    pub const TC_SHIFT: u32 = 0;
    pub const COLOR_SHIFT: u32 = 2;
    pub const NORMAL_SHIFT: u32 = 5;
    pub const POS_SHIFT: u32 = 7;
    pub const WEIGHT_SHIFT: u32 = 9;
    pub const INDEX_SHIFT: u32 = 11;
    pub const WEIGHT_COUNT_SHIFT: u32 = 14;
    pub const MORPH_COUNT_SHIFT: u32 = 18;

    /// Through-mode flag
    pub const THROUGH: u32 = 1 << 23;

    /// Index field mask
    pub const INDEX_MASK: u32 = 0x3 << Self::INDEX_SHIFT;

    /// Parse a vertex type code
    pub fn from_code(code: u32) -> Self {
        Self {
            code,
            through_mode: code & Self::THROUGH != 0,
            texcoord: ComponentType::from_bits(code >> Self::TC_SHIFT),
            color: ColorType::from_bits(code >> Self::COLOR_SHIFT),
            normal: ComponentType::from_bits(code >> Self::NORMAL_SHIFT),
            position: ComponentType::from_bits(code >> Self::POS_SHIFT),
            weight: ComponentType::from_bits(code >> Self::WEIGHT_SHIFT),
            index: IndexType::from_bits(code >> Self::INDEX_SHIFT),
            weight_count: (((code >> Self::WEIGHT_COUNT_SHIFT) & 0x7) + 1) as usize,
            morph_count: (((code >> Self::MORPH_COUNT_SHIFT) & 0x7) + 1) as usize,
        }
    }

    /// Whether more than one morph target is blended
    pub fn is_morphing(&self) -> bool {
        self.morph_count > 1
    }

    /// Whether the mandatory position component is present
    pub fn has_position(&self) -> bool {
        self.position.is_present()
    }

    /// Code with the index field cleared
    ///
    /// Draws that differ only in index type decode identically.
    pub fn code_without_index(&self) -> u32 {
        self.code & !Self::INDEX_MASK
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P: {}", self.position.bits())?;
        if self.normal.is_present() {
            write!(f, " N: {}", self.normal.bits())?;
        }
        if self.color != ColorType::None {
            write!(f, " C: {}", self.color.bits())?;
        }
        if self.texcoord.is_present() {
            write!(f, " T: {}", self.texcoord.bits())?;
        }
        if self.weight.is_present() {
            write!(f, " W: {}x{}", self.weight.bits(), self.weight_count)?;
        }
        if self.index != IndexType::None {
            write!(f, " I: {}", self.index.size())?;
        }
        if self.is_morphing() {
            write!(f, " Morph: {}", self.morph_count)?;
        }
        if self.through_mode {
            write!(f, " (through)")?;
        }
        Ok(())
    }
}
