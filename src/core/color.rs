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

//! Color channel expansion helpers
//!
//! Packed PSP colors store channels with 4, 5 or 6 bits. Expanding to 8 bits
//! replicates the high bits into the low bits so that the maximum channel value
//! maps to 255 exactly.
//!
//! ```
//! use pspge::core::color::{convert_4_to_8, convert_5_to_8, convert_6_to_8};
//!
//! assert_eq!(convert_5_to_8(31), 255);
//! assert_eq!(convert_6_to_8(63), 255);
//! assert_eq!(convert_4_to_8(0xF), 255);
//! assert_eq!(convert_5_to_8(0x10), 0x84);
//! ```

/// Expand a 4-bit channel to 8 bits
#[inline(always)]
pub fn convert_4_to_8(value: u16) -> u8 {
    let v = (value & 0xF) as u8;
    (v << 4) | v
}

/// Expand a 5-bit channel to 8 bits
#[inline(always)]
pub fn convert_5_to_8(value: u16) -> u8 {
    let v = (value & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

/// Expand a 6-bit channel to 8 bits
#[inline(always)]
pub fn convert_6_to_8(value: u16) -> u8 {
    let v = (value & 0x3F) as u8;
    (v << 2) | (v >> 4)
}

/// Clamp an integer to the 0-255 range
#[inline(always)]
pub fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
