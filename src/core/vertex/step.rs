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

//! Per-component decode steps
//!
//! Each [`Step`] converts one component of one vertex from its packed guest
//! encoding into its canonical slot. The planner picks the step kinds and
//! bakes in the source and destination offsets, so executing a step is a
//! single `match` with no per-vertex format checks.
//!
//! All multi-byte values are little-endian in both layouts.

use super::decoder::DrawState;
use crate::core::color::{clamp_u8, convert_4_to_8, convert_5_to_8, convert_6_to_8};

/// Component category a step writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Weights,
    Texcoord,
    Color,
    Normal,
    Position,
}

/// Decode operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    WeightsU8,
    WeightsU16,
    WeightsFloat,

    TcU8,
    TcU16,
    TcU16Double,
    TcFloat,
    TcU8Through,
    TcU16Through,
    TcU16ThroughDouble,
    TcU8Prescale,
    TcU16Prescale,
    TcFloatPrescale,

    Color565,
    Color5551,
    Color4444,
    Color8888,
    Color565Morph,
    Color5551Morph,
    Color4444Morph,
    Color8888Morph,

    NormalS8,
    NormalS16,
    NormalS16ToFloat,
    NormalFloat,
    NormalS8Morph,
    NormalS16Morph,
    NormalFloatMorph,

    PosS8,
    PosS16,
    PosS16ToFloat,
    PosFloat,
    PosS8Through,
    PosS16Through,
    PosS8Morph,
    PosS16Morph,
    PosFloatMorph,
}

impl StepKind {
    /// The component category this step decodes
    pub fn category(self) -> Category {
        use StepKind::*;
        match self {
            WeightsU8 | WeightsU16 | WeightsFloat => Category::Weights,
            TcU8 | TcU16 | TcU16Double | TcFloat | TcU8Through | TcU16Through
            | TcU16ThroughDouble | TcU8Prescale | TcU16Prescale | TcFloatPrescale => {
                Category::Texcoord
            }
            Color565 | Color5551 | Color4444 | Color8888 | Color565Morph | Color5551Morph
            | Color4444Morph | Color8888Morph => Category::Color,
            NormalS8 | NormalS16 | NormalS16ToFloat | NormalFloat | NormalS8Morph
            | NormalS16Morph | NormalFloatMorph => Category::Normal,
            PosS8 | PosS16 | PosS16ToFloat | PosFloat | PosS8Through | PosS16Through
            | PosS8Morph | PosS16Morph | PosFloatMorph => Category::Position,
        }
    }

    /// Whether the step blends all morph targets
    pub fn is_morph(self) -> bool {
        use StepKind::*;
        matches!(
            self,
            Color565Morph
                | Color5551Morph
                | Color4444Morph
                | Color8888Morph
                | NormalS8Morph
                | NormalS16Morph
                | NormalFloatMorph
                | PosS8Morph
                | PosS16Morph
                | PosFloatMorph
        )
    }
}

/// Per-plan values every step may need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepParams {
    pub weight_count: usize,
    pub morph_count: usize,
    /// Distance between morph targets inside one vertex
    pub one_size: usize,
}

/// One planned decode operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub kind: StepKind,
    /// Component offset inside the source vertex
    pub src: usize,
    /// Slot offset inside the canonical vertex
    pub dst: usize,
}

#[inline(always)]
fn read_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

#[inline(always)]
fn read_i16(buf: &[u8], off: usize) -> i16 {
    read_u16(buf, off) as i16
}

#[inline(always)]
fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

#[inline(always)]
fn read_f32(buf: &[u8], off: usize) -> f32 {
    f32::from_bits(read_u32(buf, off))
}

#[inline(always)]
fn write_u32(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline(always)]
fn write_f32(buf: &mut [u8], off: usize, value: f32) {
    write_u32(buf, off, value.to_bits());
}

#[inline(always)]
fn write_i16(buf: &mut [u8], off: usize, value: i16) {
    buf[off..off + 2].copy_from_slice(&value.to_le_bytes());
}

/// Zero weight slots from `j` up to the next multiple of four
#[inline(always)]
fn zero_weight_padding(dst: &mut [u8], base: usize, mut j: usize) {
    while j & 3 != 0 {
        write_u32(dst, base + j * 4, 0);
        j += 1;
    }
}

impl Step {
    /// Decode this component of one vertex
    ///
    /// # Arguments
    ///
    /// * `params` - Plan-wide counts and morph spacing
    /// * `src` - The guest vertex, all morph targets included
    /// * `dst` - The canonical vertex
    /// * `state` - Per-draw morph weights, UV scale and normal direction
    /// * `full_alpha` - Cleared when a decoded alpha is not fully opaque
    #[inline]
    pub fn execute(
        &self,
        params: &StepParams,
        src: &[u8],
        dst: &mut [u8],
        state: &DrawState,
        full_alpha: &mut bool,
    ) {
        let s = self.src;
        let d = self.dst;

        match self.kind {
            StepKind::WeightsU8 => {
                for j in 0..params.weight_count {
                    write_f32(dst, d + j * 4, src[s + j] as f32 / 255.0);
                }
                zero_weight_padding(dst, d, params.weight_count);
            }
            StepKind::WeightsU16 => {
                for j in 0..params.weight_count {
                    let w = read_u16(src, s + j * 2);
                    write_f32(dst, d + j * 4, w as f32 / 65535.0);
                }
                zero_weight_padding(dst, d, params.weight_count);
            }
            StepKind::WeightsFloat => {
                for j in 0..params.weight_count {
                    write_u32(dst, d + j * 4, read_u32(src, s + j * 4));
                }
                zero_weight_padding(dst, d, params.weight_count);
            }

            StepKind::TcU8 => {
                write_f32(dst, d, src[s] as f32 / 128.0);
                write_f32(dst, d + 4, src[s + 1] as f32 / 128.0);
            }
            StepKind::TcU16 => {
                write_f32(dst, d, read_u16(src, s) as f32 / 32768.0);
                write_f32(dst, d + 4, read_u16(src, s + 2) as f32 / 32768.0);
            }
            StepKind::TcU16Double => {
                write_f32(dst, d, read_u16(src, s) as f32 / 16384.0);
                write_f32(dst, d + 4, read_u16(src, s + 2) as f32 / 16384.0);
            }
            StepKind::TcFloat => {
                write_u32(dst, d, read_u32(src, s));
                write_u32(dst, d + 4, read_u32(src, s + 4));
            }
            StepKind::TcU8Through => {
                write_f32(dst, d, src[s] as f32);
                write_f32(dst, d + 4, src[s + 1] as f32);
            }
            StepKind::TcU16Through => {
                write_f32(dst, d, read_u16(src, s) as f32);
                write_f32(dst, d + 4, read_u16(src, s + 2) as f32);
            }
            StepKind::TcU16ThroughDouble => {
                write_f32(dst, d, read_u16(src, s) as f32 * 2.0);
                write_f32(dst, d + 4, read_u16(src, s + 2) as f32 * 2.0);
            }
            StepKind::TcU8Prescale => {
                let uv = &state.uv_scale;
                write_f32(dst, d, src[s] as f32 / 128.0 * uv.u_scale + uv.u_offset);
                write_f32(dst, d + 4, src[s + 1] as f32 / 128.0 * uv.v_scale + uv.v_offset);
            }
            StepKind::TcU16Prescale => {
                let uv = &state.uv_scale;
                let u = read_u16(src, s) as f32 / 32768.0;
                let v = read_u16(src, s + 2) as f32 / 32768.0;
                write_f32(dst, d, u * uv.u_scale + uv.u_offset);
                write_f32(dst, d + 4, v * uv.v_scale + uv.v_offset);
            }
            StepKind::TcFloatPrescale => {
                let uv = &state.uv_scale;
                write_f32(dst, d, read_f32(src, s) * uv.u_scale + uv.u_offset);
                write_f32(dst, d + 4, read_f32(src, s + 4) * uv.v_scale + uv.v_offset);
            }

            StepKind::Color565 => {
                let c = read_u16(src, s);
                dst[d] = convert_5_to_8(c);
                dst[d + 1] = convert_6_to_8(c >> 5);
                dst[d + 2] = convert_5_to_8(c >> 11);
                dst[d + 3] = 255;
            }
            StepKind::Color5551 => {
                let c = read_u16(src, s);
                dst[d] = convert_5_to_8(c);
                dst[d + 1] = convert_5_to_8(c >> 5);
                dst[d + 2] = convert_5_to_8(c >> 10);
                dst[d + 3] = if c >> 15 != 0 { 255 } else { 0 };
                *full_alpha &= dst[d + 3] != 0;
            }
            StepKind::Color4444 => {
                let c = read_u16(src, s);
                for j in 0..4 {
                    dst[d + j] = convert_4_to_8(c >> (j * 4));
                }
                *full_alpha &= dst[d + 3] == 255;
            }
            StepKind::Color8888 => {
                dst[d..d + 4].copy_from_slice(&src[s..s + 4]);
                *full_alpha &= dst[d + 3] == 255;
            }
            StepKind::Color565Morph => {
                let mut col = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let w = state.morph_weights[n];
                    let c = read_u16(src, s + params.one_size * n);
                    col[0] += w * (c & 0x1F) as f32 * (255.0 / 31.0);
                    col[1] += w * ((c >> 5) & 0x3F) as f32 * (255.0 / 63.0);
                    col[2] += w * ((c >> 11) & 0x1F) as f32 * (255.0 / 31.0);
                }
                for (i, value) in col.iter().enumerate() {
                    dst[d + i] = clamp_u8(*value as i32);
                }
                dst[d + 3] = 255;
            }
            StepKind::Color5551Morph => {
                let mut col = [0.0f32; 4];
                for n in 0..params.morph_count {
                    let w = state.morph_weights[n];
                    let c = read_u16(src, s + params.one_size * n);
                    col[0] += w * (c & 0x1F) as f32 * (255.0 / 31.0);
                    col[1] += w * ((c >> 5) & 0x1F) as f32 * (255.0 / 31.0);
                    col[2] += w * ((c >> 10) & 0x1F) as f32 * (255.0 / 31.0);
                    col[3] += w * if c >> 15 != 0 { 255.0 } else { 0.0 };
                }
                for (i, value) in col.iter().enumerate() {
                    dst[d + i] = clamp_u8(*value as i32);
                }
                *full_alpha &= dst[d + 3] == 255;
            }
            StepKind::Color4444Morph => {
                let mut col = [0.0f32; 4];
                for n in 0..params.morph_count {
                    let w = state.morph_weights[n];
                    let c = read_u16(src, s + params.one_size * n);
                    for (j, channel) in col.iter_mut().enumerate() {
                        *channel += w * ((c >> (j * 4)) & 0xF) as f32 * (255.0 / 15.0);
                    }
                }
                for (i, value) in col.iter().enumerate() {
                    dst[d + i] = clamp_u8(*value as i32);
                }
                *full_alpha &= dst[d + 3] == 255;
            }
            StepKind::Color8888Morph => {
                let mut col = [0.0f32; 4];
                for n in 0..params.morph_count {
                    let w = state.morph_weights[n];
                    let base = s + params.one_size * n;
                    for (j, channel) in col.iter_mut().enumerate() {
                        *channel += w * src[base + j] as f32;
                    }
                }
                for (i, value) in col.iter().enumerate() {
                    dst[d + i] = clamp_u8(*value as i32);
                }
                *full_alpha &= dst[d + 3] == 255;
            }

            StepKind::NormalS8 => {
                for j in 0..3 {
                    write_f32(dst, d + j * 4, src[s + j] as i8 as f32 / 127.0);
                }
            }
            StepKind::NormalS16 => {
                for j in 0..3 {
                    write_i16(dst, d + j * 2, read_i16(src, s + j * 2));
                }
                write_i16(dst, d + 6, 0);
            }
            StepKind::NormalS16ToFloat => {
                for j in 0..3 {
                    write_f32(dst, d + j * 4, read_i16(src, s + j * 2) as f32 / 32767.0);
                }
            }
            StepKind::NormalFloat => {
                for j in 0..3 {
                    write_u32(dst, d + j * 4, read_u32(src, s + j * 4));
                }
            }
            StepKind::NormalS8Morph => {
                let mut normal = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let multiplier = state.normal_sign() * state.morph_weights[n] / 127.0;
                    let base = s + params.one_size * n;
                    for (j, value) in normal.iter_mut().enumerate() {
                        *value += src[base + j] as i8 as f32 * multiplier;
                    }
                }
                for (j, value) in normal.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }
            StepKind::NormalS16Morph => {
                let mut normal = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let multiplier = state.normal_sign() * state.morph_weights[n] / 32767.0;
                    let base = s + params.one_size * n;
                    for (j, value) in normal.iter_mut().enumerate() {
                        *value += read_i16(src, base + j * 2) as f32 * multiplier;
                    }
                }
                for (j, value) in normal.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }
            StepKind::NormalFloatMorph => {
                let mut normal = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let multiplier = state.normal_sign() * state.morph_weights[n];
                    let base = s + params.one_size * n;
                    for (j, value) in normal.iter_mut().enumerate() {
                        *value += read_f32(src, base + j * 4) * multiplier;
                    }
                }
                for (j, value) in normal.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }

            StepKind::PosS8 => {
                for j in 0..3 {
                    write_f32(dst, d + j * 4, src[s + j] as i8 as f32 / 128.0);
                }
            }
            StepKind::PosS16 => {
                for j in 0..3 {
                    write_i16(dst, d + j * 2, read_i16(src, s + j * 2));
                }
                write_i16(dst, d + 6, 0);
            }
            StepKind::PosS16ToFloat => {
                for j in 0..3 {
                    write_f32(dst, d + j * 4, read_i16(src, s + j * 2) as f32 / 32768.0);
                }
            }
            StepKind::PosFloat => {
                for j in 0..3 {
                    write_u32(dst, d + j * 4, read_u32(src, s + j * 4));
                }
            }
            StepKind::PosS8Through => {
                for j in 0..3 {
                    write_f32(dst, d + j * 4, src[s + j] as i8 as f32);
                }
            }
            StepKind::PosS16Through => {
                // Z is an unsigned depth value in through mode.
                write_f32(dst, d, read_i16(src, s) as f32);
                write_f32(dst, d + 4, read_i16(src, s + 2) as f32);
                write_f32(dst, d + 8, read_u16(src, s + 4) as f32);
            }
            StepKind::PosS8Morph => {
                let mut pos = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let multiplier = state.morph_weights[n] / 128.0;
                    let base = s + params.one_size * n;
                    for (j, value) in pos.iter_mut().enumerate() {
                        *value += src[base + j] as i8 as f32 * multiplier;
                    }
                }
                for (j, value) in pos.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }
            StepKind::PosS16Morph => {
                let mut pos = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let multiplier = state.morph_weights[n] / 32768.0;
                    let base = s + params.one_size * n;
                    for (j, value) in pos.iter_mut().enumerate() {
                        *value += read_i16(src, base + j * 2) as f32 * multiplier;
                    }
                }
                for (j, value) in pos.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }
            StepKind::PosFloatMorph => {
                let mut pos = [0.0f32; 3];
                for n in 0..params.morph_count {
                    let w = state.morph_weights[n];
                    let base = s + params.one_size * n;
                    for (j, value) in pos.iter_mut().enumerate() {
                        *value += read_f32(src, base + j * 4) * w;
                    }
                }
                for (j, value) in pos.iter().enumerate() {
                    write_f32(dst, d + j * 4, *value);
                }
            }
        }
    }
}
