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

//! Decode step planning
//!
//! Turns a [`FormatDescriptor`] into a [`VertexPlan`]: where each component
//! sits in the guest record, where it lands in the canonical record, and the
//! ordered list of [`Step`]s that moves it there. Planning is a pure function
//! of the format code and the [`DecoderOptions`], so plans are cached per code.
//!
//! # Example
//!
//! ```
//! use pspge::core::vertex::{plan, DecFormat, DecoderOptions};
//!
//! // 16-bit texcoords, 8888 color, float positions
//! let plan = plan(0x0000_019E, &DecoderOptions::default());
//! assert_eq!(plan.source.record_stride, 20);
//! assert_eq!(plan.canonical.uv.format, DecFormat::Float2);
//! assert_eq!(plan.canonical.position.format, DecFormat::Float3);
//! assert_eq!(plan.steps.len(), 3);
//! ```

use super::format::{ColorType, ComponentType, FormatDescriptor};
use super::layout::{align_up, CanonicalLayout, DecFormat, SourceLayout};
use super::step::{Step, StepKind, StepParams};
use crate::core::config::BackendConfig;
use crate::core::error::VertexError;

/// Options that change which steps are selected
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct DecoderOptions {
    /// Apply the texture scale/offset while decoding texcoords
    pub prescale_uv: bool,
    /// 16-bit texcoords are stored at double scale
    pub double_texture_coordinates: bool,
    /// Keep non-morphed 16-bit normals and positions as integers
    pub integer_s16_attributes: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            prescale_uv: false,
            double_texture_coordinates: false,
            integer_s16_attributes: true,
        }
    }
}

impl From<&BackendConfig> for DecoderOptions {
    fn from(config: &BackendConfig) -> Self {
        Self {
            prescale_uv: config.prescale_uv,
            double_texture_coordinates: config.double_texture_coordinates,
            integer_s16_attributes: config.integer_s16_attributes,
        }
    }
}

/// Everything needed to decode vertices of one format code
#[derive(Debug, Clone, PartialEq)]
pub struct VertexPlan {
    pub descriptor: FormatDescriptor,
    pub source: SourceLayout,
    pub canonical: CanonicalLayout,
    /// Steps in category order: weights, texcoord, color, normal, position
    pub steps: Vec<Step>,
    /// The code has no position component
    pub malformed: bool,
}

impl VertexPlan {
    /// Counts and spacing shared by every step of this plan
    pub fn params(&self) -> StepParams {
        StepParams {
            weight_count: self.descriptor.weight_count,
            morph_count: self.descriptor.morph_count,
            one_size: self.source.one_size,
        }
    }
}

/// Running source offset and alignment while laying out one morph target
struct SourceCursor {
    offset: usize,
    biggest: usize,
}

impl SourceCursor {
    fn place(&mut self, size: usize, align: usize) -> usize {
        self.offset = align_up(self.offset, align);
        let at = self.offset;
        self.offset += size;
        self.biggest = self.biggest.max(align);
        at
    }
}

fn texcoord_step(ty: ComponentType, through: bool, options: &DecoderOptions) -> StepKind {
    use ComponentType::*;
    if through {
        return match (ty, options.double_texture_coordinates) {
            (U8, _) => StepKind::TcU8Through,
            (U16, false) => StepKind::TcU16Through,
            (U16, true) => StepKind::TcU16ThroughDouble,
            _ => StepKind::TcFloat,
        };
    }
    if options.prescale_uv {
        return match ty {
            U8 => StepKind::TcU8Prescale,
            U16 => StepKind::TcU16Prescale,
            _ => StepKind::TcFloatPrescale,
        };
    }
    match (ty, options.double_texture_coordinates) {
        (U8, _) => StepKind::TcU8,
        (U16, false) => StepKind::TcU16,
        (U16, true) => StepKind::TcU16Double,
        _ => StepKind::TcFloat,
    }
}

fn color_step(ty: ColorType, morph: bool) -> Option<StepKind> {
    let kind = match (ty, morph) {
        (ColorType::Rgb565, false) => StepKind::Color565,
        (ColorType::Rgba5551, false) => StepKind::Color5551,
        (ColorType::Rgba4444, false) => StepKind::Color4444,
        (ColorType::Rgba8888, false) => StepKind::Color8888,
        (ColorType::Rgb565, true) => StepKind::Color565Morph,
        (ColorType::Rgba5551, true) => StepKind::Color5551Morph,
        (ColorType::Rgba4444, true) => StepKind::Color4444Morph,
        (ColorType::Rgba8888, true) => StepKind::Color8888Morph,
        _ => return None,
    };
    Some(kind)
}

fn normal_step(ty: ComponentType, morph: bool, options: &DecoderOptions) -> (StepKind, DecFormat) {
    use ComponentType::*;
    match (ty, morph) {
        (U8, false) => (StepKind::NormalS8, DecFormat::Float3),
        (U16, false) if options.integer_s16_attributes => (StepKind::NormalS16, DecFormat::S16x3),
        (U16, false) => (StepKind::NormalS16ToFloat, DecFormat::Float3),
        (U8, true) => (StepKind::NormalS8Morph, DecFormat::Float3),
        (U16, true) => (StepKind::NormalS16Morph, DecFormat::Float3),
        (_, true) => (StepKind::NormalFloatMorph, DecFormat::Float3),
        _ => (StepKind::NormalFloat, DecFormat::Float3),
    }
}

fn position_step(
    ty: ComponentType,
    through: bool,
    morph: bool,
    options: &DecoderOptions,
) -> (StepKind, DecFormat) {
    use ComponentType::*;
    if through {
        return match ty {
            U8 => (StepKind::PosS8Through, DecFormat::Float3),
            U16 => (StepKind::PosS16Through, DecFormat::Float3),
            _ => (StepKind::PosFloat, DecFormat::Float3),
        };
    }
    match (ty, morph) {
        (U8, false) => (StepKind::PosS8, DecFormat::Float3),
        (U16, false) if options.integer_s16_attributes => (StepKind::PosS16, DecFormat::S16x3),
        (U16, false) => (StepKind::PosS16ToFloat, DecFormat::Float3),
        (U8, true) => (StepKind::PosS8Morph, DecFormat::Float3),
        (U16, true) => (StepKind::PosS16Morph, DecFormat::Float3),
        (_, true) => (StepKind::PosFloatMorph, DecFormat::Float3),
        _ => (StepKind::PosFloat, DecFormat::Float3),
    }
}

/// Build the decode plan for a format code
///
/// # Arguments
///
/// * `code` - 32-bit vertex type register value
/// * `options` - Step selection options
///
/// # Returns
///
/// The plan. A code without a position component yields a plan with
/// `malformed` set, a reserved `Float3` position slot and no position step.
pub fn plan(code: u32, options: &DecoderOptions) -> VertexPlan {
    let descriptor = FormatDescriptor::from_code(code);
    let morph = descriptor.is_morphing();
    let through = descriptor.through_mode;

    let mut source = SourceLayout::default();
    let mut canonical = CanonicalLayout::default();
    let mut steps = Vec::with_capacity(5);
    let mut cursor = SourceCursor {
        offset: 0,
        biggest: 1,
    };

    if descriptor.weight.is_present() {
        let element = descriptor.weight.element_size();
        source.weight_offset = 0;
        cursor.offset = element * descriptor.weight_count;
        cursor.biggest = cursor.biggest.max(element);

        let kind = match descriptor.weight {
            ComponentType::U8 => StepKind::WeightsU8,
            ComponentType::U16 => StepKind::WeightsU16,
            _ => StepKind::WeightsFloat,
        };
        canonical.w0 = canonical.push(DecFormat::Float4);
        if descriptor.weight_count > 4 {
            canonical.w1 = canonical.push(DecFormat::Float4);
        }
        steps.push(Step {
            kind,
            src: 0,
            dst: canonical.w0.offset,
        });
    }

    if descriptor.texcoord.is_present() {
        let element = descriptor.texcoord.element_size();
        source.texcoord_offset = cursor.place(element * 2, element);
        canonical.uv = canonical.push(DecFormat::Float2);
        steps.push(Step {
            kind: texcoord_step(descriptor.texcoord, through, options),
            src: source.texcoord_offset,
            dst: canonical.uv.offset,
        });
    }

    if descriptor.color.is_present() {
        let size = descriptor.color.size();
        source.color_offset = cursor.place(size, size);
        if let Some(kind) = color_step(descriptor.color, morph) {
            canonical.color0 = canonical.push(DecFormat::U8x4);
            steps.push(Step {
                kind,
                src: source.color_offset,
                dst: canonical.color0.offset,
            });
        }
    }

    if descriptor.normal.is_present() {
        let element = descriptor.normal.element_size();
        source.normal_offset = cursor.place(element * 3, element);
        let (kind, format) = normal_step(descriptor.normal, morph, options);
        canonical.normal = canonical.push(format);
        steps.push(Step {
            kind,
            src: source.normal_offset,
            dst: canonical.normal.offset,
        });
    }

    let malformed = !descriptor.has_position();
    if malformed {
        log::error!("{} ({})", VertexError::MalformedFormat { code }, descriptor);
        canonical.position = canonical.push(DecFormat::Float3);
    } else {
        let element = descriptor.position.element_size();
        source.position_offset = cursor.place(element * 3, element);
        let (kind, format) = position_step(descriptor.position, through, morph, options);
        canonical.position = canonical.push(format);
        steps.push(Step {
            kind,
            src: source.position_offset,
            dst: canonical.position.offset,
        });
    }

    source.alignment = cursor.biggest;
    source.one_size = align_up(cursor.offset, cursor.biggest);
    source.record_stride = source.one_size * descriptor.morph_count;

    log::trace!(
        "Planned vertex format {:#010x}: {} steps, source stride {}, canonical stride {}",
        code,
        steps.len(),
        source.record_stride,
        canonical.stride
    );

    VertexPlan {
        descriptor,
        source,
        canonical,
        steps,
        malformed,
    }
}
