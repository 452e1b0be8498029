// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Decode engine tests: numeric rules per component and buffer validation

use super::super::*;
use super::helpers::*;
use crate::core::error::{GeError, VertexError};

const POS_S8: u32 = 1 << 7;
const POS_S16: u32 = 2 << 7;
const POS_FLOAT: u32 = 3 << 7;
const MORPH2: u32 = 1 << 18;

// Positions

#[test]
fn test_position_s8_normalized() {
    let (dst, _, _) = decode_all(POS_S8, &[0x40, 0x00, 0xC0], 1);
    assert_eq!(vec3_at(&dst, 0), [0.5, 0.0, -0.5]);
}

#[test]
fn test_position_s16_integer_slots() {
    let src = i16_bytes(&[0x1234, -2, 7]);
    let (dst, _, plan) = decode_all(POS_S16, &src, 1);
    assert_eq!(plan.canonical.stride, 8);
    assert_eq!(i16_at(&dst, 0), 0x1234);
    assert_eq!(i16_at(&dst, 2), -2);
    assert_eq!(i16_at(&dst, 4), 7);
    assert_eq!(i16_at(&dst, 6), 0);
}

#[test]
fn test_position_s16_float_policy() {
    let options = DecoderOptions {
        integer_s16_attributes: false,
        ..DecoderOptions::default()
    };
    let src = i16_bytes(&[16384, -32768, 0]);
    let (dst, _, _) = decode_with(POS_S16, &src, 1, &options, &DrawState::default());
    assert_eq!(vec3_at(&dst, 0), [0.5, -1.0, 0.0]);
}

#[test]
fn test_position_float_passthrough() {
    let values = [1.5, -2.25, 1.0e30];
    let mut src = f32_bytes(&values);
    // NaN payloads survive bit-exact
    src.extend_from_slice(&0x7FC0_1234u32.to_le_bytes());
    src.extend_from_slice(&f32_bytes(&[0.0, 0.0]));

    let (dst, _, _) = decode_all(POS_FLOAT, &src, 2);
    assert_eq!(vec3_at(&dst, 0), values);
    assert_eq!(&dst[12..16], &0x7FC0_1234u32.to_le_bytes());
}

#[test]
fn test_position_through_z_is_unsigned() {
    let code = FormatDescriptor::THROUGH | POS_S16;
    let mut src = i16_bytes(&[-5, 10]);
    src.extend_from_slice(&0xFFFFu16.to_le_bytes());
    let (dst, _, _) = decode_all(code, &src, 1);
    assert_eq!(vec3_at(&dst, 0), [-5.0, 10.0, 65535.0]);
}

#[test]
fn test_position_through_s8_literal() {
    let code = FormatDescriptor::THROUGH | POS_S8;
    let (dst, _, _) = decode_all(code, &[0x7F, 0x80, 0x01], 1);
    assert_eq!(vec3_at(&dst, 0), [127.0, -128.0, 1.0]);
}

// Weights

#[test]
fn test_weights_u8_zero_padding() {
    // 2 u8 weights, float position
    let code = 0x0000_4380;
    let mut src = vec![255, 0, 0xAA, 0xAA];
    src.extend_from_slice(&f32_bytes(&[1.0, 2.0, 3.0]));

    let (dst, _, plan) = decode_all(code, &src, 1);
    assert_eq!(plan.canonical.position.offset, 16);
    assert_eq!(f32_at(&dst, 0), 1.0);
    assert_eq!(f32_at(&dst, 4), 0.0);
    assert_eq!(f32_at(&dst, 8), 0.0);
    assert_eq!(f32_at(&dst, 12), 0.0);
    assert_eq!(vec3_at(&dst, 16), [1.0, 2.0, 3.0]);
}

#[test]
fn test_weights_u16() {
    // 2 u16 weights, s16 position
    let code = 0x0000_4500;
    let mut src = Vec::new();
    src.extend_from_slice(&65535u16.to_le_bytes());
    src.extend_from_slice(&32768u16.to_le_bytes());
    src.extend_from_slice(&i16_bytes(&[1, 2, 3]));

    let (dst, _, _) = decode_all(code, &src, 1);
    assert_eq!(f32_at(&dst, 0), 1.0);
    assert_eq!(f32_at(&dst, 4), 32768.0 / 65535.0);
}

#[test]
fn test_weights_float_second_group() {
    // 5 float weights, float position
    let code = 0x0001_0780;
    let weights = [0.1, 0.2, 0.3, 0.15, 0.25];
    let mut src = f32_bytes(&weights);
    src.extend_from_slice(&f32_bytes(&[0.0, 0.0, 0.0]));

    let (dst, _, plan) = decode_all(code, &src, 1);
    assert_eq!(plan.canonical.w1.offset, 16);
    for (j, w) in weights.iter().enumerate() {
        assert_eq!(f32_at(&dst, j * 4), *w);
    }
    assert_eq!(f32_at(&dst, 20), 0.0);
    assert_eq!(f32_at(&dst, 24), 0.0);
    assert_eq!(f32_at(&dst, 28), 0.0);
}

// Texture coordinates

#[test]
fn test_texcoord_normalization() {
    let (dst, _, _) = decode_all(POS_S8 | 1, &[64, 128, 0, 0, 0], 1);
    assert_eq!(f32_at(&dst, 0), 0.5);
    assert_eq!(f32_at(&dst, 4), 1.0);

    let mut src = Vec::new();
    src.extend_from_slice(&16384u16.to_le_bytes());
    src.extend_from_slice(&32768u16.to_le_bytes());
    src.extend_from_slice(&[0, 0, 0, 0]);
    let (dst, _, _) = decode_all(POS_S8 | 2, &src, 1);
    assert_eq!(f32_at(&dst, 0), 0.5);
    assert_eq!(f32_at(&dst, 4), 1.0);

    let remaster = DecoderOptions {
        double_texture_coordinates: true,
        ..DecoderOptions::default()
    };
    let (dst, _, _) = decode_with(POS_S8 | 2, &src, 1, &remaster, &DrawState::default());
    assert_eq!(f32_at(&dst, 0), 1.0);
    assert_eq!(f32_at(&dst, 4), 2.0);
}

#[test]
fn test_texcoord_through_literal() {
    let code = FormatDescriptor::THROUGH | POS_S8 | 1;
    let (dst, _, _) = decode_all(code, &[200, 3, 0, 0, 0], 1);
    assert_eq!(f32_at(&dst, 0), 200.0);
    assert_eq!(f32_at(&dst, 4), 3.0);

    let code = FormatDescriptor::THROUGH | POS_S16 | 2;
    let mut src = Vec::new();
    src.extend_from_slice(&3u16.to_le_bytes());
    src.extend_from_slice(&480u16.to_le_bytes());
    src.extend_from_slice(&i16_bytes(&[0, 0, 0]));
    let remaster = DecoderOptions {
        double_texture_coordinates: true,
        ..DecoderOptions::default()
    };
    let (dst, _, _) = decode_with(code, &src, 1, &remaster, &DrawState::default());
    assert_eq!(f32_at(&dst, 0), 6.0);
    assert_eq!(f32_at(&dst, 4), 960.0);
}

#[test]
fn test_texcoord_prescale() {
    let options = DecoderOptions {
        prescale_uv: true,
        ..DecoderOptions::default()
    };
    let state = DrawState {
        uv_scale: UvScale {
            u_scale: 2.0,
            v_scale: 0.5,
            u_offset: 0.25,
            v_offset: -1.0,
        },
        ..DrawState::default()
    };
    let (dst, _, _) = decode_with(POS_S8 | 1, &[64, 128, 0, 0, 0], 1, &options, &state);
    assert_eq!(f32_at(&dst, 0), 1.25);
    assert_eq!(f32_at(&dst, 4), -0.5);
}

// Colors

fn color_code(color: u32) -> u32 {
    POS_S8 | (color << 2)
}

/// One vertex of color followed by a zero s8 position, padded to the record size
fn color_vertex(packed: &[u8]) -> Vec<u8> {
    let mut src = packed.to_vec();
    src.resize(if packed.len() == 4 { 8 } else { 6 }, 0);
    src
}

#[test]
fn test_color_565() {
    let (dst, outcome, _) = decode_all(color_code(4), &color_vertex(&0x001Fu16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    assert!(outcome.vertex_full_alpha);

    let (dst, _, _) = decode_all(color_code(4), &color_vertex(&0xF800u16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[0, 0, 255, 255]);

    let (dst, _, _) = decode_all(color_code(4), &color_vertex(&0x07E0u16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[0, 255, 0, 255]);
}

#[test]
fn test_color_5551_alpha() {
    let (dst, outcome, _) = decode_all(color_code(5), &color_vertex(&0x801Fu16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    assert!(outcome.vertex_full_alpha);

    let (dst, outcome, _) = decode_all(color_code(5), &color_vertex(&0x7C00u16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[0, 0, 255, 0]);
    assert!(!outcome.vertex_full_alpha);
}

#[test]
fn test_color_4444() {
    let (dst, outcome, _) = decode_all(color_code(6), &color_vertex(&0xF0F0u16.to_le_bytes()), 1);
    assert_eq!(&dst[0..4], &[0, 255, 0, 255]);
    assert!(outcome.vertex_full_alpha);

    let (dst, outcome, _) = decode_all(color_code(6), &color_vertex(&0xEFFFu16.to_le_bytes()), 1);
    assert_eq!(dst[3], 0xEE);
    assert!(!outcome.vertex_full_alpha);
}

#[test]
fn test_color_8888() {
    let (dst, outcome, _) = decode_all(color_code(7), &color_vertex(&[1, 2, 3, 255]), 1);
    assert_eq!(&dst[0..4], &[1, 2, 3, 255]);
    assert!(outcome.vertex_full_alpha);

    let (_, outcome, _) = decode_all(color_code(7), &color_vertex(&[1, 2, 3, 254]), 1);
    assert!(!outcome.vertex_full_alpha);
}

#[test]
fn test_full_alpha_reduced_across_draw() {
    // 8888 color, s8 position: 8 bytes per vertex
    let src = [
        10, 20, 30, 255, 0, 0, 0, 0, //
        10, 20, 30, 128, 0, 0, 0, 0, //
        10, 20, 30, 255, 0, 0, 0, 0,
    ];
    let (_, outcome, _) = decode_all(color_code(7), &src, 3);
    assert_eq!(outcome.vertex_count, 3);
    assert!(!outcome.vertex_full_alpha);
}

// Morphing

fn half_and_half() -> DrawState {
    let mut state = DrawState::default();
    state.morph_weights[0] = 0.5;
    state.morph_weights[1] = 0.5;
    state
}

#[test]
fn test_color_and_position_morph() {
    // 8888 color, s8 position, 2 targets of 8 bytes
    let code = color_code(7) | MORPH2;
    let src = [
        200, 100, 0, 255, 64, 0, 0, 0, //
        100, 100, 255, 255, 0, 64, 0, 0,
    ];
    let (dst, outcome, plan) = decode_with(code, &src, 1, &DecoderOptions::default(), &half_and_half());
    assert_eq!(plan.source.record_stride, 16);
    assert_eq!(&dst[0..4], &[150, 100, 127, 255]);
    assert!(outcome.vertex_full_alpha);
    assert_eq!(vec3_at(&dst, 4), [0.25, 0.25, 0.0]);
}

#[test]
fn test_color_morph_clamps() {
    let code = color_code(7) | MORPH2;
    let src = [
        200, 0, 0, 255, 0, 0, 0, 0, //
        100, 0, 0, 255, 0, 0, 0, 0,
    ];
    let mut state = DrawState::default();
    state.morph_weights[1] = 1.0;
    let (dst, _, _) = decode_with(code, &src, 1, &DecoderOptions::default(), &state);
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
}

#[test]
fn test_color_565_morph_is_opaque() {
    let code = color_code(4) | MORPH2;
    // 565 color at 0, s8 position at 2, one_size 6
    let mut src = Vec::new();
    src.extend_from_slice(&0x001Fu16.to_le_bytes());
    src.extend_from_slice(&[0, 0, 0, 0]);
    src.extend_from_slice(&0x0000u16.to_le_bytes());
    src.extend_from_slice(&[0, 0, 0, 0]);

    let (dst, outcome, plan) = decode_with(code, &src, 1, &DecoderOptions::default(), &half_and_half());
    assert_eq!(plan.source.one_size, 6);
    assert_eq!(&dst[0..4], &[127, 0, 0, 255]);
    assert!(outcome.vertex_full_alpha);
}

#[test]
fn test_normal_s8_morph_reversed() {
    // s8 normal, s8 position, 2 targets of 6 bytes
    let code = (1 << 5) | POS_S8 | MORPH2;
    let src = [127, 0, 0x81, 0, 0, 0, 1, 2, 3, 0, 0, 0];
    let state = DrawState {
        reverse_normals: true,
        ..DrawState::default()
    };
    let (dst, _, _) = decode_with(code, &src, 1, &DecoderOptions::default(), &state);
    let normal = vec3_at(&dst, 0);
    assert_close(normal[0], -1.0);
    assert_close(normal[1], 0.0);
    assert_close(normal[2], 1.0);
}

#[test]
fn test_normal_float_morph_accumulates_samples() {
    let code = (3 << 5) | POS_FLOAT | MORPH2;
    let mut src = f32_bytes(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    src.extend_from_slice(&f32_bytes(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]));
    let mut state = DrawState::default();
    state.morph_weights[0] = 0.25;
    state.morph_weights[1] = 0.75;

    let (dst, _, _) = decode_with(code, &src, 1, &DecoderOptions::default(), &state);
    assert_eq!(vec3_at(&dst, 0), [0.25, 0.75, 0.0]);
}

#[test]
fn test_position_s16_morph() {
    let code = POS_S16 | MORPH2;
    let mut src = i16_bytes(&[16384, 0, -32768]);
    src.extend_from_slice(&i16_bytes(&[0, 16384, 0]));
    let (dst, _, _) = decode_with(code, &src, 1, &DecoderOptions::default(), &half_and_half());
    assert_eq!(vec3_at(&dst, 0), [0.25, 0.25, -0.5]);
}

// Normals

#[test]
fn test_normal_s8() {
    let code = (1 << 5) | POS_S8;
    let (dst, _, _) = decode_all(code, &[127, 0x81, 0, 0, 0, 0], 1);
    assert_eq!(vec3_at(&dst, 0), [1.0, -1.0, 0.0]);
}

#[test]
fn test_normal_s16_integer_slots() {
    let code = (2 << 5) | POS_S16;
    let mut src = i16_bytes(&[-100, 200, 32767]);
    src.extend_from_slice(&i16_bytes(&[0, 0, 0]));
    let (dst, _, _) = decode_all(code, &src, 1);
    assert_eq!(i16_at(&dst, 0), -100);
    assert_eq!(i16_at(&dst, 2), 200);
    assert_eq!(i16_at(&dst, 4), 32767);
    assert_eq!(i16_at(&dst, 6), 0);
}

#[test]
fn test_normal_s16_float_policy() {
    let options = DecoderOptions {
        integer_s16_attributes: false,
        ..DecoderOptions::default()
    };
    let code = (2 << 5) | POS_S16;
    let mut src = i16_bytes(&[32767, -32767, 0]);
    src.extend_from_slice(&i16_bytes(&[0, 0, 0]));
    let (dst, _, _) = decode_with(code, &src, 1, &options, &DrawState::default());
    assert_eq!(vec3_at(&dst, 0), [1.0, -1.0, 0.0]);
}

// Ranges and validation

#[test]
fn test_decode_subrange() {
    let src = [1, 0, 0, 2, 0, 0, 64, 0, 0, 32, 0, 0];
    let plan = plan(POS_S8, &DecoderOptions::default());
    let mut dst = vec![0u8; plan.canonical.stride * 2];
    let outcome = plan.decode(&mut dst, &src, 2, 3, &DrawState::default()).unwrap();

    assert_eq!(outcome.vertex_count, 2);
    assert_eq!(f32_at(&dst, 0), 0.5);
    assert_eq!(f32_at(&dst, 12), 0.25);
}

#[test]
fn test_invalid_range() {
    let plan = plan(POS_S8, &DecoderOptions::default());
    let mut dst = vec![0u8; 64];
    let err = plan.decode(&mut dst, &[0; 12], 3, 1, &DrawState::default()).unwrap_err();
    assert!(matches!(
        err,
        GeError::Vertex(VertexError::InvalidRange { lower: 3, upper: 1 })
    ));
}

#[test]
fn test_source_too_short() {
    let plan = plan(POS_S8, &DecoderOptions::default());
    let mut dst = vec![0u8; 64];
    let err = plan.decode(&mut dst, &[0; 5], 0, 1, &DrawState::default()).unwrap_err();
    assert!(matches!(
        err,
        GeError::Vertex(VertexError::SourceTooShort { needed: 6, got: 5 })
    ));
}

#[test]
fn test_destination_too_small() {
    let plan = plan(POS_S8, &DecoderOptions::default());
    let mut dst = vec![0u8; 12];
    let err = plan.decode(&mut dst, &[0; 6], 0, 1, &DrawState::default()).unwrap_err();
    assert!(matches!(
        err,
        GeError::Vertex(VertexError::DestinationTooSmall { needed: 24, got: 12 })
    ));
}

#[test]
fn test_malformed_leaves_position_untouched() {
    let mut src = Vec::new();
    src.extend_from_slice(&16384u16.to_le_bytes());
    src.extend_from_slice(&16384u16.to_le_bytes());
    let (dst, outcome, plan) = decode_all(0x0000_0002, &src, 1);

    assert!(plan.malformed);
    assert_eq!(outcome.vertex_count, 1);
    assert_eq!(f32_at(&dst, 0), 0.5);
    assert!(dst[8..20].iter().all(|&b| b == 0xCD));
}

// Cache

#[test]
fn test_cache_shares_plans() {
    let mut cache = DecoderCache::new(DecoderOptions::default());
    let a = cache.get(0x0000_019E);
    let b = cache.get(0x0000_019E);
    let c = cache.get(0x0000_0080);

    assert!(std::rc::Rc::ptr_eq(&a, &b));
    assert!(!std::rc::Rc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_flushes_on_option_change() {
    let mut cache = DecoderCache::new(DecoderOptions::default());
    let before = cache.get(POS_S16);
    assert_eq!(before.canonical.position.format, DecFormat::S16x3);

    cache.set_options(DecoderOptions::default());
    assert_eq!(cache.len(), 1);

    cache.set_options(DecoderOptions {
        integer_s16_attributes: false,
        ..DecoderOptions::default()
    });
    assert!(cache.is_empty());
    let after = cache.get(POS_S16);
    assert_eq!(after.canonical.position.format, DecFormat::Float3);
}

#[test]
fn test_slot_values_read_back() {
    let src = i16_bytes(&[100, -200, 300]);
    let (dst, _, plan) = decode_all(POS_S16, &src, 1);
    assert_eq!(plan.canonical.position.values(&dst), vec![100.0, -200.0, 300.0]);

    let (dst, _, plan) = decode_all(POS_FLOAT, &f32_bytes(&[1.5, 2.0, -3.0]), 1);
    assert_eq!(plan.canonical.position.values(&dst), vec![1.5, 2.0, -3.0]);
}
