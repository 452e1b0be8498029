// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Shared helpers for vertex tests

use super::super::*;

/// Read a little-endian f32 from a canonical record
pub fn f32_at(buf: &[u8], off: usize) -> f32 {
    f32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Read a little-endian i16 from a canonical record
pub fn i16_at(buf: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([buf[off], buf[off + 1]])
}

/// Read three consecutive f32 values
pub fn vec3_at(buf: &[u8], off: usize) -> [f32; 3] {
    [f32_at(buf, off), f32_at(buf, off + 4), f32_at(buf, off + 8)]
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// Decode a whole source buffer of `count` vertices with default state
pub fn decode_all(code: u32, src: &[u8], count: u16) -> (Vec<u8>, DecodeOutcome, VertexPlan) {
    decode_with(code, src, count, &DecoderOptions::default(), &DrawState::default())
}

pub fn decode_with(
    code: u32,
    src: &[u8],
    count: u16,
    options: &DecoderOptions,
    state: &DrawState,
) -> (Vec<u8>, DecodeOutcome, VertexPlan) {
    let plan = plan(code, options);
    let mut dst = vec![0xCDu8; plan.canonical.stride * count as usize];
    let outcome = plan.decode(&mut dst, src, 0, count - 1, state).unwrap();
    (dst, outcome, plan)
}

/// Little-endian bytes of a list of f32 values
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Little-endian bytes of a list of i16 values
pub fn i16_bytes(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
