// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::super::convert::*;
use super::super::BufferFormat;

#[test]
fn test_pack_primaries() {
    let red = u32::from_le_bytes([255, 0, 0, 255]);
    let green = u32::from_le_bytes([0, 255, 0, 255]);
    let blue = u32::from_le_bytes([0, 0, 255, 0]);

    assert_eq!(rgba8888_to_rgb565(red), 0x001F);
    assert_eq!(rgba8888_to_rgb565(green), 0x07E0);
    assert_eq!(rgba8888_to_rgb565(blue), 0xF800);

    assert_eq!(rgba8888_to_rgba5551(red), 0x801F);
    assert_eq!(rgba8888_to_rgba5551(blue), 0x7C00);

    assert_eq!(rgba8888_to_rgba4444(green), 0xF0F0);
    assert_eq!(rgba8888_to_rgba4444(blue), 0x0F00);
}

#[test]
fn test_unpack_expands_full_range() {
    assert_eq!(rgb565_to_rgba8888(0xFFFF), [255, 255, 255, 255]);
    assert_eq!(rgb565_to_rgba8888(0x07E0), [0, 255, 0, 255]);
    assert_eq!(rgba5551_to_rgba8888(0x7C00), [0, 0, 255, 0]);
    assert_eq!(rgba4444_to_rgba8888(0xF00F), [255, 0, 0, 255]);
}

#[test]
fn test_rows_round_trip_representable_colors() {
    let src = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
    let mut packed = [0u8; 6];
    let mut unpacked = [0u8; 12];

    pack_row(&src, &mut packed, BufferFormat::Rgb565);
    unpack_row(&packed, &mut unpacked, BufferFormat::Rgb565);
    assert_eq!(unpacked, src);
}

#[test]
fn test_swap_red_blue() {
    let mut data = [1, 2, 3, 4, 5, 6, 7, 8];
    swap_red_blue(&mut data);
    assert_eq!(data, [3, 2, 1, 4, 7, 6, 5, 8]);
}
