// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for draw submission

mod batching;

use super::*;
use crate::core::vertex::DrawState;

pub const POS_FLOAT: u32 = 3 << 7;
pub const COLOR_5551: u32 = 5 << 2;
pub const INDEX_U8: u32 = 1 << 11;
pub const INDEX_U16: u32 = 2 << 11;

/// `n` float positions where vertex `i` is at `(i, 0, 0)`
pub fn positions(n: usize) -> Vec<u8> {
    (0..n)
        .flat_map(|i| [i as f32, 0.0, 0.0])
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// X coordinate of decoded record `n`
pub fn x_at(batch: &OwnedBatch, plan: &VertexPlan, n: usize) -> f32 {
    let record = batch.record(n);
    let at = plan.canonical.position.offset;
    f32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
}

pub fn engine() -> DrawEngine {
    DrawEngine::new(&BackendConfig::default())
}

pub fn engine_with_scratch(scratch_vertices: usize) -> DrawEngine {
    DrawEngine::new(&BackendConfig {
        scratch_vertices,
        ..BackendConfig::default()
    })
}

pub fn submit(
    engine: &mut DrawEngine,
    sink: &mut CollectingSink,
    verts: &[u8],
    inds: &[u8],
    count: usize,
    vert_type: u32,
) -> usize {
    engine
        .submit_prim(
            verts,
            inds,
            PrimitiveType::Triangles,
            count,
            vert_type,
            &DrawState::default(),
            sink,
        )
        .unwrap()
}
