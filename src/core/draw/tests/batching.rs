// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Batching across draws and flush triggers

use super::*;

#[test]
fn test_same_type_draws_share_batch() {
    let mut engine = engine();
    let mut sink = CollectingSink::default();
    let code = POS_FLOAT | INDEX_U8;

    submit(&mut engine, &mut sink, &positions(3), &[0, 1, 2], 3, code);
    submit(&mut engine, &mut sink, &positions(6), &[5, 4, 3], 3, code);
    assert!(sink.batches.is_empty());
    engine.flush(&mut sink);

    let batch = &sink.batches[0];
    assert_eq!(batch.draws.len(), 2);
    assert_eq!(batch.draws[1].first_vertex, 3);
    assert_eq!(batch.draws[1].first_index, 3);
    assert_eq!(batch.indices, vec![0, 1, 2, 5, 4, 3]);

    let plan = engine.plan_for(code);
    assert_eq!(x_at(batch, &plan, 3), 3.0);
    assert_eq!(x_at(batch, &plan, 5), 5.0);
}

#[test]
fn test_type_change_flushes() {
    let mut engine = engine();
    let mut sink = CollectingSink::default();

    submit(&mut engine, &mut sink, &positions(3), &[], 3, POS_FLOAT);
    let through = POS_FLOAT | crate::core::vertex::FormatDescriptor::THROUGH;
    submit(&mut engine, &mut sink, &positions(3), &[], 3, through);

    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].vert_type, POS_FLOAT);
    engine.flush(&mut sink);
    assert_eq!(sink.batches[1].vert_type, through);
    assert_eq!(engine.flush_count(), 2);
}

#[test]
fn test_index_type_change_keeps_batch() {
    let mut engine = engine();
    let mut sink = CollectingSink::default();

    submit(&mut engine, &mut sink, &positions(3), &[], 3, POS_FLOAT);
    submit(&mut engine, &mut sink, &positions(3), &[2, 1, 0], 3, POS_FLOAT | INDEX_U8);
    assert!(sink.batches.is_empty());

    engine.flush(&mut sink);
    assert_eq!(sink.batches[0].indices, vec![0, 1, 2, 5, 4, 3]);
}

#[test]
fn test_scratch_overflow_flushes() {
    let mut engine = engine_with_scratch(4);
    let mut sink = CollectingSink::default();

    submit(&mut engine, &mut sink, &positions(3), &[], 3, POS_FLOAT);
    submit(&mut engine, &mut sink, &positions(3), &[], 3, POS_FLOAT);
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(engine.pending_vertices(), 3);
    assert_eq!(engine.pending_draws(), 1);
}

#[test]
fn test_deferred_draw_limit() {
    let mut engine = engine();
    let mut sink = CollectingSink::default();
    let verts = positions(1);

    for _ in 0..MAX_DEFERRED_DRAW_CALLS {
        submit(&mut engine, &mut sink, &verts, &[], 1, POS_FLOAT);
    }
    assert!(sink.batches.is_empty());

    submit(&mut engine, &mut sink, &verts, &[], 1, POS_FLOAT);
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].draws.len(), MAX_DEFERRED_DRAW_CALLS);
    assert_eq!(engine.pending_draws(), 1);
}

#[test]
fn test_plans_are_shared() {
    let mut engine = engine();
    let a = engine.plan_for(POS_FLOAT);
    let b = engine.plan_for(POS_FLOAT);
    assert!(std::rc::Rc::ptr_eq(&a, &b));
    assert_eq!(engine.cached_plans(), 1);
}

#[test]
fn test_set_options_clears_cache() {
    let mut engine = engine();
    engine.plan_for(POS_FLOAT);

    engine.set_options(engine.options());
    assert_eq!(engine.cached_plans(), 1);

    engine.set_options(DecoderOptions {
        prescale_uv: true,
        ..engine.options()
    });
    assert_eq!(engine.cached_plans(), 0);
    assert!(engine.options().prescale_uv);
}

#[test]
fn test_layout_change_from_options_flushes() {
    const POS_S16: u32 = 2 << 7;
    let mut engine = engine();
    let mut sink = CollectingSink::default();
    let verts: Vec<u8> = [1i16, 2, 3, 4, 5, 6]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    submit(&mut engine, &mut sink, &verts, &[], 2, POS_S16);
    let integer_stride = engine.plan_for(POS_S16).canonical.stride;

    engine.set_options(DecoderOptions {
        integer_s16_attributes: false,
        ..engine.options()
    });
    submit(&mut engine, &mut sink, &verts, &[], 2, POS_S16);
    let float_stride = engine.plan_for(POS_S16).canonical.stride;
    assert_ne!(integer_stride, float_stride);

    // The second draw cannot share records with the first.
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].stride, integer_stride);
    assert_eq!(sink.batches[0].vertices.len(), 2 * integer_stride);

    engine.flush(&mut sink);
    assert_eq!(sink.batches.len(), 2);
    let second = &sink.batches[1];
    assert_eq!(second.stride, float_stride);
    assert_eq!(second.vertices.len(), 2 * float_stride);
    assert_eq!(second.indices, vec![0, 1]);
}
