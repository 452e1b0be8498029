// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Property tests over arbitrary format codes

use super::super::*;
use proptest::prelude::*;

/// Every defined field bit of the vertex type register
const CODE_MASK: u32 = 0x001D_DFFF | FormatDescriptor::THROUGH;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn test_plan_is_deterministic(raw in any::<u32>()) {
        let code = raw & CODE_MASK;
        let options = DecoderOptions::default();
        prop_assert_eq!(plan(code, &options), plan(code, &options));
    }

    #[test]
    fn test_layout_invariants(raw in any::<u32>()) {
        let code = raw & CODE_MASK;
        let plan = plan(code, &DecoderOptions::default());
        let desc = plan.descriptor;

        prop_assert_eq!(plan.source.one_size % plan.source.alignment, 0);
        prop_assert_eq!(plan.source.record_stride, plan.source.one_size * desc.morph_count);
        prop_assert!(plan.canonical.position.is_present());
        prop_assert_eq!(plan.malformed, !desc.has_position());

        let morph_steps = plan.steps.iter().filter(|s| s.kind.is_morph()).count();
        if !desc.is_morphing() {
            prop_assert_eq!(morph_steps, 0);
        }
    }

    #[test]
    fn test_decode_is_deterministic(
        raw in any::<u32>(),
        src in proptest::collection::vec(any::<u8>(), 0..1024),
        reverse in any::<bool>(),
    ) {
        let code = raw & CODE_MASK;
        let plan = plan(code, &DecoderOptions::default());
        prop_assume!(plan.source.record_stride > 0);
        let count = (src.len() / plan.source.record_stride).min(u16::MAX as usize);
        prop_assume!(count > 0);

        let state = DrawState {
            reverse_normals: reverse,
            ..DrawState::default()
        };
        let mut first = vec![0u8; plan.canonical.stride * count];
        let mut second = vec![0u8; plan.canonical.stride * count];
        let upper = (count - 1) as u16;

        let a = plan.decode(&mut first, &src, 0, upper, &state).unwrap();
        let b = plan.decode(&mut second, &src, 0, upper, &state).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.vertex_count, count);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_index_bounds_contain_all_indices(
        indices in proptest::collection::vec(any::<u16>(), 1..256),
    ) {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let bounds = index_bounds(&bytes, indices.len(), IndexType::U16).unwrap();
        prop_assert!(indices.iter().all(|&i| bounds.lower <= i && i <= bounds.upper));
        prop_assert!(indices.contains(&bounds.lower));
        prop_assert!(indices.contains(&bounds.upper));
    }
}
