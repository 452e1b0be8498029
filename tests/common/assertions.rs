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

//! Custom assertions for pipeline testing

use pspge::core::draw::OwnedBatch;
use pspge::core::framebuffer::headless::HeadlessBackend;
use pspge::core::vertex::Slot;

/// Assert a decoded slot holds the expected components
#[allow(dead_code)]
pub fn assert_slot(batch: &OwnedBatch, vertex: usize, slot: Slot, expected: &[f32]) {
    let actual = slot.values(batch.record(vertex));
    assert_eq!(actual.len(), expected.len(), "component count of vertex {}", vertex);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() < 1e-5,
            "vertex {} component {}: expected {}, got {}",
            vertex,
            i,
            e,
            a
        );
    }
}

/// Assert the backend holds exactly `expected` targets
#[allow(dead_code)]
pub fn assert_live_targets(backend: &HeadlessBackend, expected: usize) {
    let actual = backend.live_targets();
    assert_eq!(
        actual, expected,
        "live targets mismatch: expected {}, got {}",
        expected, actual
    );
}
