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

//! Vertex decode engine
//!
//! Runs a [`VertexPlan`] over a contiguous index range of a guest vertex
//! buffer and writes canonical vertices into a caller-owned buffer. Buffer
//! sizes are checked once up front; the per-vertex loop only executes the
//! planned steps.

use super::planner::{plan, DecoderOptions, VertexPlan};
use crate::core::error::{Result, VertexError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

/// Maximum number of morph targets
pub const MAX_MORPH_TARGETS: usize = 8;

/// Texture coordinate scale and offset applied by prescale steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct UvScale {
    pub u_scale: f32,
    pub v_scale: f32,
    pub u_offset: f32,
    pub v_offset: f32,
}

impl Default for UvScale {
    fn default() -> Self {
        Self {
            u_scale: 1.0,
            v_scale: 1.0,
            u_offset: 0.0,
            v_offset: 0.0,
        }
    }
}

/// Per-draw GE state read by the decode steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct DrawState {
    /// Blend weight of each morph target
    pub morph_weights: [f32; MAX_MORPH_TARGETS],
    /// Negate normals (the GE reverse-normal flag)
    pub reverse_normals: bool,
    pub uv_scale: UvScale,
}

impl Default for DrawState {
    fn default() -> Self {
        let mut morph_weights = [0.0; MAX_MORPH_TARGETS];
        morph_weights[0] = 1.0;
        Self {
            morph_weights,
            reverse_normals: false,
            uv_scale: UvScale::default(),
        }
    }
}

impl DrawState {
    /// Sign applied to morphed normals
    #[inline(always)]
    pub fn normal_sign(&self) -> f32 {
        if self.reverse_normals {
            -1.0
        } else {
            1.0
        }
    }
}

/// Result of decoding one index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodeOutcome {
    /// Number of canonical vertices written
    pub vertex_count: usize,
    /// Every decoded vertex color was fully opaque
    pub vertex_full_alpha: bool,
}

impl VertexPlan {
    /// Decode vertices `lower..=upper` into canonical form
    ///
    /// Vertex `lower` lands at the start of `dst`.
    ///
    /// # Arguments
    ///
    /// * `dst` - Canonical output, at least `(upper - lower + 1) * canonical.stride` bytes
    /// * `src` - Guest vertex buffer, starting at vertex 0
    /// * `lower` - First vertex index to decode
    /// * `upper` - Last vertex index to decode (inclusive)
    /// * `state` - Morph weights, normal direction and UV scale
    ///
    /// # Returns
    ///
    /// The vertex count and whether every color had full alpha
    ///
    /// # Errors
    ///
    /// `InvalidRange` if `lower > upper`, `SourceTooShort` or
    /// `DestinationTooSmall` if a buffer cannot hold the range.
    pub fn decode(
        &self,
        dst: &mut [u8],
        src: &[u8],
        lower: u16,
        upper: u16,
        state: &DrawState,
    ) -> Result<DecodeOutcome> {
        if lower > upper {
            return Err(VertexError::InvalidRange { lower, upper }.into());
        }

        let count = (upper - lower) as usize + 1;
        let src_stride = self.source.record_stride;
        let dst_stride = self.canonical.stride;

        let src_needed = (upper as usize + 1) * src_stride;
        if src.len() < src_needed {
            return Err(VertexError::SourceTooShort {
                needed: src_needed,
                got: src.len(),
            }
            .into());
        }
        let dst_needed = count * dst_stride;
        if dst.len() < dst_needed {
            return Err(VertexError::DestinationTooSmall {
                needed: dst_needed,
                got: dst.len(),
            }
            .into());
        }

        let params = self.params();
        let mut full_alpha = true;
        let mut src_pos = lower as usize * src_stride;

        for out in dst[..dst_needed].chunks_exact_mut(dst_stride.max(1)) {
            let record = &src[src_pos..src_pos + src_stride];
            for step in &self.steps {
                step.execute(&params, record, out, state, &mut full_alpha);
            }
            src_pos += src_stride;
        }

        Ok(DecodeOutcome {
            vertex_count: count,
            vertex_full_alpha: full_alpha,
        })
    }
}

/// Plan cache keyed by format code
///
/// Identical codes share one plan. Changing the options invalidates every
/// cached plan, since step selection depends on them.
#[derive(Debug, Default)]
pub struct DecoderCache {
    options: DecoderOptions,
    plans: HashMap<u32, Rc<VertexPlan>>,
}

impl DecoderCache {
    /// Create an empty cache
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            plans: HashMap::new(),
        }
    }

    /// Get the plan for `code`, building it on first use
    pub fn get(&mut self, code: u32) -> Rc<VertexPlan> {
        let options = self.options;
        Rc::clone(
            self.plans
                .entry(code)
                .or_insert_with(|| Rc::new(plan(code, &options))),
        )
    }

    /// Current step selection options
    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Replace the options, dropping cached plans if they changed
    pub fn set_options(&mut self, options: DecoderOptions) {
        if options != self.options {
            log::debug!(
                "Decoder options changed, flushing {} cached plans",
                self.plans.len()
            );
            self.options = options;
            self.plans.clear();
        }
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether no plan has been built yet
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every cached plan
    pub fn clear(&mut self) {
        self.plans.clear();
    }
}
