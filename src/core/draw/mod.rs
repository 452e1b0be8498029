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

//! Draw submission
//!
//! The [`DrawEngine`] is the front end the GE command processor talks to.
//! Each `submit_prim` call bounds the referenced vertex range, fetches the
//! cached plan for the vertex type, decodes the range into a scratch buffer
//! and rebases the draw's indices onto the decoded records. Consecutive draws
//! sharing a vertex layout accumulate into one batch until [`flush`] hands it
//! to a [`BatchSink`].
//!
//! A batch is flushed early when:
//!
//! | Condition                          | Reason                          |
//! |------------------------------------|---------------------------------|
//! | Vertex type changes                | One canonical layout per batch  |
//! | Scratch buffer would overflow      | `scratch_vertices` reached      |
//! | 128 draws are pending              | Deferred draw limit             |
//!
//! [`flush`]: DrawEngine::flush
//!
//! # Example
//!
//! ```
//! use pspge::core::config::BackendConfig;
//! use pspge::core::draw::{CollectingSink, DrawEngine, PrimitiveType};
//! use pspge::core::vertex::DrawState;
//!
//! let mut engine = DrawEngine::new(&BackendConfig::default());
//! let mut sink = CollectingSink::default();
//!
//! // Three float positions
//! let verts: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
//!     .iter()
//!     .flat_map(|v| v.to_le_bytes())
//!     .collect();
//! let used = engine
//!     .submit_prim(&verts, &[], PrimitiveType::Triangles, 3, 3 << 7, &DrawState::default(), &mut sink)
//!     .unwrap();
//! assert_eq!(used, 36);
//!
//! engine.flush(&mut sink);
//! assert_eq!(sink.batches[0].indices, vec![0, 1, 2]);
//! ```

mod batch;

#[cfg(test)]
mod tests;

pub use batch::{BatchSink, CollectingSink, DecodedBatch, DrawCall, OwnedBatch};

use crate::core::config::BackendConfig;
use crate::core::error::{Result, VertexError};
use crate::core::vertex::{
    index_bounds, DecoderCache, DecoderOptions, DrawState, IndexType, VertexPlan,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Draws batched before a forced flush
pub const MAX_DEFERRED_DRAW_CALLS: usize = 128;

/// Largest batch addressable by 16-bit indices
pub const MAX_SCRATCH_VERTICES: usize = 65536;

/// GE primitive types
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Rectangles,
}

impl PrimitiveType {
    /// Decode the 3-bit primitive field of a PRIM command
    ///
    /// Returns `None` for 7, which continues the previous primitive.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits & 0x7 {
            0 => Some(PrimitiveType::Points),
            1 => Some(PrimitiveType::Lines),
            2 => Some(PrimitiveType::LineStrip),
            3 => Some(PrimitiveType::Triangles),
            4 => Some(PrimitiveType::TriangleStrip),
            5 => Some(PrimitiveType::TriangleFan),
            6 => Some(PrimitiveType::Rectangles),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Points => "points",
            PrimitiveType::Lines => "lines",
            PrimitiveType::LineStrip => "line strip",
            PrimitiveType::Triangles => "triangles",
            PrimitiveType::TriangleStrip => "triangle strip",
            PrimitiveType::TriangleFan => "triangle fan",
            PrimitiveType::Rectangles => "rectangles",
        };
        write!(f, "{}", name)
    }
}

/// Vertex submission front end
pub struct DrawEngine {
    decoders: DecoderCache,

    /// Plan of the pending batch
    current: Option<Rc<VertexPlan>>,

    /// Canonical records of the pending batch
    decoded: Vec<u8>,
    decoded_vertices: usize,
    indices: Vec<u16>,
    draws: Vec<DrawCall>,
    full_alpha: bool,

    scratch_vertices: usize,
    flushes: u64,
}

impl DrawEngine {
    /// Create an engine with decoder options and scratch size from `config`
    pub fn new(config: &BackendConfig) -> Self {
        let scratch_vertices = config.scratch_vertices.clamp(1, MAX_SCRATCH_VERTICES);
        Self {
            decoders: DecoderCache::new(DecoderOptions::from(config)),
            current: None,
            // Room for typical 32-byte records; grows for wider layouts.
            decoded: Vec::with_capacity(scratch_vertices * 32),
            decoded_vertices: 0,
            indices: Vec::new(),
            draws: Vec::with_capacity(MAX_DEFERRED_DRAW_CALLS),
            full_alpha: true,
            scratch_vertices,
            flushes: 0,
        }
    }

    pub fn options(&self) -> DecoderOptions {
        self.decoders.options()
    }

    /// Replace the decoder options
    ///
    /// Cached plans are dropped when the options change. A pending batch
    /// keeps the plan it was decoded with.
    pub fn set_options(&mut self, options: DecoderOptions) {
        self.decoders.set_options(options);
    }

    /// Plan for a vertex type, from the cache
    pub fn plan_for(&mut self, vert_type: u32) -> Rc<VertexPlan> {
        self.decoders.get(vert_type)
    }

    /// Number of cached plans
    pub fn cached_plans(&self) -> usize {
        self.decoders.len()
    }

    /// Draws waiting for a flush
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Decoded vertices waiting for a flush
    pub fn pending_vertices(&self) -> usize {
        self.decoded_vertices
    }

    /// Number of batches handed to sinks so far
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Decode one draw and append it to the pending batch
    ///
    /// # Arguments
    ///
    /// * `verts` - Guest vertex data starting at vertex 0
    /// * `inds` - Guest index data (ignored when the type has no index)
    /// * `prim` - Primitive type
    /// * `count` - Number of vertices (or indices) in the draw
    /// * `vert_type` - Vertex format code
    /// * `state` - Morph weights, normal direction and UV scale
    /// * `sink` - Receives the pending batch if it must be flushed first
    ///
    /// # Returns
    ///
    /// Bytes of vertex data consumed: `(upper + 1) * record_stride`, which
    /// is `count * record_stride` for non-indexed draws.
    ///
    /// # Errors
    ///
    /// Index or vertex buffers too short for the draw, or a draw larger than
    /// the scratch buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_prim(
        &mut self,
        verts: &[u8],
        inds: &[u8],
        prim: PrimitiveType,
        count: usize,
        vert_type: u32,
        state: &DrawState,
        sink: &mut dyn BatchSink,
    ) -> Result<usize> {
        if count == 0 {
            return Ok(0);
        }

        let plan = self.decoders.get(vert_type);
        let index_type = plan.descriptor.index;
        let canonical_stride = plan.canonical.stride;

        let bounds = index_bounds(inds, count, index_type)?;
        let vertex_count = match index_type {
            IndexType::None => count,
            _ => (bounds.upper - bounds.lower) as usize + 1,
        };
        if vertex_count > self.scratch_vertices {
            return Err(VertexError::DestinationTooSmall {
                needed: vertex_count * canonical_stride,
                got: self.scratch_vertices * canonical_stride,
            }
            .into());
        }

        // Records already in the batch were written with the pending plan's
        // canonical layout; options changes can alter it for the same code.
        let compatible = self.current.as_ref().is_some_and(|current| {
            current.descriptor.code_without_index() == plan.descriptor.code_without_index()
                && current.canonical == plan.canonical
        });
        if !compatible
            || self.decoded_vertices + vertex_count > self.scratch_vertices
            || self.draws.len() >= MAX_DEFERRED_DRAW_CALLS
        {
            self.flush(sink);
        }

        let start = self.decoded_vertices * canonical_stride;
        let end = start + vertex_count * canonical_stride;
        self.decoded.resize(end, 0);
        let outcome = match plan.decode(
            &mut self.decoded[start..end],
            verts,
            bounds.lower,
            bounds.upper,
            state,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.decoded.truncate(start);
                return Err(e);
            }
        };

        let first_vertex = self.decoded_vertices;
        let first_index = self.indices.len();
        let lower = bounds.lower as usize;
        let rebase = |index: usize| (index - lower + first_vertex) as u16;
        match index_type {
            IndexType::None => self.indices.extend((0..count).map(rebase)),
            IndexType::U8 => self
                .indices
                .extend(inds[..count].iter().map(|&i| rebase(i as usize))),
            IndexType::U16 => self.indices.extend(
                inds[..count * 2]
                    .chunks_exact(2)
                    .map(|b| rebase(u16::from_le_bytes([b[0], b[1]]) as usize)),
            ),
        }

        self.draws.push(DrawCall {
            prim,
            first_vertex,
            vertex_count,
            first_index,
            index_count: count,
        });
        self.decoded_vertices += vertex_count;
        self.full_alpha &= outcome.vertex_full_alpha;
        if self.current.is_none() {
            self.current = Some(Rc::clone(&plan));
        }

        Ok((bounds.upper as usize + 1) * plan.source.record_stride)
    }

    /// Hand the pending batch to `sink` and reset
    ///
    /// # Returns
    ///
    /// Whether there was anything to flush
    pub fn flush(&mut self, sink: &mut dyn BatchSink) -> bool {
        let Some(plan) = self.current.take() else {
            return false;
        };

        let stride = plan.canonical.stride;
        let batch = DecodedBatch {
            plan: &plan,
            vertices: &self.decoded[..self.decoded_vertices * stride],
            indices: &self.indices,
            draws: &self.draws,
            vertex_full_alpha: self.full_alpha,
        };
        log::trace!(
            "Flushing {} draws, {} vertices of type {:#08x}",
            batch.draws.len(),
            self.decoded_vertices,
            plan.descriptor.code
        );
        sink.consume(&batch);

        self.decoded.clear();
        self.indices.clear();
        self.draws.clear();
        self.decoded_vertices = 0;
        self.full_alpha = true;
        self.flushes += 1;
        true
    }
}
