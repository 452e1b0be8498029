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

//! Decoded draw batches and their consumers

use super::PrimitiveType;
use crate::core::vertex::VertexPlan;
use serde::Serialize;

/// One submitted draw inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawCall {
    pub prim: PrimitiveType,
    /// First decoded vertex of this draw
    pub first_vertex: usize,
    pub vertex_count: usize,
    /// First entry of this draw in the batch index list
    pub first_index: usize,
    pub index_count: usize,
}

/// Draws sharing one vertex format, decoded and ready for the pipeline
#[derive(Debug)]
pub struct DecodedBatch<'a> {
    pub plan: &'a VertexPlan,
    /// Canonical records, `plan.canonical.stride` bytes each
    pub vertices: &'a [u8],
    /// Indices into `vertices`
    pub indices: &'a [u16],
    pub draws: &'a [DrawCall],
    /// No decoded color had alpha below 255
    pub vertex_full_alpha: bool,
}

impl DecodedBatch<'_> {
    /// Number of canonical records in the batch
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.plan.canonical.stride.max(1)
    }

    /// Copy the batch out of the engine's scratch buffers
    pub fn to_owned_batch(&self) -> OwnedBatch {
        OwnedBatch {
            vert_type: self.plan.descriptor.code,
            stride: self.plan.canonical.stride,
            vertices: self.vertices.to_vec(),
            indices: self.indices.to_vec(),
            draws: self.draws.to_vec(),
            vertex_full_alpha: self.vertex_full_alpha,
        }
    }
}

/// A [`DecodedBatch`] detached from the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedBatch {
    pub vert_type: u32,
    pub stride: usize,
    pub vertices: Vec<u8>,
    pub indices: Vec<u16>,
    pub draws: Vec<DrawCall>,
    pub vertex_full_alpha: bool,
}

impl OwnedBatch {
    /// Canonical record `n`
    pub fn record(&self, n: usize) -> &[u8] {
        &self.vertices[n * self.stride..(n + 1) * self.stride]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.stride.max(1)
    }
}

/// Consumer of flushed batches
pub trait BatchSink {
    fn consume(&mut self, batch: &DecodedBatch<'_>);
}

impl<F> BatchSink for F
where
    F: FnMut(&DecodedBatch<'_>),
{
    fn consume(&mut self, batch: &DecodedBatch<'_>) {
        self(batch)
    }
}

/// Sink that keeps a copy of every batch
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub batches: Vec<OwnedBatch>,
}

impl BatchSink for CollectingSink {
    fn consume(&mut self, batch: &DecodedBatch<'_>) {
        self.batches.push(batch.to_owned_batch());
    }
}
