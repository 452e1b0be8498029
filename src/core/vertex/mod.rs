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

//! GE vertex decoding
//!
//! Games hand the GE vertices in one of thousands of packed layouts, chosen
//! per draw by the vertex type register. This module converts any of them
//! into a single canonical layout the render pipeline understands.
//!
//! # Pipeline
//!
//! 1. [`FormatDescriptor`] parses the 32-bit vertex type
//! 2. [`plan`] lays out source and canonical records and picks one [`Step`]
//!    per present component
//! 3. [`VertexPlan::decode`] runs the steps over an index range
//! 4. [`index_bounds`] finds that range from the draw's index buffer
//!
//! # Canonical Layout
//!
//! | Slot     | Encoding               | Present when            |
//! |----------|------------------------|-------------------------|
//! | w0, w1   | `f32 x 4` each         | weights (w1 if > 4)     |
//! | uv       | `f32 x 2`              | texcoords               |
//! | color0   | `u8 x 4` RGBA          | vertex color            |
//! | normal   | `f32 x 3` or `i16 x 4` | normals                 |
//! | position | `f32 x 3` or `i16 x 4` | always                  |
//!
//! # Example
//!
//! ```
//! use pspge::core::vertex::{DecoderCache, DecoderOptions, DrawState};
//!
//! let mut cache = DecoderCache::new(DecoderOptions::default());
//! // 8-bit positions, two vertices
//! let plan = cache.get(0x0000_0080);
//! let src = [0x40, 0x00, 0xC0, 0x7F, 0x80, 0x00];
//! let mut dst = vec![0u8; plan.canonical.stride * 2];
//!
//! let outcome = plan.decode(&mut dst, &src, 0, 1, &DrawState::default()).unwrap();
//! assert_eq!(outcome.vertex_count, 2);
//! assert_eq!(f32::from_le_bytes([dst[0], dst[1], dst[2], dst[3]]), 0.5);
//! ```

pub mod decoder;
pub mod format;
pub mod index;
pub mod layout;
pub mod planner;
pub mod step;

#[cfg(test)]
mod tests;

pub use decoder::{DecodeOutcome, DecoderCache, DrawState, UvScale, MAX_MORPH_TARGETS};
pub use format::{ColorType, ComponentType, FormatDescriptor, IndexType};
pub use index::{index_bounds, IndexBounds, MAX_UNINDEXED_VERTICES};
pub use layout::{align_up, CanonicalLayout, DecFormat, SourceLayout, Slot};
pub use planner::{plan, DecoderOptions, VertexPlan};
pub use step::{Category, Step, StepKind, StepParams};
