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

//! PSP GE vertex decoding and virtual framebuffer cache
//!
//! This library provides the GPU-side ingestion pipeline of a PSP rendering
//! backend: a vertex decoder that turns any GE vertex format into one
//! canonical layout, a draw submission front end that batches decoded draws,
//! and a cache that maps guest framebuffer addresses onto backend render
//! targets.
//!
//! # Example
//!
//! ```
//! use pspge::core::vertex::{plan, DecoderOptions, DrawState};
//!
//! // 8-bit texcoords, 8888 color, float position
//! let code = 1 | (7 << 2) | (3 << 7);
//! let plan = plan(code, &DecoderOptions::default());
//!
//! let mut src = vec![128u8, 64, 0, 0, 255, 0, 0, 255];
//! src.extend([1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()));
//!
//! let mut dst = vec![0u8; plan.canonical.stride];
//! let outcome = plan.decode(&mut dst, &src, 0, 0, &DrawState::default()).unwrap();
//! assert_eq!(outcome.vertex_count, 1);
//! assert!(outcome.vertex_full_alpha);
//! ```

pub mod core;
