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

//! Core pipeline components
//!
//! - Vertex format parsing, planning and decoding
//! - Draw submission and batching
//! - Virtual framebuffer cache and its rendering backend seam
//! - Guest memory
//! - Configuration, draw captures and errors

pub mod capture;
pub mod color;
pub mod config;
pub mod draw;
pub mod error;
pub mod framebuffer;
pub mod memory;
pub mod vertex;

// Re-export commonly used types
pub use capture::DrawCapture;
pub use config::BackendConfig;
pub use draw::DrawEngine;
pub use error::{FramebufferError, GeError, Result, VertexError};
pub use framebuffer::FramebufferManager;
pub use memory::{GuestMemory, PspMemory};
pub use vertex::{plan, DecoderCache, DrawState, VertexPlan};
