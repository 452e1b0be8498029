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

/// Pipeline error types
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, GeError>;

/// Main error type for the GE pipeline
#[derive(Error, Debug)]
pub enum GeError {
    #[error("Invalid memory access at 0x{address:08X} ({len} bytes)")]
    InvalidMemoryAccess { address: u32, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Vertex error: {0}")]
    Vertex(#[from] VertexError),

    #[error("Framebuffer error: {0}")]
    Framebuffer(#[from] FramebufferError),
}

/// Vertex decoding error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VertexError {
    #[error("Malformed vertex format {code:#010x}: no position component")]
    MalformedFormat { code: u32 },

    #[error("Source vertex data too short: need {needed} bytes, got {got}")]
    SourceTooShort { needed: usize, got: usize },

    #[error("Decode buffer too small: need {needed} bytes, got {got}")]
    DestinationTooSmall { needed: usize, got: usize },

    #[error("Index buffer too short: need {needed} bytes, got {got}")]
    IndexBufferTooShort { needed: usize, got: usize },

    #[error("Invalid index range: lower {lower} > upper {upper}")]
    InvalidRange { lower: u16, upper: u16 },

    #[error("Draw of {count} vertices exceeds the {max} addressable by 16-bit indices")]
    TooManyVertices { count: usize, max: usize },
}

/// Framebuffer cache error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramebufferError {
    #[error("Framebuffer at 0x{address:08X} has no render target")]
    MissingRenderTarget { address: u32 },

    #[error("Failed to create render target ({width} x {height})")]
    BackendCreationFailure { width: u32, height: u32 },

    #[error("Unknown framebuffer id {0}")]
    UnknownFramebuffer(u32),

    #[error("Rendering backend error: {0}")]
    BackendError(String),
}
