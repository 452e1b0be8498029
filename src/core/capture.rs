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

//! Draw captures
//!
//! A capture records the raw inputs of a sequence of draws (vertex type,
//! vertex bytes, index bytes) together with the decoder options and draw
//! state in effect, so the decode can be replayed offline. Captures are
//! stored with bincode and carry a version number checked on load.
//!
//! # Example
//!
//! ```no_run
//! use pspge::core::capture::DrawCapture;
//! use pspge::core::config::BackendConfig;
//! use pspge::core::draw::{CollectingSink, DrawEngine};
//!
//! let capture = DrawCapture::load_from_file("frame.pgc").unwrap();
//! let mut engine = DrawEngine::new(&BackendConfig::default());
//! let mut sink = CollectingSink::default();
//! capture.replay(&mut engine, &mut sink).unwrap();
//! ```

use crate::core::draw::{BatchSink, DrawEngine, PrimitiveType};
use crate::core::error::{GeError, Result};
use crate::core::vertex::{DecoderOptions, DrawState};
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Current capture format version
pub const CAPTURE_VERSION: u32 = 1;

/// A recorded sequence of draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DrawCapture {
    /// Version number for compatibility checking
    pub version: u32,

    pub metadata: CaptureMetadata,

    /// Decoder options in effect when the draws were recorded
    pub options: DecoderOptions,

    /// Draw state in effect when the draws were recorded
    pub state: DrawState,

    pub draws: Vec<CapturedDraw>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct CaptureMetadata {
    /// When the capture was taken
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Free-form note (game title, scene)
    pub description: String,
}

/// Raw inputs of one `submit_prim` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CapturedDraw {
    pub vert_type: u32,
    pub prim: PrimitiveType,
    pub count: u32,
    /// Vertex bytes starting at vertex 0
    pub vertices: Vec<u8>,
    /// Index bytes (empty for non-indexed draws)
    pub indices: Vec<u8>,
}

impl DrawCapture {
    /// Start an empty capture stamped with the current time
    pub fn new(options: DecoderOptions, state: DrawState, description: &str) -> Self {
        Self {
            version: CAPTURE_VERSION,
            metadata: CaptureMetadata {
                timestamp: Utc::now(),
                description: description.to_string(),
            },
            options,
            state,
            draws: Vec::new(),
        }
    }

    /// Record one draw
    pub fn push_draw(
        &mut self,
        vert_type: u32,
        prim: PrimitiveType,
        count: u32,
        vertices: &[u8],
        indices: &[u8],
    ) {
        self.draws.push(CapturedDraw {
            vert_type,
            prim,
            count,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
    }

    /// Total bytes of recorded vertex and index data
    pub fn payload_size(&self) -> usize {
        self.draws
            .iter()
            .map(|d| d.vertices.len() + d.indices.len())
            .sum()
    }

    /// Encode to bytes
    ///
    /// # Errors
    ///
    /// Returns `Capture` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, config::standard())
            .map_err(|e| GeError::Capture(e.to_string()))
    }

    /// Decode from bytes, checking the version
    ///
    /// # Errors
    ///
    /// Returns `Capture` if the bytes are not a capture or the version differs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (capture, _): (DrawCapture, usize) =
            bincode::decode_from_slice(bytes, config::standard())
                .map_err(|e| GeError::Capture(e.to_string()))?;

        if capture.version != CAPTURE_VERSION {
            return Err(GeError::Capture(format!(
                "Incompatible capture version: expected {}, got {}",
                CAPTURE_VERSION, capture.version
            )));
        }
        Ok(capture)
    }

    /// Save the capture to a file
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load a capture from a file
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the data is corrupt or the version
    /// does not match [`CAPTURE_VERSION`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    /// Submit every recorded draw to `engine` and flush
    ///
    /// The engine's decoder options are replaced by the recorded ones.
    ///
    /// # Returns
    ///
    /// Total bytes of vertex data consumed
    ///
    /// # Errors
    ///
    /// The first submission error; earlier draws stay submitted.
    pub fn replay(&self, engine: &mut DrawEngine, sink: &mut dyn BatchSink) -> Result<usize> {
        engine.set_options(self.options);

        let mut consumed = 0;
        for draw in &self.draws {
            consumed += engine.submit_prim(
                &draw.vertices,
                &draw.indices,
                draw.prim,
                draw.count as usize,
                draw.vert_type,
                &self.state,
                sink,
            )?;
        }
        engine.flush(sink);

        log::debug!(
            "Replayed {} draws ({} bytes of vertex data)",
            self.draws.len(),
            consumed
        );
        Ok(consumed)
    }
}
