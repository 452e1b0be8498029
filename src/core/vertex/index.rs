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

//! Index range scanning
//!
//! Before decoding, the draw engine needs the smallest and largest vertex
//! index a draw references so that only that range is converted.
//!
//! ```
//! use pspge::core::vertex::{index_bounds, IndexType};
//!
//! let bounds = index_bounds(&[7, 3, 9, 3], 4, IndexType::U8).unwrap();
//! assert_eq!((bounds.lower, bounds.upper), (3, 9));
//! ```

use super::format::IndexType;
use crate::core::error::{Result, VertexError};
use serde::Serialize;

/// Largest non-indexed draw whose vertices can all be addressed by `u16`
pub const MAX_UNINDEXED_VERTICES: usize = u16::MAX as usize + 1;

/// Inclusive vertex index range referenced by a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexBounds {
    pub lower: u16,
    pub upper: u16,
    /// Number of indices scanned
    pub count: usize,
}

/// Compute the index range referenced by a draw
///
/// # Arguments
///
/// * `indices` - Raw index buffer (ignored for `IndexType::None`)
/// * `count` - Number of vertices in the draw
/// * `index_type` - Index encoding
///
/// # Returns
///
/// `[0, count - 1]` without an index buffer, the min/max index otherwise.
/// A zero count yields an empty range with `count == 0`.
///
/// # Errors
///
/// `IndexBufferTooShort` if `indices` holds fewer than `count` entries,
/// `TooManyVertices` for a non-indexed draw past [`MAX_UNINDEXED_VERTICES`].
pub fn index_bounds(indices: &[u8], count: usize, index_type: IndexType) -> Result<IndexBounds> {
    if count == 0 {
        return Ok(IndexBounds {
            lower: 0,
            upper: 0,
            count: 0,
        });
    }

    let needed = count * index_type.size();
    if indices.len() < needed {
        return Err(VertexError::IndexBufferTooShort {
            needed,
            got: indices.len(),
        }
        .into());
    }

    let (lower, upper) = match index_type {
        IndexType::None => {
            if count > MAX_UNINDEXED_VERTICES {
                return Err(VertexError::TooManyVertices {
                    count,
                    max: MAX_UNINDEXED_VERTICES,
                }
                .into());
            }
            (0, (count - 1) as u16)
        }
        IndexType::U8 => indices[..count]
            .iter()
            .fold((u16::MAX, 0), |(lo, hi), &i| (lo.min(i as u16), hi.max(i as u16))),
        IndexType::U16 => indices[..needed]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .fold((u16::MAX, 0), |(lo, hi), i| (lo.min(i), hi.max(i))),
    };

    Ok(IndexBounds {
        lower,
        upper,
        count,
    })
}
