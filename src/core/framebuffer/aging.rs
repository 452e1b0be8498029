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

//! End-of-frame eviction sweep

use super::backend::RenderBackend;
use super::FramebufferManager;
use crate::core::memory::GuestMemory;

impl FramebufferManager {
    /// Age every framebuffer and evict the stale ones
    ///
    /// The age of an entry is the number of frames since it was last drawn
    /// into or sampled, measured against the most recent framebuffer activity.
    /// Entries older than the eviction threshold are destroyed unless they are
    /// in the pin window. A displayed entry drawn this frame whose pixels are
    /// not yet in guest memory is read back first, when enabled.
    ///
    /// # Returns
    ///
    /// Number of entries evicted, staging copies included.
    pub fn decimate_framebuffers(
        &mut self,
        backend: &mut dyn RenderBackend,
        memory: &mut dyn GuestMemory,
    ) -> usize {
        backend.unbind();
        self.current_render = None;

        let threshold = self.config.eviction_threshold;
        let now = self.frame_last_used;
        let mut evicted = 0;

        let mut i = 0;
        while i < self.framebuffers.len() {
            let fb = &self.framebuffers[i];
            let (id, address, memory_updated) = (fb.id, fb.fb_address, fb.memory_updated);
            let age = now.saturating_sub(fb.last_active_frame());

            if self.config.readback_displayed
                && self.pins.display == Some(id)
                && age == 0
                && !memory_updated
            {
                if let Err(e) = self.read_framebuffer_to_memory(backend, memory, id) {
                    log::warn!("Readback of displayed framebuffer {:08x} failed: {}", address, e);
                }
            }

            if self.pins.contains(id) {
                i += 1;
                continue;
            }

            if age > threshold {
                log::info!("Decimating framebuffer at {:08x} (age {})", address, age);
                self.destroy_at(backend, i);
                evicted += 1;
            } else {
                i += 1;
            }
        }

        // Staging copies only age by their last readback.
        let mut i = 0;
        while i < self.staging.len() {
            let age = now.saturating_sub(self.staging[i].last_frame_render);
            if age > threshold {
                let mut staging = self.staging.remove(i);
                log::debug!("Decimating staging copy at {:08x}", staging.fb_address);
                staging.target.release(backend);
                evicted += 1;
            } else {
                i += 1;
            }
        }

        evicted
    }
}
