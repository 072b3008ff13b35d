// Copyright 2025 eraflo
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

//! Counters reported by graphics backends.

/// Running counters kept by a backend since its last reset of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// The number of draw calls issued.
    pub draw_calls: u32,
    /// The number of triangles that reached rasterization (after culling and clipping).
    pub triangles_rasterized: u32,
    /// The number of fragment-stage invocations.
    pub fragments_shaded: u64,
    /// The number of parameter uploads received.
    pub parameter_uploads: u32,
    /// The number of state-set applications.
    pub state_changes: u32,
    /// The number of clear operations.
    pub clears: u32,
}

/// One entry of a backend's draw log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    /// Label of the state set applied at draw time.
    pub state_set: String,
    /// Label of the mesh drawn.
    pub mesh: String,
    /// Label of the effect's program.
    pub effect: String,
    /// Name of the technique used.
    pub technique: String,
    /// The stencil reference at draw time.
    pub stencil_reference: u8,
    /// Fragments that passed every test and were shaded.
    pub fragments_shaded: u64,
}
