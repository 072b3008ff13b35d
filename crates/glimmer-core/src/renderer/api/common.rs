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

//! Opaque handles shared by every graphics backend.
//!
//! Handles are plain indices. A backend never reuses an index, so a handle that
//! survived a device reset is reported as missing rather than aliasing a newer
//! resource.

/// An opaque handle to a sampled texture (2D or cube).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a color render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub usize);

/// An opaque handle to a depth-stencil surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepthStencilId(pub usize);

/// An opaque handle to an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// An opaque handle to an immutable [`RenderStateSet`](super::RenderStateSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateSetId(pub usize);

/// An opaque handle to an effect, i.e. a loaded shader program and its
/// parameter storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub usize);

/// A resolved reference to a named parameter of an effect.
///
/// Only meaningful for the effect it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterHandle(pub u32);

/// A resolved reference to a named technique of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TechniqueHandle(pub u32);

impl ParameterHandle {
    /// The index of the parameter in its program's parameter table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TechniqueHandle {
    /// The index of the technique in its program's technique table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
