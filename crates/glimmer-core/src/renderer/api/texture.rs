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

//! Texture, render target and depth-stencil descriptions.

use crate::math::Extent2D;
use serde::{Deserialize, Serialize};

/// The texel formats understood by the lighting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// Four 16-bit float channels. The default light buffer format.
    Rgba16Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// A single 32-bit float channel, used for linear depth and shadow distances.
    R32Float,
    /// 24-bit depth with an 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Size of a single texel in bytes.
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::R32Float => 4,
            TextureFormat::Depth24PlusStencil8 => 4,
        }
    }

    /// Returns `true` for formats that can be bound as a color render target.
    pub const fn is_color_renderable(self) -> bool {
        !matches!(self, TextureFormat::Depth24PlusStencil8)
    }

    /// Returns `true` for formats that can hold values above `1.0`.
    pub const fn is_hdr(self) -> bool {
        matches!(
            self,
            TextureFormat::Rgba16Float | TextureFormat::Rgba32Float | TextureFormat::R32Float
        )
    }
}

/// The shape of a sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A single 2D image.
    D2,
    /// Six square faces, ordered `+X, -X, +Y, -Y, +Z, -Z`.
    Cube,
}

impl TextureDimension {
    /// Number of 2D layers stored for this dimension.
    pub const fn layer_count(self) -> u32 {
        match self {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        }
    }
}

/// Describes a sampled texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// A debug label.
    pub label: String,
    /// Size of one layer (one face for cube textures).
    pub size: Extent2D,
    /// Texel format.
    pub format: TextureFormat,
    /// 2D or cube.
    pub dimension: TextureDimension,
}

/// Describes a color render target.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// A debug label.
    pub label: String,
    /// Resolution of the target.
    pub size: Extent2D,
    /// Texel format. Must be color-renderable.
    pub format: TextureFormat,
}

/// Describes a depth-stencil surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilDescriptor {
    /// A debug label.
    pub label: String,
    /// Resolution of the surface.
    pub size: Extent2D,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_format_is_not_color_renderable() {
        assert!(!TextureFormat::Depth24PlusStencil8.is_color_renderable());
        assert!(TextureFormat::Rgba16Float.is_color_renderable());
        assert!(TextureFormat::Rgba16Float.is_hdr());
        assert!(!TextureFormat::Rgba8Unorm.is_hdr());
    }

    #[test]
    fn cube_has_six_layers() {
        assert_eq!(TextureDimension::Cube.layer_count(), 6);
        assert_eq!(TextureDimension::D2.layer_count(), 1);
    }
}
