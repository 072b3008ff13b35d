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

//! Immutable fixed-function state bundles.

use super::enums::*;
use bitflags::bitflags;

/// Describes the stencil test and operations for a single face of a primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both the stencil and depth tests pass.
    pub depth_pass_op: StencilOperation,
}

impl StencilFaceState {
    /// Stencil test disabled: always passes and never writes.
    pub const IGNORE: Self = Self {
        compare: CompareFunction::Always,
        fail_op: StencilOperation::Keep,
        depth_fail_op: StencilOperation::Keep,
        depth_pass_op: StencilOperation::Keep,
    };
}

/// Describes the state for depth and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// If `true`, depth values will be written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
    /// The stencil state for front-facing primitives.
    pub stencil_front: StencilFaceState,
    /// The stencil state for back-facing primitives.
    pub stencil_back: StencilFaceState,
    /// A bitmask applied to both the reference and stored value before testing.
    pub stencil_read_mask: u8,
    /// A bitmask selecting which stencil bits can be written.
    pub stencil_write_mask: u8,
}

impl DepthStencilState {
    /// No depth test, no depth write, no stencil.
    pub const DISABLED: Self = Self {
        depth_write_enabled: false,
        depth_compare: CompareFunction::Always,
        stencil_front: StencilFaceState::IGNORE,
        stencil_back: StencilFaceState::IGNORE,
        stencil_read_mask: 0xFF,
        stencil_write_mask: 0xFF,
    };

    /// Read-only depth test with the given comparison and no stencil.
    pub const fn depth_read_only(compare: CompareFunction) -> Self {
        Self {
            depth_compare: compare,
            ..Self::DISABLED
        }
    }

    /// Read-only depth test with the same stencil state on both faces.
    pub const fn with_stencil(compare: CompareFunction, stencil: StencilFaceState) -> Self {
        Self {
            depth_compare: compare,
            stencil_front: stencil,
            stencil_back: stencil,
            ..Self::DISABLED
        }
    }

    /// Returns `true` if any stencil operation can modify the stencil buffer.
    pub fn writes_stencil(&self) -> bool {
        let writes = |s: &StencilFaceState| {
            s.fail_op != StencilOperation::Keep
                || s.depth_fail_op != StencilOperation::Keep
                || s.depth_pass_op != StencilOperation::Keep
        };
        self.stencil_write_mask != 0 && (writes(&self.stencil_front) || writes(&self.stencil_back))
    }
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Describes a complete blend equation for a single color component (R, G, B, or A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponentDescriptor {
    /// The blend factor for the source color (from the fragment shader).
    pub src_factor: BlendFactor,
    /// The blend factor for the destination color (already in the framebuffer).
    pub dst_factor: BlendFactor,
    /// The operation to combine the source and destination factors.
    pub operation: BlendOperation,
}

/// Describes the blend state for a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// The blend equation for the RGB color components.
    pub color: BlendComponentDescriptor,
    /// The blend equation for the Alpha component.
    pub alpha: BlendComponentDescriptor,
}

impl BlendState {
    /// `dst = src + dst` on every channel.
    pub const ADDITIVE: Self = Self {
        color: BlendComponentDescriptor {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        },
        alpha: BlendComponentDescriptor {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        },
    };
}

bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Enable writes to the Red channel.
        const R = 0b0001;
        /// Enable writes to the Green channel.
        const G = 0b0010;
        /// Enable writes to the Blue channel.
        const B = 0b0100;
        /// Enable writes to the Alpha channel.
        const A = 0b1000;
        /// Enable writes to all channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

bitflags! {
    /// Selects which surfaces a clear affects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// The bound color target.
        const COLOR = 0b001;
        /// The depth plane of the bound depth-stencil surface.
        const DEPTH = 0b010;
        /// The stencil plane of the bound depth-stencil surface.
        const STENCIL = 0b100;
    }
}

/// Describes how triangles are culled before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterizerState {
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The winding considered front-facing.
    pub front_face: FrontFace,
}

/// A named bundle of blend, depth-stencil and rasterizer state.
///
/// State sets are created once through
/// [`GraphicsDevice::create_state_set`](crate::renderer::GraphicsDevice::create_state_set)
/// and applied wholesale. They are never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderStateSet {
    /// A debug label, also reported in draw statistics.
    pub label: String,
    /// The blend state. `None` means the source replaces the destination.
    pub blend: Option<BlendState>,
    /// Channels that may be written.
    pub write_mask: ColorWrites,
    /// Depth and stencil configuration.
    pub depth_stencil: DepthStencilState,
    /// Culling configuration.
    pub rasterizer: RasterizerState,
}

impl RenderStateSet {
    /// Additive blending with no depth test and no culling.
    pub fn additive(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            blend: Some(BlendState::ADDITIVE),
            write_mask: ColorWrites::ALL,
            depth_stencil: DepthStencilState::DISABLED,
            rasterizer: RasterizerState::default(),
        }
    }
}
