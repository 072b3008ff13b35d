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

use crate::math::{Extent2D, LinearRgba};
use crate::renderer::api::*;
use crate::renderer::error::RenderError;
use std::fmt::Debug;

/// The immediate-mode device contract the lighting lanes are written against.
///
/// A device owns every resource it creates and hands out opaque handles. Output
/// goes to the render target on top of an internal stack, which starts with the
/// backend's default output. Draws use whichever state set was applied last.
///
/// When the underlying device is lost, every method fails with
/// [`RenderError::DeviceLost`] until the backend is reset; handles created
/// before the reset are then reported as missing.
pub trait GraphicsDevice: Send + Debug {
    /// Creates a sampled texture with undefined contents.
    /// ## Arguments
    /// * `descriptor` - Size, format and dimension of the texture.
    /// ## Returns
    /// The handle of the new texture.
    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId, RenderError>;

    /// Uploads one full layer of a texture.
    /// ## Arguments
    /// * `id` - The texture to write.
    /// * `layer` - `0` for 2D textures, the face index for cube textures.
    /// * `texels` - Row-major texels, top row first. The backend converts them
    ///   to the texture's format.
    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        texels: &[LinearRgba],
    ) -> Result<(), RenderError>;

    /// Releases a texture.
    fn destroy_texture(&mut self, id: TextureId) -> Result<(), RenderError>;

    /// Creates a color render target.
    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, RenderError>;

    /// Releases a render target. Fails if it is currently bound.
    fn destroy_render_target(&mut self, id: RenderTargetId) -> Result<(), RenderError>;

    /// Creates a depth-stencil surface cleared to depth `1.0` and stencil `0`.
    fn create_depth_stencil(
        &mut self,
        descriptor: &DepthStencilDescriptor,
    ) -> Result<DepthStencilId, RenderError>;

    /// Uploads an indexed triangle mesh.
    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshId, RenderError>;

    /// Registers an immutable state set.
    fn create_state_set(&mut self, state: &RenderStateSet) -> Result<StateSetId, RenderError>;

    /// Loads a shader program into a new effect with empty parameter storage.
    fn create_effect(&mut self, descriptor: &EffectDescriptor) -> Result<EffectId, RenderError>;

    /// Resolves a parameter name of an effect.
    /// ## Errors
    /// [`ShaderError::MissingParameter`](crate::renderer::ShaderError::MissingParameter)
    /// naming the effect's module when the program has no such parameter.
    fn parameter_handle(&self, effect: EffectId, name: &str) -> Result<ParameterHandle, RenderError>;

    /// Resolves a technique name of an effect.
    /// ## Errors
    /// [`ShaderError::MissingTechnique`](crate::renderer::ShaderError::MissingTechnique)
    /// naming the effect's module when the program has no such technique.
    fn technique_handle(&self, effect: EffectId, name: &str) -> Result<TechniqueHandle, RenderError>;

    /// Uploads a parameter value. Every call counts as one upload.
    fn set_parameter(
        &mut self,
        effect: EffectId,
        handle: ParameterHandle,
        value: ParameterValue,
    ) -> Result<(), RenderError>;

    /// Makes `target` the active output, optionally with a depth-stencil surface.
    ///
    /// Nothing changes if the push fails.
    fn push_render_target(
        &mut self,
        target: RenderTargetId,
        depth_stencil: Option<DepthStencilId>,
    ) -> Result<(), RenderError>;

    /// Restores the output that was active before the last push.
    fn pop_render_target(&mut self) -> Result<(), RenderError>;

    /// Resolution of the active output.
    fn current_target_size(&self) -> Extent2D;

    /// Clears the selected planes of the active output.
    fn clear(
        &mut self,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u8,
    ) -> Result<(), RenderError>;

    /// Replaces the whole fixed-function state.
    fn apply_state_set(&mut self, id: StateSetId) -> Result<(), RenderError>;

    /// Sets the reference value used by stencil tests and `Replace` operations.
    fn set_stencil_reference(&mut self, reference: u8) -> Result<(), RenderError>;

    /// Draws a mesh with an effect technique into the active output.
    fn draw_mesh(
        &mut self,
        mesh: MeshId,
        effect: EffectId,
        technique: TechniqueHandle,
    ) -> Result<(), RenderError>;

    /// Reads back every texel of a render target, row-major, top row first.
    fn read_render_target(&self, id: RenderTargetId) -> Result<Vec<LinearRgba>, RenderError>;

    /// Resolution of a texture, per face for cube textures.
    fn texture_size(&self, id: TextureId) -> Result<Extent2D, RenderError>;

    /// Resolution of a render target.
    fn render_target_size(&self, id: RenderTargetId) -> Result<Extent2D, RenderError>;

    /// Counters accumulated since the backend was created or last reset its statistics.
    fn stats(&self) -> RenderStats;
}
