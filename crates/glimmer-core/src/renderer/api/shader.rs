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

//! The shader program contract.
//!
//! A [`ShaderProgram`] is a backend-independent description of a light shader:
//! it reflects its parameters and techniques by name, and provides a vertex and
//! a fragment stage. Backends load a program into an effect with
//! [`GraphicsDevice::create_effect`](crate::renderer::GraphicsDevice::create_effect)
//! and run its stages during draws.

use super::common::{ParameterHandle, TechniqueHandle, TextureId};
use super::mesh::MeshVertex;
use crate::math::{Extent2D, LinearRgba, Mat4, Vec2, Vec3, Vec4};
use std::fmt;
use std::sync::Arc;

/// The type of a shader parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// A single float.
    Float,
    /// Two floats.
    Vec2,
    /// Three floats.
    Vec3,
    /// Four floats.
    Vec4,
    /// A 4x4 matrix.
    Mat4,
    /// An array of four `Vec3`, used for frustum corners.
    Vec3Array4,
    /// A 2D texture binding.
    Texture2D,
    /// A cube texture binding.
    TextureCube,
}

/// A value uploaded to a shader parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// A single float.
    Float(f32),
    /// Two floats.
    Vec2(Vec2),
    /// Three floats.
    Vec3(Vec3),
    /// Four floats.
    Vec4(Vec4),
    /// A 4x4 matrix.
    Mat4(Mat4),
    /// Four `Vec3`.
    Vec3Array4([Vec3; 4]),
    /// A texture binding. `None` unbinds.
    Texture(Option<TextureId>),
}

impl ParameterValue {
    /// Returns `true` if this value can be stored in a parameter of `kind`.
    pub fn matches(&self, kind: ParameterKind) -> bool {
        matches!(
            (self, kind),
            (ParameterValue::Float(_), ParameterKind::Float)
                | (ParameterValue::Vec2(_), ParameterKind::Vec2)
                | (ParameterValue::Vec3(_), ParameterKind::Vec3)
                | (ParameterValue::Vec4(_), ParameterKind::Vec4)
                | (ParameterValue::Mat4(_), ParameterKind::Mat4)
                | (ParameterValue::Vec3Array4(_), ParameterKind::Vec3Array4)
                | (ParameterValue::Texture(_), ParameterKind::Texture2D)
                | (ParameterValue::Texture(_), ParameterKind::TextureCube)
        )
    }
}

/// Reflection data for one program parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    /// The name used for handle resolution.
    pub name: &'static str,
    /// The expected value type.
    pub kind: ParameterKind,
}

impl ParameterInfo {
    /// Creates a new parameter description.
    pub const fn new(name: &'static str, kind: ParameterKind) -> Self {
        Self { name, kind }
    }
}

/// Number of `Vec4` varyings passed from the vertex to the fragment stage.
pub const VARYING_COUNT: usize = 2;

/// The output of a vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexOutput {
    /// Clip-space position.
    pub position: Vec4,
    /// Values interpolated (perspective-correct) across the primitive.
    pub varyings: [Vec4; VARYING_COUNT],
}

/// The input of a fragment stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    /// The integer pixel coordinate being shaded, origin at the top-left.
    pub pixel: (u32, u32),
    /// Normalized device coordinates of the sample, including depth.
    pub ndc: Vec3,
    /// Interpolated varyings.
    pub varyings: [Vec4; VARYING_COUNT],
}

/// Read access to the parameters and textures bound to an effect during a draw.
///
/// Implemented by backends.
pub trait ShaderResources {
    /// The last value uploaded to `handle`, if any.
    fn parameter(&self, handle: ParameterHandle) -> Option<&ParameterValue>;
    /// Samples a 2D texture with nearest filtering and clamped coordinates.
    fn sample_2d(&self, texture: TextureId, uv: Vec2) -> Option<LinearRgba>;
    /// Samples a cube texture along `direction`.
    fn sample_cube(&self, texture: TextureId, direction: Vec3) -> Option<LinearRgba>;
    /// The size of a texture (of one face for cubes).
    fn texture_size(&self, texture: TextureId) -> Option<Extent2D>;
}

/// Typed access to effect parameters for shader stages.
///
/// Unset or mistyped parameters read as zero, like uninitialized GPU constants.
#[derive(Clone, Copy)]
pub struct ShaderContext<'a> {
    resources: &'a dyn ShaderResources,
}

impl<'a> ShaderContext<'a> {
    /// Wraps backend resources.
    pub fn new(resources: &'a dyn ShaderResources) -> Self {
        Self { resources }
    }

    /// Reads a float parameter.
    pub fn float(&self, handle: ParameterHandle) -> f32 {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    /// Reads a `Vec2` parameter.
    pub fn vec2(&self, handle: ParameterHandle) -> Vec2 {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Vec2(v)) => *v,
            _ => Vec2::ZERO,
        }
    }

    /// Reads a `Vec3` parameter.
    pub fn vec3(&self, handle: ParameterHandle) -> Vec3 {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Vec3(v)) => *v,
            _ => Vec3::ZERO,
        }
    }

    /// Reads a `Vec4` parameter, or `Vec4::ZERO`.
    pub fn vec4(&self, handle: ParameterHandle) -> Vec4 {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Vec4(v)) => *v,
            _ => Vec4::ZERO,
        }
    }

    /// Reads a matrix parameter.
    pub fn mat4(&self, handle: ParameterHandle) -> Mat4 {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Mat4(v)) => *v,
            _ => Mat4::IDENTITY,
        }
    }

    /// Reads a four-element `Vec3` array parameter.
    pub fn vec3_array4(&self, handle: ParameterHandle) -> [Vec3; 4] {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Vec3Array4(v)) => *v,
            _ => [Vec3::ZERO; 4],
        }
    }

    /// The texture bound to `handle`, if any.
    pub fn texture(&self, handle: ParameterHandle) -> Option<TextureId> {
        match self.resources.parameter(handle) {
            Some(ParameterValue::Texture(t)) => *t,
            _ => None,
        }
    }

    /// Samples the 2D texture bound to `handle`. Unbound textures read as transparent black.
    pub fn sample_2d(&self, handle: ParameterHandle, uv: Vec2) -> LinearRgba {
        self.texture(handle)
            .and_then(|t| self.resources.sample_2d(t, uv))
            .unwrap_or(LinearRgba::TRANSPARENT)
    }

    /// Samples the cube texture bound to `handle`. Unbound textures read as transparent black.
    pub fn sample_cube(&self, handle: ParameterHandle, direction: Vec3) -> LinearRgba {
        self.texture(handle)
            .and_then(|t| self.resources.sample_cube(t, direction))
            .unwrap_or(LinearRgba::TRANSPARENT)
    }

    /// The size of the texture bound to `handle`.
    pub fn texture_size(&self, handle: ParameterHandle) -> Option<Extent2D> {
        self.texture(handle)
            .and_then(|t| self.resources.texture_size(t))
    }
}

/// A shader program runnable by a backend.
pub trait ShaderProgram: Send + Sync + fmt::Debug {
    /// The module name. Reported in handle-resolution errors.
    fn label(&self) -> &str;

    /// The parameter table. A [`ParameterHandle`] is an index into it.
    fn parameters(&self) -> &[ParameterInfo];

    /// The technique names. A [`TechniqueHandle`] is an index into them.
    fn techniques(&self) -> &[&'static str];

    /// Runs the vertex stage for one vertex.
    fn vertex(&self, ctx: &ShaderContext<'_>, vertex: &MeshVertex) -> VertexOutput;

    /// Runs the fragment stage. Returning `None` discards the fragment.
    fn fragment(
        &self,
        ctx: &ShaderContext<'_>,
        technique: TechniqueHandle,
        input: &FragmentInput,
    ) -> Option<LinearRgba>;
}

/// Describes an effect to create from a program.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// The program to load.
    pub program: Arc<dyn ShaderProgram>,
}
