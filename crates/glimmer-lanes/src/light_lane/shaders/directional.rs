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

//! Full-screen directional light.

use glimmer_core::math::{LinearRgba, Vec2, Vec3, Vec4};
use glimmer_core::renderer::{
    FragmentInput, MeshVertex, ParameterHandle, ParameterInfo, ParameterKind, ShaderContext,
    ShaderProgram, TechniqueHandle, VertexOutput,
};

use super::{blinn_phong, params, sample_surface, NO_SHADOW, WITH_SHADOW};

const DEPTH_TEXTURE: ParameterHandle = ParameterHandle(0);
const NORMAL_TEXTURE: ParameterHandle = ParameterHandle(1);
const SHADOW_TEXTURE: ParameterHandle = ParameterHandle(2);
const FRUSTUM_CORNERS: ParameterHandle = ParameterHandle(3);
const HALF_PIXEL: ParameterHandle = ParameterHandle(4);
const LIGHT_COLOR: ParameterHandle = ParameterHandle(5);
const LIGHT_INTENSITY: ParameterHandle = ParameterHandle(6);
const LIGHT_DIRECTION: ParameterHandle = ParameterHandle(7);

const PARAMETERS: [ParameterInfo; 8] = [
    ParameterInfo::new(params::DEPTH_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::NORMAL_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::SHADOW_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::FRUSTUM_CORNERS, ParameterKind::Vec3Array4),
    ParameterInfo::new(params::HALF_PIXEL, ParameterKind::Vec2),
    ParameterInfo::new(params::LIGHT_COLOR, ParameterKind::Vec3),
    ParameterInfo::new(params::LIGHT_INTENSITY, ParameterKind::Float),
    ParameterInfo::new(params::LIGHT_DIRECTION, ParameterKind::Vec3),
];

const TECHNIQUES: [&str; 2] = [NO_SHADOW, WITH_SHADOW];

/// Lights every covered pixel from a single direction.
///
/// Drawn as a full-screen quad placed at the far plane. The view-space position
/// of each pixel is rebuilt by scaling the far-plane corner ray through it by
/// the G-buffer's linear depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionalLightProgram;

impl DirectionalLightProgram {
    /// The module name used in handle-resolution errors.
    pub const LABEL: &'static str = "DirectionalLight";
}

/// Bilinear blend of the corner rays (top-left, top-right, bottom-right,
/// bottom-left) at screen coordinate `s`.
fn corner_ray(corners: &[Vec3; 4], s: Vec2) -> Vec3 {
    let top = Vec3::lerp(corners[0], corners[1], s.x);
    let bottom = Vec3::lerp(corners[3], corners[2], s.x);
    Vec3::lerp(top, bottom, s.y)
}

impl ShaderProgram for DirectionalLightProgram {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn techniques(&self) -> &[&'static str] {
        &TECHNIQUES
    }

    fn vertex(&self, ctx: &ShaderContext<'_>, vertex: &MeshVertex) -> VertexOutput {
        let half_pixel = ctx.vec2(HALF_PIXEL);
        VertexOutput {
            position: Vec4::new(
                vertex.position.x + half_pixel.x,
                vertex.position.y + half_pixel.y,
                1.0,
                1.0,
            ),
            varyings: [Vec4::new(vertex.uv.x, vertex.uv.y, 0.0, 0.0), Vec4::ZERO],
        }
    }

    fn fragment(
        &self,
        ctx: &ShaderContext<'_>,
        technique: TechniqueHandle,
        input: &FragmentInput,
    ) -> Option<LinearRgba> {
        let uv = Vec2::new(input.varyings[0].x, input.varyings[0].y);
        let surface = sample_surface(ctx, DEPTH_TEXTURE, NORMAL_TEXTURE, uv)?;

        let screen = Vec2::new((input.ndc.x + 1.0) * 0.5, (1.0 - input.ndc.y) * 0.5);
        let position = corner_ray(&ctx.vec3_array4(FRUSTUM_CORNERS), screen) * surface.depth;

        let to_light = (-ctx.vec3(LIGHT_DIRECTION)).normalize();
        let mut light = blinn_phong(
            &surface,
            position,
            to_light,
            ctx.vec3(LIGHT_COLOR),
            ctx.float(LIGHT_INTENSITY),
        );
        if technique.index() == 1 {
            light = light * ctx.sample_2d(SHADOW_TEXTURE, uv).r;
        }
        Some(light)
    }
}
