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

//! Point light drawn as a volume.

use glimmer_core::math::{saturate, LinearRgba, Vec2, Vec3, Vec4};
use glimmer_core::renderer::{
    FragmentInput, MeshVertex, ParameterHandle, ParameterInfo, ParameterKind, ShaderContext,
    ShaderProgram, TechniqueHandle, VertexOutput,
};

use super::{blinn_phong, params, sample_surface, NO_SHADOW, WITH_SHADOW};

const DEPTH_TEXTURE: ParameterHandle = ParameterHandle(0);
const NORMAL_TEXTURE: ParameterHandle = ParameterHandle(1);
const HALF_PIXEL: ParameterHandle = ParameterHandle(2);
const FAR_PLANE: ParameterHandle = ParameterHandle(3);
const WORLD_VIEW: ParameterHandle = ParameterHandle(4);
const WORLD_VIEW_PROJECTION: ParameterHandle = ParameterHandle(5);
const LIGHT_POSITION: ParameterHandle = ParameterHandle(6);
const LIGHT_COLOR: ParameterHandle = ParameterHandle(7);
const LIGHT_INTENSITY: ParameterHandle = ParameterHandle(8);
const INV_LIGHT_RADIUS: ParameterHandle = ParameterHandle(9);
const SHADOW_CUBE: ParameterHandle = ParameterHandle(10);
const INVERSE_VIEW: ParameterHandle = ParameterHandle(11);
const SHADOW_TEXEL_SIZE: ParameterHandle = ParameterHandle(12);
const SHADOW_BIAS: ParameterHandle = ParameterHandle(13);

const PARAMETERS: [ParameterInfo; 14] = [
    ParameterInfo::new(params::DEPTH_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::NORMAL_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::HALF_PIXEL, ParameterKind::Vec2),
    ParameterInfo::new(params::FAR_PLANE, ParameterKind::Float),
    ParameterInfo::new(params::WORLD_VIEW, ParameterKind::Mat4),
    ParameterInfo::new(params::WORLD_VIEW_PROJECTION, ParameterKind::Mat4),
    ParameterInfo::new(params::LIGHT_POSITION, ParameterKind::Vec3),
    ParameterInfo::new(params::LIGHT_COLOR, ParameterKind::Vec3),
    ParameterInfo::new(params::LIGHT_INTENSITY, ParameterKind::Float),
    ParameterInfo::new(params::INV_LIGHT_RADIUS, ParameterKind::Float),
    ParameterInfo::new(params::SHADOW_CUBE, ParameterKind::TextureCube),
    ParameterInfo::new(params::INVERSE_VIEW, ParameterKind::Mat4),
    ParameterInfo::new(params::SHADOW_TEXEL_SIZE, ParameterKind::Float),
    ParameterInfo::new(params::SHADOW_BIAS, ParameterKind::Float),
];

const TECHNIQUES: [&str; 2] = [NO_SHADOW, WITH_SHADOW];

/// Lights the pixels covered by a light volume.
///
/// The vertex stage forwards the view-space position of the volume surface.
/// Since that position lies on the eye ray through the pixel, scaling it to the
/// G-buffer depth gives the view-space position of the lit surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointLightProgram;

impl PointLightProgram {
    /// The module name used in handle-resolution errors.
    pub const LABEL: &'static str = "PointLight";
}

/// Quadratic falloff reaching zero at the light radius.
#[inline]
fn attenuation(distance: f32, inv_radius: f32) -> f32 {
    let f = 1.0 - saturate(distance * inv_radius);
    f * f
}

/// Two unit vectors orthogonal to `v` and to each other.
fn tangent_frame(v: Vec3) -> (Vec3, Vec3) {
    let helper = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let t = v.cross(helper).normalize();
    (t, v.cross(t).normalize())
}

/// Fraction of five cube shadow taps around `to_surface` that see the surface.
fn cube_shadow(ctx: &ShaderContext<'_>, to_surface: Vec3) -> f32 {
    let current = to_surface.length();
    if current <= 0.0 {
        return 1.0;
    }
    let bias = ctx.float(SHADOW_BIAS);
    let dir = to_surface / current;
    let (t, b) = tangent_frame(dir);
    // One texel spans two face units divided by the face size.
    let step = 2.0 * ctx.float(SHADOW_TEXEL_SIZE);
    let taps = [dir, dir + t * step, dir - t * step, dir + b * step, dir - b * step];
    let lit = taps
        .iter()
        .filter(|tap| current - bias <= ctx.sample_cube(SHADOW_CUBE, **tap).r)
        .count();
    lit as f32 / taps.len() as f32
}

impl ShaderProgram for PointLightProgram {
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
        let local = Vec4::from_vec3(vertex.position, 1.0);
        let view = ctx.mat4(WORLD_VIEW) * local;
        VertexOutput {
            position: ctx.mat4(WORLD_VIEW_PROJECTION) * local,
            varyings: [Vec4::from_vec3(view.truncate(), 0.0), Vec4::ZERO],
        }
    }

    fn fragment(
        &self,
        ctx: &ShaderContext<'_>,
        technique: TechniqueHandle,
        input: &FragmentInput,
    ) -> Option<LinearRgba> {
        let half_pixel = ctx.vec2(HALF_PIXEL);
        let uv = Vec2::new(
            input.ndc.x * 0.5 + 0.5 - half_pixel.x * 0.5,
            -input.ndc.y * 0.5 + 0.5 + half_pixel.y * 0.5,
        );
        let surface = sample_surface(ctx, DEPTH_TEXTURE, NORMAL_TEXTURE, uv)?;

        let ray = input.varyings[0].truncate();
        if ray.z >= 0.0 {
            return None;
        }
        let position = ray * (surface.depth * ctx.float(FAR_PLANE) / -ray.z);

        let to_light = ctx.vec3(LIGHT_POSITION) - position;
        let distance = to_light.length();
        let falloff = attenuation(distance, ctx.float(INV_LIGHT_RADIUS));
        if falloff <= 0.0 {
            return None;
        }
        let light = blinn_phong(
            &surface,
            position,
            to_light.normalize(),
            ctx.vec3(LIGHT_COLOR),
            ctx.float(LIGHT_INTENSITY),
        ) * falloff;

        if technique.index() == 1 {
            let inverse_view = ctx.mat4(INVERSE_VIEW);
            let world_surface = inverse_view.transform_point(position);
            let world_light = inverse_view.transform_point(ctx.vec3(LIGHT_POSITION));
            return Some(light * cube_shadow(ctx, world_surface - world_light));
        }
        Some(light)
    }
}
