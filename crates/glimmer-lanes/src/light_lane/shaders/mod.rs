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

//! Built-in light shader programs.
//!
//! Both programs write the light pre-pass packing: `rgb` holds diffuse light
//! and `a` holds the specular term, to be combined with surface albedo and
//! specular color by a later pass. Each program offers two techniques,
//! [`NO_SHADOW`] and [`WITH_SHADOW`].
//!
//! The G-buffer normal texture stores the view-space normal in `xyz` and the
//! specular power divided by [`MAX_SPECULAR_POWER`] in `w`.

mod directional;
mod point;

pub use directional::DirectionalLightProgram;
pub use point::PointLightProgram;

use glimmer_core::math::{saturate, LinearRgba, Vec2, Vec3};
use glimmer_core::renderer::{ParameterHandle, ShaderContext};

/// Technique used when the light has no shadow texture.
pub const NO_SHADOW: &str = "NoShadow";
/// Technique sampling the light's shadow texture.
pub const WITH_SHADOW: &str = "WithShadow";

/// The specular power encoded by a normal `w` of `1.0`.
pub const MAX_SPECULAR_POWER: f32 = 255.0;

/// Parameter names shared by both programs.
pub mod params {
    /// Linear depth G-buffer texture.
    pub const DEPTH_TEXTURE: &str = "DepthTexture";
    /// View-space normal G-buffer texture.
    pub const NORMAL_TEXTURE: &str = "NormalTexture";
    /// Half-texel offset of the render target, in NDC units.
    pub const HALF_PIXEL: &str = "HalfPixel";
    /// Light color, linear RGB.
    pub const LIGHT_COLOR: &str = "LightColor";
    /// Light intensity multiplier.
    pub const LIGHT_INTENSITY: &str = "LightIntensity";
    /// View-space light direction (directional lights).
    pub const LIGHT_DIRECTION: &str = "LightDirection";
    /// View-space far-plane corner rays (directional lights).
    pub const FRUSTUM_CORNERS: &str = "FrustumCorners";
    /// Screen-space shadow mask (directional lights).
    pub const SHADOW_TEXTURE: &str = "ShadowTexture";
    /// View-space light position (point lights).
    pub const LIGHT_POSITION: &str = "LightPosition";
    /// Reciprocal of the light radius (point lights).
    pub const INV_LIGHT_RADIUS: &str = "InvLightRadius";
    /// Camera far plane distance (point lights).
    pub const FAR_PLANE: &str = "FarPlane";
    /// Volume-to-view transform (point lights).
    pub const WORLD_VIEW: &str = "WorldView";
    /// Volume-to-clip transform (point lights).
    pub const WORLD_VIEW_PROJECTION: &str = "WorldViewProjection";
    /// Cube shadow map of world distances (point lights).
    pub const SHADOW_CUBE: &str = "ShadowCube";
    /// View-to-world transform (point lights).
    pub const INVERSE_VIEW: &str = "InverseView";
    /// Size of one cube face texel in face coordinates (point lights).
    pub const SHADOW_TEXEL_SIZE: &str = "ShadowTexelSize";
    /// Depth bias of cube shadow comparisons (point lights).
    pub const SHADOW_BIAS: &str = "ShadowBias";
}

/// A decoded G-buffer sample.
#[derive(Debug, Clone, Copy)]
struct SurfaceSample {
    /// Linear depth divided by the far plane.
    depth: f32,
    normal: Vec3,
    specular_power: f32,
}

/// Reads both G-buffer textures at `uv`. Returns `None` for sky pixels.
fn sample_surface(
    ctx: &ShaderContext<'_>,
    depth_texture: ParameterHandle,
    normal_texture: ParameterHandle,
    uv: Vec2,
) -> Option<SurfaceSample> {
    let depth = ctx.sample_2d(depth_texture, uv).r;
    if depth >= 1.0 || depth <= 0.0 {
        return None;
    }
    let n = ctx.sample_2d(normal_texture, uv);
    Some(SurfaceSample {
        depth,
        normal: n.rgb_vec().normalize(),
        specular_power: (n.a * MAX_SPECULAR_POWER).max(1.0),
    })
}

/// Blinn-Phong lighting of a view-space surface point.
///
/// `to_light` must be normalized. The result is unattenuated and unshadowed.
fn blinn_phong(
    surface: &SurfaceSample,
    position: Vec3,
    to_light: Vec3,
    color: Vec3,
    intensity: f32,
) -> LinearRgba {
    let n_dot_l = saturate(surface.normal.dot(to_light));
    if n_dot_l <= 0.0 {
        return LinearRgba::TRANSPARENT;
    }
    let to_eye = (-position).normalize();
    let half = (to_light + to_eye).normalize();
    let specular = saturate(surface.normal.dot(half)).powf(surface.specular_power);
    let diffuse = color * (n_dot_l * intensity);
    LinearRgba::new(diffuse.x, diffuse.y, diffuse.z, specular * n_dot_l * intensity)
}
