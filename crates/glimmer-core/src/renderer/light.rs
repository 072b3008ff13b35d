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

//! Defines the light descriptions consumed by the lighting pass.
//!
//! Colors are linear RGB floats in `[0, 1]`; use [`LinearRgba::from_rgb8`] to
//! convert 8-bit authoring values. Intensity scales the color and may exceed
//! `1.0` since the light buffer is HDR.

use super::api::{MeshId, TextureId};
use crate::math::{LinearRgba, Mat4, Vec3};

/// An optional shadow input, resolved once per light.
///
/// Lights without shadow data render unshadowed; the shadowed technique is
/// never selected without a texture to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowSource {
    /// No shadow data. The light renders unshadowed.
    #[default]
    NoShadow,
    /// A shadow texture: a screen-space mask for directional lights, or a cube
    /// of light-to-occluder distances for point lights.
    WithShadow(TextureId),
}

impl ShadowSource {
    /// The shadow texture, if any.
    pub fn texture(&self) -> Option<TextureId> {
        match self {
            ShadowSource::NoShadow => None,
            ShadowSource::WithShadow(t) => Some(*t),
        }
    }
}

impl From<Option<TextureId>> for ShadowSource {
    fn from(texture: Option<TextureId>) -> Self {
        texture.map_or(ShadowSource::NoShadow, ShadowSource::WithShadow)
    }
}

/// A directional light source that illuminates from a uniform direction.
///
/// # Examples
///
/// ```
/// use glimmer_core::renderer::light::{DirectionalLightParams, ShadowSource};
/// use glimmer_core::math::{Vec3, LinearRgba};
///
/// let sun = DirectionalLightParams {
///     color: LinearRgba::rgb(1.0, 0.95, 0.8),
///     direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
///     intensity: 1.0,
///     shadow: ShadowSource::NoShadow,
/// };
/// assert!(sun.shadow.texture().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightParams {
    /// Linear RGB color. Alpha is ignored.
    pub color: LinearRgba,
    /// World-space unit direction the light travels in.
    pub direction: Vec3,
    /// Intensity multiplier, `>= 0`.
    pub intensity: f32,
    /// Optional screen-space shadow mask.
    pub shadow: ShadowSource,
}

impl Default for DirectionalLightParams {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            direction: Vec3::new(0.0, -1.0, 0.0),
            intensity: 1.0,
            shadow: ShadowSource::NoShadow,
        }
    }
}

/// Whether a clip volume's vertices are already in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeSpace {
    /// The world transform is baked into the vertices.
    Local,
    /// The vertices are transformed by this world matrix.
    World(Mat4),
}

/// A custom mesh bounding a point light's influence, replacing the default sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVolume {
    /// The closed, counter-clockwise mesh.
    pub mesh: MeshId,
    /// How the mesh is placed in the world.
    pub space: VolumeSpace,
}

/// A point light with a finite sphere of influence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightParams {
    /// Linear RGB color. Alpha is ignored.
    pub color: LinearRgba,
    /// World-space position.
    pub position: Vec3,
    /// Intensity multiplier, `>= 0`.
    pub intensity: f32,
    /// Radius of influence, `> 0`. Light falls to zero at this distance.
    pub radius: f32,
    /// Optional cube shadow texture.
    pub shadow: ShadowSource,
    /// Optional custom bounding volume.
    pub clip_volume: Option<ClipVolume>,
}

impl PointLightParams {
    /// An unshadowed point light with the default bounding sphere.
    pub fn new(position: Vec3, color: LinearRgba, intensity: f32, radius: f32) -> Self {
        Self {
            color,
            position,
            intensity,
            radius,
            shadow: ShadowSource::NoShadow,
            clip_volume: None,
        }
    }

    /// World transform of the default unit bounding sphere.
    pub fn sphere_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.radius))
    }

    /// World transform of the bounding volume actually drawn.
    pub fn volume_transform(&self) -> Mat4 {
        match self.clip_volume {
            Some(ClipVolume {
                space: VolumeSpace::Local,
                ..
            }) => Mat4::IDENTITY,
            Some(ClipVolume {
                space: VolumeSpace::World(world),
                ..
            }) => world,
            None => self.sphere_transform(),
        }
    }
}

/// A light submitted to the lighting pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// An infinitely distant light.
    Directional(DirectionalLightParams),
    /// A local light.
    Point(PointLightParams),
}

impl From<DirectionalLightParams> for Light {
    fn from(light: DirectionalLightParams) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLightParams> for Light {
    fn from(light: PointLightParams) -> Self {
        Light::Point(light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn test_shadow_source_from_option() {
        assert_eq!(ShadowSource::from(None), ShadowSource::NoShadow);
        assert_eq!(
            ShadowSource::from(Some(TextureId(4))),
            ShadowSource::WithShadow(TextureId(4))
        );
    }

    #[test]
    fn test_default_volume_scales_then_translates() {
        let light = PointLightParams::new(Vec3::new(1.0, 2.0, 3.0), LinearRgba::WHITE, 1.0, 2.0);
        let p = light.volume_transform().transform_point(Vec3::X);
        assert!(approx_eq(p.x, 3.0));
        assert!(approx_eq(p.y, 2.0));
        assert!(approx_eq(p.z, 3.0));
    }

    #[test]
    fn test_custom_volume_spaces() {
        let mut light = PointLightParams::new(Vec3::ZERO, LinearRgba::WHITE, 1.0, 5.0);
        light.clip_volume = Some(ClipVolume {
            mesh: MeshId(1),
            space: VolumeSpace::Local,
        });
        assert_eq!(light.volume_transform(), Mat4::IDENTITY);

        let world = Mat4::from_translation(Vec3::Y);
        light.clip_volume = Some(ClipVolume {
            mesh: MeshId(1),
            space: VolumeSpace::World(world),
        });
        assert_eq!(light.volume_transform(), world);
    }

    #[test]
    fn test_directional_default_points_down() {
        let light = DirectionalLightParams::default();
        assert_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert!(matches!(Light::from(light), Light::Directional(_)));
    }
}
