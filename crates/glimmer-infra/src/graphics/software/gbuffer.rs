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

//! An analytic geometry pass for the software backend.
//!
//! [`AnalyticScene`] ray-casts planes and spheres to fill the G-buffer inputs
//! of the lighting pass, plus the shadow textures the light shaders consume.
//! It stands in for a real geometry pass in the sandbox and in tests.

use glimmer_core::math::{Extent2D, LinearRgba, Vec2, Vec3};
use glimmer_core::renderer::{
    CameraFrame, DepthStencilDescriptor, GBufferTextures, GraphicsDevice, RenderError,
    ResourceError, TextureDescriptor, TextureDimension, TextureFormat, TextureId,
};

use super::device::SoftwareGraphicsDevice;
use super::surface::cube_texel_direction;

/// Offset along the surface normal applied before casting shadow rays.
const SHADOW_RAY_OFFSET: f32 = 1e-3;

/// A ray-traceable shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// An infinite plane through `point`.
    Plane {
        /// Any point on the plane.
        point: Vec3,
        /// The unit normal.
        normal: Vec3,
    },
    /// A sphere.
    Sphere {
        /// World-space center.
        center: Vec3,
        /// Radius, strictly positive.
        radius: f32,
    },
}

/// A primitive together with its surface gloss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    /// The shape.
    pub primitive: Primitive,
    /// Specular power normalised to `[0, 1]`, stored in the normal texture's `w`.
    pub gloss: f32,
}

/// The closest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// World-space position.
    pub point: Vec3,
    /// World-space unit normal, facing the ray origin.
    pub normal: Vec3,
    /// The gloss of the object hit.
    pub gloss: f32,
}

/// A scene made of analytic primitives.
#[derive(Debug, Clone, Default)]
pub struct AnalyticScene {
    objects: Vec<SceneObject>,
}

impl AnalyticScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plane.
    pub fn with_plane(mut self, point: Vec3, normal: Vec3, gloss: f32) -> Self {
        self.objects.push(SceneObject {
            primitive: Primitive::Plane {
                point,
                normal: normal.normalize(),
            },
            gloss,
        });
        self
    }

    /// Adds a sphere.
    pub fn with_sphere(mut self, center: Vec3, radius: f32, gloss: f32) -> Self {
        self.objects.push(SceneObject {
            primitive: Primitive::Sphere { center, radius },
            gloss,
        });
        self
    }

    /// The objects of the scene.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Finds the closest hit with `t >= min_t` along `origin + t * direction`.
    pub fn intersect(&self, origin: Vec3, direction: Vec3, min_t: f32) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for object in &self.objects {
            let candidate = match object.primitive {
                Primitive::Plane { point, normal } => {
                    let denom = normal.dot(direction);
                    if denom.abs() <= f32::EPSILON {
                        None
                    } else {
                        let t = (point - origin).dot(normal) / denom;
                        (t >= min_t).then_some((t, normal))
                    }
                }
                Primitive::Sphere { center, radius } => {
                    let oc = origin - center;
                    let a = direction.length_squared();
                    let b = oc.dot(direction);
                    let c = oc.length_squared() - radius * radius;
                    let disc = b * b - a * c;
                    if disc < 0.0 || a == 0.0 {
                        None
                    } else {
                        let root = disc.sqrt();
                        [(-b - root) / a, (-b + root) / a]
                            .into_iter()
                            .find(|t| *t >= min_t)
                            .map(|t| (t, (origin + direction * t - center) / radius))
                    }
                }
            };
            if let Some((t, normal)) = candidate {
                if best.is_none_or(|b| t < b.t) {
                    let facing = if normal.dot(direction) > 0.0 { -normal } else { normal };
                    best = Some(Hit {
                        t,
                        point: origin + direction * t,
                        normal: facing,
                        gloss: object.gloss,
                    });
                }
            }
        }
        best
    }

    /// Returns `true` if anything lies between `point` and `point + direction * max_t`.
    pub fn occluded(&self, point: Vec3, direction: Vec3, max_t: f32) -> bool {
        self.intersect(point, direction, SHADOW_RAY_OFFSET)
            .is_some_and(|hit| hit.t < max_t)
    }

    /// Allocates the G-buffer surfaces at `size`.
    pub fn create_gbuffer(
        device: &mut dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<GBufferTextures, RenderError> {
        let depth = device.create_texture(&TextureDescriptor {
            label: "GBuffer.Depth".to_string(),
            size,
            format: TextureFormat::R32Float,
            dimension: TextureDimension::D2,
        })?;
        let normal = device.create_texture(&TextureDescriptor {
            label: "GBuffer.Normal".to_string(),
            size,
            format: TextureFormat::Rgba32Float,
            dimension: TextureDimension::D2,
        })?;
        let depth_stencil = device.create_depth_stencil(&DepthStencilDescriptor {
            label: "GBuffer.DepthStencil".to_string(),
            size,
        })?;
        Ok(GBufferTextures {
            depth,
            normal,
            depth_stencil,
        })
    }

    /// The view-space ray through the sample of pixel `(x, y)`, with `z = -1`.
    fn view_ray(camera: &CameraFrame, size: Extent2D, x: u32, y: u32) -> Vec3 {
        let ndc_x = 2.0 * x as f32 / size.width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * y as f32 / size.height as f32;
        let tan = (camera.fov_y * 0.5).tan();
        Vec3::new(ndc_x * tan * camera.aspect_ratio, ndc_y * tan, -1.0)
    }

    /// Fills the G-buffer as seen from `camera`.
    ///
    /// Pixels with no geometry within the far plane get the `1.0` depth
    /// sentinel in both the linear depth texture and the depth-stencil surface.
    pub fn render_gbuffer(
        &self,
        device: &mut SoftwareGraphicsDevice,
        camera: &CameraFrame,
        gbuffer: &GBufferTextures,
        size: Extent2D,
    ) -> Result<(), RenderError> {
        let inverse_view = camera.inverse_view();
        let mut depth = Vec::with_capacity(size.area());
        let mut normals = Vec::with_capacity(size.area());
        let mut device_depth = Vec::with_capacity(size.area());
        for y in 0..size.height {
            for x in 0..size.width {
                let ray = Self::view_ray(camera, size, x, y);
                let direction = inverse_view.transform_vector(ray);
                // The ray has unit view-space depth, so `t` is the view distance along -z.
                match self
                    .intersect(camera.position, direction, camera.near)
                    .filter(|hit| hit.t <= camera.far)
                {
                    Some(hit) => {
                        let n = camera.view.transform_vector(hit.normal).normalize();
                        depth.push(LinearRgba::new(camera.linear_depth(-hit.t), 0.0, 0.0, 1.0));
                        normals.push(LinearRgba::new(n.x, n.y, n.z, hit.gloss));
                        device_depth.push(camera.device_depth(-hit.t).clamp(0.0, 1.0));
                    }
                    None => {
                        depth.push(LinearRgba::new(1.0, 0.0, 0.0, 1.0));
                        normals.push(LinearRgba::TRANSPARENT);
                        device_depth.push(1.0);
                    }
                }
            }
        }
        device.write_texture(gbuffer.depth, 0, &depth)?;
        device.write_texture(gbuffer.normal, 0, &normals)?;
        device.write_depth(gbuffer.depth_stencil, &device_depth)?;
        log::debug!(
            "AnalyticScene: G-buffer rendered at {}x{} ({} objects)",
            size.width,
            size.height,
            self.objects.len()
        );
        Ok(())
    }

    /// Renders a cube shadow map around `light_position`.
    ///
    /// Each texel stores the world distance from the light to the closest
    /// surface in that direction, or `f32::MAX` when nothing is hit.
    pub fn render_shadow_cube(
        &self,
        device: &mut dyn GraphicsDevice,
        light_position: Vec3,
        face_size: u32,
    ) -> Result<TextureId, RenderError> {
        if face_size == 0 {
            return Err(ResourceError::InvalidHandle("cube face size must be non-zero".to_string()).into());
        }
        let texture = device.create_texture(&TextureDescriptor {
            label: "ShadowCube".to_string(),
            size: Extent2D::new(face_size, face_size),
            format: TextureFormat::R32Float,
            dimension: TextureDimension::Cube,
        })?;
        let inv = 1.0 / face_size as f32;
        for face in 0..6 {
            let mut texels = Vec::with_capacity((face_size * face_size) as usize);
            for y in 0..face_size {
                for x in 0..face_size {
                    let uv = Vec2::new((x as f32 + 0.5) * inv, (y as f32 + 0.5) * inv);
                    let direction = cube_texel_direction(face, uv).normalize();
                    let distance = self
                        .intersect(light_position, direction, 0.0)
                        .map_or(f32::MAX, |hit| hit.t);
                    texels.push(LinearRgba::new(distance, 0.0, 0.0, 1.0));
                }
            }
            device.write_texture(texture, face, &texels)?;
        }
        Ok(texture)
    }

    /// Renders a screen-space shadow mask for a directional light.
    ///
    /// The red channel is `1.0` where the visible surface is lit and `0.0`
    /// where it is occluded. Sky pixels are lit.
    pub fn render_shadow_mask(
        &self,
        device: &mut dyn GraphicsDevice,
        camera: &CameraFrame,
        size: Extent2D,
        light_direction: Vec3,
    ) -> Result<TextureId, RenderError> {
        let texture = device.create_texture(&TextureDescriptor {
            label: "ShadowMask".to_string(),
            size,
            format: TextureFormat::Rgba8Unorm,
            dimension: TextureDimension::D2,
        })?;
        let inverse_view = camera.inverse_view();
        let to_light = -light_direction.normalize();
        let mut texels = Vec::with_capacity(size.area());
        for y in 0..size.height {
            for x in 0..size.width {
                let direction = inverse_view.transform_vector(Self::view_ray(camera, size, x, y));
                let lit = match self
                    .intersect(camera.position, direction, camera.near)
                    .filter(|hit| hit.t <= camera.far)
                {
                    Some(hit) => !self.occluded(hit.point, to_light, f32::INFINITY),
                    None => true,
                };
                let v = if lit { 1.0 } else { 0.0 };
                texels.push(LinearRgba::rgb(v, v, v));
            }
        }
        device.write_texture(texture, 0, &texels)?;
        Ok(texture)
    }
}
