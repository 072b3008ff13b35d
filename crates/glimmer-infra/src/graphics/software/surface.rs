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

//! CPU storage for textures, color targets and depth-stencil surfaces.

use glimmer_core::math::{saturate, Extent2D, LinearRgba, Vec2, Vec3};
use glimmer_core::renderer::{ResourceError, TextureDescriptor, TextureDimension, TextureFormat};

/// Rounds a texel to what `format` can represent.
pub(crate) fn quantize(format: TextureFormat, c: LinearRgba) -> LinearRgba {
    match format {
        TextureFormat::Rgba8Unorm => {
            let q = |v: f32| (saturate(v) * 255.0).round() / 255.0;
            LinearRgba::new(q(c.r), q(c.g), q(c.b), q(c.a))
        }
        TextureFormat::R32Float => LinearRgba::new(c.r, 0.0, 0.0, 1.0),
        // Half floats are kept at f32 precision.
        TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => c,
        TextureFormat::Depth24PlusStencil8 => c,
    }
}

/// Maps a texture coordinate to a texel index with nearest filtering and clamping.
#[inline]
fn texel_index(coord: f32, extent: u32) -> u32 {
    if extent == 0 || coord.is_nan() {
        return 0;
    }
    let max = extent - 1;
    let scaled = (coord * extent as f32).floor();
    if scaled <= 0.0 {
        0
    } else if scaled >= max as f32 {
        max
    } else {
        scaled as u32
    }
}

/// Selects the cube face and face coordinate a direction points at.
///
/// Faces are ordered `+X, -X, +Y, -Y, +Z, -Z`; `uv` runs from the face's
/// top-left corner. Returns `None` for a zero direction.
pub fn cube_face_uv(direction: Vec3) -> Option<(u32, Vec2)> {
    let (ax, ay, az) = (direction.x.abs(), direction.y.abs(), direction.z.abs());
    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if direction.x >= 0.0 {
            (0, -direction.z, -direction.y, ax)
        } else {
            (1, direction.z, -direction.y, ax)
        }
    } else if ay >= az {
        if direction.y >= 0.0 {
            (2, direction.x, direction.z, ay)
        } else {
            (3, direction.x, -direction.z, ay)
        }
    } else if direction.z >= 0.0 {
        (4, direction.x, -direction.y, az)
    } else {
        (5, -direction.x, -direction.y, az)
    };
    if ma <= 0.0 || !ma.is_finite() {
        return None;
    }
    Some((
        face,
        Vec2::new((sc / ma + 1.0) * 0.5, (tc / ma + 1.0) * 0.5),
    ))
}

/// The (unnormalized) direction through coordinate `uv` of cube face `face`.
///
/// Inverse of [`cube_face_uv`].
pub fn cube_texel_direction(face: u32, uv: Vec2) -> Vec3 {
    let sc = uv.x * 2.0 - 1.0;
    let tc = uv.y * 2.0 - 1.0;
    match face {
        0 => Vec3::new(1.0, -tc, -sc),
        1 => Vec3::new(-1.0, -tc, sc),
        2 => Vec3::new(sc, 1.0, tc),
        3 => Vec3::new(sc, -1.0, -tc),
        4 => Vec3::new(sc, -tc, 1.0),
        _ => Vec3::new(-sc, -tc, -1.0),
    }
}

/// A sampled texture: one layer for 2D, six for cubes.
#[derive(Debug, Clone)]
pub(crate) struct TextureStorage {
    pub(crate) descriptor: TextureDescriptor,
    layers: Vec<Vec<LinearRgba>>,
}

impl TextureStorage {
    pub(crate) fn new(descriptor: TextureDescriptor) -> Self {
        let layer = vec![LinearRgba::TRANSPARENT; descriptor.size.area()];
        let layers = vec![layer; descriptor.dimension.layer_count() as usize];
        Self { descriptor, layers }
    }

    pub(crate) fn write(&mut self, layer: u32, texels: &[LinearRgba]) -> Result<(), ResourceError> {
        let format = self.descriptor.format;
        let expected = self.descriptor.size.area();
        let slot = self
            .layers
            .get_mut(layer as usize)
            .ok_or_else(|| {
                ResourceError::InvalidHandle(format!(
                    "layer {layer} out of range for texture '{}'",
                    self.descriptor.label
                ))
            })?;
        if texels.len() != expected {
            return Err(ResourceError::SizeMismatch {
                expected: expected * format.bytes_per_texel(),
                actual: texels.len() * format.bytes_per_texel(),
            });
        }
        for (dst, src) in slot.iter_mut().zip(texels) {
            *dst = quantize(format, *src);
        }
        Ok(())
    }

    pub(crate) fn layer(&self, layer: u32) -> Option<&[LinearRgba]> {
        self.layers.get(layer as usize).map(Vec::as_slice)
    }

    fn fetch(&self, layer: usize, uv: Vec2) -> Option<LinearRgba> {
        let size = self.descriptor.size;
        let x = texel_index(uv.x, size.width);
        let y = texel_index(uv.y, size.height);
        self.layers
            .get(layer)?
            .get((y * size.width + x) as usize)
            .copied()
    }

    pub(crate) fn sample_2d(&self, uv: Vec2) -> Option<LinearRgba> {
        match self.descriptor.dimension {
            TextureDimension::D2 => self.fetch(0, uv),
            TextureDimension::Cube => None,
        }
    }

    pub(crate) fn sample_cube(&self, direction: Vec3) -> Option<LinearRgba> {
        match self.descriptor.dimension {
            TextureDimension::Cube => {
                let (face, uv) = cube_face_uv(direction)?;
                self.fetch(face as usize, uv)
            }
            TextureDimension::D2 => None,
        }
    }
}

/// A color render target.
#[derive(Debug, Clone)]
pub(crate) struct ColorSurface {
    pub(crate) label: String,
    pub(crate) size: Extent2D,
    pub(crate) format: TextureFormat,
    pub(crate) texels: Vec<LinearRgba>,
}

impl ColorSurface {
    pub(crate) fn new(label: String, size: Extent2D, format: TextureFormat) -> Self {
        Self {
            label,
            size,
            format,
            texels: vec![LinearRgba::TRANSPARENT; size.area()],
        }
    }

    pub(crate) fn fill(&mut self, color: LinearRgba) {
        let color = quantize(self.format, color);
        self.texels.iter_mut().for_each(|t| *t = color);
    }
}

/// A combined depth and stencil surface.
#[derive(Debug, Clone)]
pub(crate) struct DepthStencilSurface {
    pub(crate) size: Extent2D,
    pub(crate) depth: Vec<f32>,
    pub(crate) stencil: Vec<u8>,
}

impl DepthStencilSurface {
    pub(crate) fn new(size: Extent2D) -> Self {
        Self {
            size,
            depth: vec![1.0; size.area()],
            stencil: vec![0; size.area()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::math::approx_eq;

    #[test]
    fn nearest_index_clamps() {
        assert_eq!(texel_index(-0.5, 4), 0);
        assert_eq!(texel_index(0.0, 4), 0);
        assert_eq!(texel_index(0.3, 4), 1);
        assert_eq!(texel_index(0.99, 4), 3);
        assert_eq!(texel_index(1.5, 4), 3);
        assert_eq!(texel_index(f32::NAN, 4), 0);
    }

    #[test]
    fn cube_mapping_round_trips() {
        for face in 0..6 {
            for &(u, v) in &[(0.5, 0.5), (0.1, 0.8), (0.9, 0.2)] {
                let dir = cube_texel_direction(face, Vec2::new(u, v));
                let (f, uv) = cube_face_uv(dir).expect("non-zero direction");
                assert_eq!(f, face);
                assert!(approx_eq(uv.x, u) && approx_eq(uv.y, v));
            }
        }
        assert!(cube_face_uv(Vec3::ZERO).is_none());
    }

    #[test]
    fn unorm_writes_are_quantized() {
        let c = quantize(TextureFormat::Rgba8Unorm, LinearRgba::new(0.5, 2.0, -1.0, 1.0));
        assert_eq!(c.g, 1.0);
        assert_eq!(c.b, 0.0);
        assert!(approx_eq(c.r, 128.0 / 255.0));
    }

    #[test]
    fn write_rejects_wrong_length() {
        let mut tex = TextureStorage::new(TextureDescriptor {
            label: "t".into(),
            size: Extent2D::new(2, 2),
            format: TextureFormat::R32Float,
            dimension: TextureDimension::D2,
        });
        assert!(matches!(
            tex.write(0, &[LinearRgba::WHITE; 3]),
            Err(ResourceError::SizeMismatch { .. })
        ));
        assert!(tex.write(1, &[LinearRgba::WHITE; 4]).is_err());
        tex.write(0, &[LinearRgba::rgb(0.25, 1.0, 1.0); 4])
            .expect("valid upload");
        let s = tex.sample_2d(Vec2::new(0.9, 0.9)).expect("2d texture");
        assert_eq!(s, LinearRgba::new(0.25, 0.0, 0.0, 1.0));
    }
}
