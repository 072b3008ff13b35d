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

//! Light volume geometry.

use glimmer_core::math::{Vec2, Vec3, PI, TAU};
use glimmer_core::renderer::{MeshData, MeshVertex};

/// Builds a UV sphere of radius one around the origin.
///
/// Triangles wind counter-clockwise when seen from outside. The vertices are
/// pushed out slightly so that every facet lies outside the unit sphere, which
/// keeps the lit region from being clipped by the tessellation.
///
/// ## Arguments
///
/// * `stacks` - Latitude bands, at least 2.
/// * `slices` - Longitude segments, at least 3.
pub fn unit_sphere(stacks: u32, slices: u32) -> MeshData {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let scale = 1.0 / ((PI / (2.0 * stacks as f32)).cos() * (PI / slices as f32).cos());

    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let theta = v * PI;
        let (sin_t, cos_t) = theta.sin_cos();
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let phi = u * TAU;
            let (sin_p, cos_p) = phi.sin_cos();
            let dir = Vec3::new(sin_t * cos_p, cos_t, -sin_t * sin_p);
            vertices.push(MeshVertex::new(dir * scale, Vec2::new(u, v)));
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + row;
            // Skip the degenerate triangle at each pole.
            if stack != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if stack != stacks - 1 {
                indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    MeshData {
        label: "LightSphere".to_string(),
        vertices,
        indices,
    }
}
