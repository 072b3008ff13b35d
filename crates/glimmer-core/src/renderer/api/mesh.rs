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

//! CPU-side mesh data uploaded through the graphics device.

use crate::math::{Vec2, Vec3};

/// A mesh vertex: object-space position and a texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: Vec3,
    /// Texture coordinate.
    pub uv: Vec2,
}

impl MeshVertex {
    /// Creates a new vertex.
    pub const fn new(position: Vec3, uv: Vec2) -> Self {
        Self { position, uv }
    }
}

/// An indexed triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// A debug label.
    pub label: String,
    /// Vertex data.
    pub vertices: Vec<MeshVertex>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A quad covering the whole viewport in normalized device coordinates.
    ///
    /// Vertices are top-left, top-right, bottom-right, bottom-left, with `uv`
    /// running from `(0, 0)` at the top-left to `(1, 1)` at the bottom-right.
    /// Both triangles are counter-clockwise.
    pub fn fullscreen_quad() -> Self {
        Self {
            label: "FullscreenQuad".to_string(),
            vertices: vec![
                MeshVertex::new(Vec3::new(-1.0, 1.0, 0.0), Vec2::new(0.0, 0.0)),
                MeshVertex::new(Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 0.0)),
                MeshVertex::new(Vec3::new(1.0, -1.0, 0.0), Vec2::new(1.0, 1.0)),
                MeshVertex::new(Vec3::new(-1.0, -1.0, 0.0), Vec2::new(0.0, 1.0)),
            ],
            indices: vec![0, 3, 2, 0, 2, 1],
        }
    }

    /// Number of whole triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if every index refers to an existing vertex and the index
    /// count is a multiple of three.
    pub fn is_valid(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_quad_is_counter_clockwise() {
        let quad = MeshData::fullscreen_quad();
        assert!(quad.is_valid());
        assert_eq!(quad.triangle_count(), 2);
        for tri in quad.indices.chunks(3) {
            let a = quad.vertices[tri[0] as usize].position;
            let b = quad.vertices[tri[1] as usize].position;
            let c = quad.vertices[tri[2] as usize].position;
            let area = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            assert!(area > 0.0);
        }
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut quad = MeshData::fullscreen_quad();
        quad.indices.push(9);
        assert!(!quad.is_valid());
    }
}
