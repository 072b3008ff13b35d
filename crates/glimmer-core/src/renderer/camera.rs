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

//! Per-frame camera data and the G-buffer inputs of the lighting pass.

use super::api::{DepthStencilId, TextureId};
use crate::math::{Mat4, Vec3, Vec4};

/// Everything the lighting pass needs to know about the active camera.
///
/// Built fresh every frame and passed by reference; never modified during the
/// lighting pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform (right-handed, `[0, 1]` depth).
    pub projection: Mat4,
    /// Distance to the near plane.
    pub near: f32,
    /// Distance to the far plane. Linear depth in the G-buffer is divided by it.
    pub far: f32,
    /// Vertical field of view, in radians.
    pub fov_y: f32,
    /// Width divided by height.
    pub aspect_ratio: f32,
    /// World-space camera position.
    pub position: Vec3,
}

impl CameraFrame {
    /// Builds a perspective camera at `eye` looking at `target`.
    ///
    /// Returns `None` when the view direction is degenerate.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Option<Self> {
        let view = Mat4::look_at_rh(eye, target, up)?;
        Some(Self {
            view,
            projection: Mat4::perspective_rh_zo(fov_y, aspect_ratio, near, far),
            near,
            far,
            fov_y,
            aspect_ratio,
            position: eye,
        })
    }

    /// The combined world-to-clip transform.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// The view-to-world transform.
    pub fn inverse_view(&self) -> Mat4 {
        self.view
            .affine_inverse()
            .or_else(|| self.view.inverse())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// View-space rays to the four far-plane corners, ordered top-left,
    /// top-right, bottom-right, bottom-left.
    ///
    /// Scaling a ray interpolated across the screen by the G-buffer's linear
    /// depth yields the view-space position of the visible surface.
    pub fn frustum_far_corners(&self) -> [Vec3; 4] {
        let half_h = self.far * (self.fov_y * 0.5).tan();
        let half_w = half_h * self.aspect_ratio;
        [
            Vec3::new(-half_w, half_h, -self.far),
            Vec3::new(half_w, half_h, -self.far),
            Vec3::new(half_w, -half_h, -self.far),
            Vec3::new(-half_w, -half_h, -self.far),
        ]
    }

    /// Linear depth as stored in the G-buffer for a view-space `z` (negative in front).
    #[inline]
    pub fn linear_depth(&self, view_z: f32) -> f32 {
        -view_z / self.far
    }

    /// The `[0, 1]` device depth of a view-space `z`.
    pub fn device_depth(&self, view_z: f32) -> f32 {
        let clip = self.projection * Vec4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }
}

/// The geometry-pass outputs consumed by the lighting pass.
///
/// All three surfaces share the accumulation buffer's resolution. They are
/// borrowed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GBufferTextures {
    /// Linear view depth divided by the far plane, in the red channel.
    /// `1.0` marks pixels with no geometry.
    pub depth: TextureId,
    /// View-space unit normal in `xyz`; `w` holds the specular power scaled to `[0, 1]`.
    pub normal: TextureId,
    /// The device depth and stencil written by the geometry pass.
    pub depth_stencil: DepthStencilId,
}
