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

//! Chooses how a point light volume is drawn.

use std::fmt;

use glimmer_core::math::Vec3;

/// The drawing path taken for one point light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointLightPath {
    /// Two passes: stencil marking with the front faces, then lighting with
    /// the back faces. Used for volumes covering a large part of the screen.
    Near,
    /// One depth-tested pass with the front faces.
    Far,
}

impl fmt::Display for PointLightPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointLightPath::Near => write!(f, "Near"),
            PointLightPath::Far => write!(f, "Far"),
        }
    }
}

/// The angle, in radians, under which a sphere of `radius` at `light_position`
/// is seen from `camera_position`.
///
/// A camera at the sphere's center sees it under `PI`.
#[inline]
pub fn angular_diameter(camera_position: Vec3, light_position: Vec3, radius: f32) -> f32 {
    let distance = camera_position.distance(light_position);
    2.0 * (radius / distance).atan()
}

/// Picks the path for a point light.
///
/// A light is `Near` when its angular diameter is strictly greater than
/// `threshold_fraction * fov_y`. A camera sitting on the light and any
/// comparison involving NaN resolve to `Near`, which renders correctly in all
/// cases.
///
/// ```
/// use glimmer_core::math::Vec3;
/// use glimmer_lanes::{select_point_light_path, PointLightPath};
///
/// let path = select_point_light_path(Vec3::ZERO, 1.0, Vec3::new(0.0, 0.0, -100.0), 1.0, 0.2);
/// assert_eq!(path, PointLightPath::Far);
/// ```
pub fn select_point_light_path(
    camera_position: Vec3,
    fov_y: f32,
    light_position: Vec3,
    radius: f32,
    threshold_fraction: f32,
) -> PointLightPath {
    if camera_position.distance(light_position) == 0.0 {
        return PointLightPath::Near;
    }
    let angular = angular_diameter(camera_position, light_position, radius);
    let limit = threshold_fraction * fov_y;
    if angular.is_nan() || limit.is_nan() {
        log::warn!(
            "Visibility: Non-finite input for light at {:?} (radius {}), using the near path",
            light_position,
            radius
        );
        return PointLightPath::Near;
    }
    if angular > limit {
        PointLightPath::Near
    } else {
        PointLightPath::Far
    }
}
