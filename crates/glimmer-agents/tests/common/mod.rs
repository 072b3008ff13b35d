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

#![allow(dead_code)]

use glimmer_agents::LightPrePassAgent;
use glimmer_core::math::{degrees_to_radians, Extent2D, LinearRgba, Vec3};
use glimmer_core::renderer::{
    CameraFrame, DirectionalLightParams, GBufferTextures, Light, PointLightParams, ShadowSource,
};
use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};
use glimmer_lanes::LightPrePassConfig;

pub const SIZE: Extent2D = Extent2D::new(32, 32);

pub const AMBIENT: LinearRgba = LinearRgba::rgb(0.05, 0.05, 0.08);

/// A floor with a glossy ball in the middle.
pub fn scene() -> AnalyticScene {
    AnalyticScene::new()
        .with_plane(Vec3::ZERO, Vec3::Y, 0.3)
        .with_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.8)
}

pub fn camera() -> CameraFrame {
    CameraFrame::look_at(
        Vec3::new(0.0, 3.0, 6.0),
        Vec3::ZERO,
        Vec3::Y,
        degrees_to_radians(60.0),
        SIZE.width as f32 / SIZE.height as f32,
        0.1,
        30.0,
    )
    .unwrap()
}

// Slanted toward the camera so the ball shadow falls on visible floor.
pub const SUN_DIRECTION: Vec3 = Vec3::new(-0.4, -1.0, 0.6);

pub fn sun() -> DirectionalLightParams {
    DirectionalLightParams {
        color: LinearRgba::rgb(1.0, 0.9, 0.8),
        direction: SUN_DIRECTION.normalize(),
        intensity: 0.8,
        shadow: ShadowSource::NoShadow,
    }
}

/// One directional light, two near point lights and one far point light.
pub fn lights() -> Vec<Light> {
    vec![
        sun().into(),
        PointLightParams::new(Vec3::new(2.0, 0.5, 1.0), LinearRgba::rgb(1.0, 0.3, 0.2), 2.0, 2.5)
            .into(),
        PointLightParams::new(Vec3::new(-6.0, 0.5, -8.0), LinearRgba::rgb(0.2, 1.0, 0.3), 4.0, 1.0)
            .into(),
        PointLightParams::new(Vec3::new(-1.5, 1.5, 1.5), LinearRgba::rgb(0.3, 0.4, 1.0), 1.5, 1.5)
            .into(),
    ]
}

/// A software device with the G-buffer of [`scene`] already rendered.
pub struct TestFrame {
    pub device: SoftwareGraphicsDevice,
    pub camera: CameraFrame,
    pub gbuffer: GBufferTextures,
    pub scene: AnalyticScene,
}

impl TestFrame {
    pub fn new() -> Self {
        let mut device = SoftwareGraphicsDevice::new(SIZE);
        let scene = scene();
        let camera = camera();
        let gbuffer = AnalyticScene::create_gbuffer(&mut device, SIZE).unwrap();
        scene.render_gbuffer(&mut device, &camera, &gbuffer, SIZE).unwrap();
        Self {
            device,
            camera,
            gbuffer,
            scene,
        }
    }

    /// Rebuilds the G-buffer after the device was reset.
    pub fn rebuild_gbuffer(&mut self) {
        self.gbuffer = AnalyticScene::create_gbuffer(&mut self.device, SIZE).unwrap();
        self.scene
            .render_gbuffer(&mut self.device, &self.camera, &self.gbuffer, SIZE)
            .unwrap();
    }

    pub fn agent(&mut self, config: LightPrePassConfig) -> LightPrePassAgent {
        LightPrePassAgent::new(&mut self.device, SIZE, config).unwrap()
    }

    /// Renders `lights` with `agent` and returns the accumulated texels.
    pub fn render(&mut self, agent: &mut LightPrePassAgent, lights: &[Light]) -> Vec<LinearRgba> {
        let outcome = agent
            .render_frame(&mut self.device, &self.camera, &self.gbuffer, AMBIENT, lights)
            .unwrap();
        assert!(!outcome.is_skipped());
        agent.read_accumulation(&self.device).unwrap()
    }
}

pub fn assert_texels_eq(a: &[LinearRgba], b: &[LinearRgba], tolerance: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!(
            x.abs_diff_eq(y, tolerance),
            "texel {i} (x={}, y={}): {x:?} != {y:?}",
            i % SIZE.width as usize,
            i / SIZE.width as usize
        );
    }
}

pub fn total_light(texels: &[LinearRgba]) -> f32 {
    texels.iter().map(|t| t.r + t.g + t.b).sum()
}
