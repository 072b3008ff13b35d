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

// Glimmer Sandbox
// Renders an analytic scene through the light pre-pass and dumps the light buffer.
//
// Usage: sandbox [config.ron] [output.png]

use std::path::PathBuf;

use anyhow::{Context, Result};
use glimmer_agents::LightPrePassAgent;
use glimmer_core::math::{degrees_to_radians, Extent2D, LinearRgba, Vec3};
use glimmer_core::renderer::{
    CameraFrame, DirectionalLightParams, Light, PointLightParams, ShadowSource,
};
use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};
use glimmer_lanes::LightPrePassConfig;

const SIZE: Extent2D = Extent2D::new(320, 240);
const AMBIENT: LinearRgba = LinearRgba::rgb(0.04, 0.04, 0.06);
const SHADOW_CUBE_SIZE: u32 = 128;

fn scene() -> AnalyticScene {
    AnalyticScene::new()
        .with_plane(Vec3::ZERO, Vec3::Y, 0.2)
        .with_plane(Vec3::new(0.0, 0.0, -6.0), Vec3::Z, 0.1)
        .with_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.9)
        .with_sphere(Vec3::new(-2.5, 0.6, -1.5), 0.6, 0.5)
        .with_sphere(Vec3::new(2.2, 0.8, -2.0), 0.8, 0.3)
}

fn lights(
    scene: &AnalyticScene,
    device: &mut SoftwareGraphicsDevice,
    camera: &CameraFrame,
) -> Result<Vec<Light>> {
    let sun_direction = Vec3::new(-0.5, -1.0, -0.3).normalize();
    let sun_mask = scene
        .render_shadow_mask(device, camera, SIZE, sun_direction)
        .context("Failed to render the sun shadow mask")?;
    let sun = DirectionalLightParams {
        color: LinearRgba::rgb(1.0, 0.95, 0.85),
        direction: sun_direction,
        intensity: 0.6,
        shadow: ShadowSource::WithShadow(sun_mask),
    };

    let lamp_position = Vec3::new(1.2, 2.2, 1.2);
    let lamp_cube = scene
        .render_shadow_cube(device, lamp_position, SHADOW_CUBE_SIZE)
        .context("Failed to render the lamp shadow cube")?;
    let mut lamp = PointLightParams::new(lamp_position, LinearRgba::rgb(1.0, 0.6, 0.3), 6.0, 5.0);
    lamp.shadow = ShadowSource::WithShadow(lamp_cube);

    let mut lights = vec![sun.into(), lamp.into()];
    // A ring of small fill lights, most of which take the single-pass path.
    for i in 0..8 {
        let angle = i as f32 / 8.0 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * 4.0, 0.4, angle.sin() * 4.0 - 1.0);
        let color = LinearRgba::rgb(
            0.5 + 0.5 * angle.cos(),
            0.5 + 0.5 * (angle + 2.1).cos(),
            0.5 + 0.5 * (angle + 4.2).cos(),
        );
        lights.push(PointLightParams::new(position, color, 2.0, 1.2).into());
    }
    Ok(lights)
}

/// Maps the diffuse channels to 8-bit with a Reinhard curve.
fn tonemap(texels: &[LinearRgba]) -> Vec<u8> {
    let map = |v: f32| ((v / (1.0 + v)).clamp(0.0, 1.0) * 255.0).round() as u8;
    texels
        .iter()
        .flat_map(|t| [map(t.r), map(t.g), map(t.b)])
        .collect()
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => LightPrePassConfig::load(&path)
            .with_context(|| format!("Failed to load light pre-pass config '{path}'"))?,
        None => LightPrePassConfig::default(),
    };
    let output = args
        .next()
        .map_or_else(|| PathBuf::from("light_buffer.png"), PathBuf::from);

    let mut device = SoftwareGraphicsDevice::new(SIZE);
    let camera = CameraFrame::look_at(
        Vec3::new(0.0, 3.5, 7.0),
        Vec3::new(0.0, 0.5, -1.0),
        Vec3::Y,
        degrees_to_radians(55.0),
        SIZE.width as f32 / SIZE.height as f32,
        0.1,
        40.0,
    )
    .context("Degenerate sandbox camera")?;

    let scene = scene();
    let gbuffer = AnalyticScene::create_gbuffer(&mut device, SIZE)?;
    scene.render_gbuffer(&mut device, &camera, &gbuffer, SIZE)?;
    let lights = lights(&scene, &mut device, &camera)?;

    let mut agent = LightPrePassAgent::new(&mut device, SIZE, config)?;
    let outcome = agent.render_frame(&mut device, &camera, &gbuffer, AMBIENT, &lights)?;
    match outcome.report() {
        Some(report) => log::info!("{report}"),
        None => anyhow::bail!("The light pre-pass skipped the frame"),
    }

    let texels = agent.read_accumulation(&device)?;
    image::save_buffer(
        &output,
        &tonemap(&texels),
        SIZE.width,
        SIZE.height,
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Light buffer written to {}", output.display());
    Ok(())
}
