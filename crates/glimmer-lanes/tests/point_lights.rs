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

use std::sync::Arc;

use glimmer_core::math::{degrees_to_radians, Extent2D, LinearRgba, Mat4, Vec2, Vec3};
use glimmer_core::renderer::{
    CameraFrame, ClipVolume, FragmentInput, GBufferTextures, GraphicsDevice, MeshData, MeshVertex,
    ParameterInfo,
    ParameterKind, PointLightParams, ShaderContext, ShaderError, ShaderProgram, ShadowSource,
    TechniqueHandle, VertexOutput, VolumeSpace,
};
use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};
use glimmer_lanes::shaders::{params, NO_SHADOW, WITH_SHADOW};
use glimmer_lanes::{
    angular_diameter, AccumulationBuffer, LightPrePassConfig, PointLightLane, PointLightPath,
    SINGLE_PASS_STATE, STENCIL_LIGHT_STATE, STENCIL_MARK_STATE,
};

const SIZE: Extent2D = Extent2D::new(24, 24);

struct Frame {
    device: SoftwareGraphicsDevice,
    gbuffer: GBufferTextures,
    camera: CameraFrame,
    scene: AnalyticScene,
}

fn camera() -> CameraFrame {
    CameraFrame::look_at(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::Y,
        degrees_to_radians(60.0),
        1.0,
        0.1,
        20.0,
    )
    .unwrap()
}

fn frame(scene: AnalyticScene) -> Frame {
    let mut device = SoftwareGraphicsDevice::new(SIZE);
    let camera = camera();
    let gbuffer = AnalyticScene::create_gbuffer(&mut device, SIZE).unwrap();
    scene.render_gbuffer(&mut device, &camera, &gbuffer, SIZE).unwrap();
    Frame {
        device,
        gbuffer,
        camera,
        scene,
    }
}

fn wall() -> AnalyticScene {
    AnalyticScene::new().with_plane(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.25)
}

/// Renders `lights` into a fresh buffer and returns the lane, the paths and the texels.
fn render(
    f: &mut Frame,
    config: &LightPrePassConfig,
    lights: &[PointLightParams],
) -> (PointLightLane, Vec<PointLightPath>, Vec<LinearRgba>) {
    let mut buffer = AccumulationBuffer::new(&mut f.device, SIZE, config).unwrap();
    let mut lane = PointLightLane::new(&mut f.device, config).unwrap();
    buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
    let mut paths = Vec::new();
    for light in lights {
        lane.begin(&mut f.device, &buffer, &f.gbuffer, &f.camera).unwrap();
        paths.push(lane.render(&mut f.device, &buffer, light).unwrap());
    }
    lane.end();
    buffer.end(&mut f.device).unwrap();
    let texels = buffer.read(&f.device).unwrap();
    (lane, paths, texels)
}

fn assert_texels_eq(a: &[LinearRgba], b: &[LinearRgba], tolerance: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!(x.abs_diff_eq(y, tolerance), "texel {i}: {x:?} != {y:?}");
    }
}

fn total(texels: &[LinearRgba]) -> f32 {
    texels.iter().map(|t| t.r + t.g + t.b).sum()
}

#[test]
fn separate_near_lights_do_not_share_stencil_marks() {
    let left = PointLightParams::new(Vec3::new(-2.0, 0.0, -4.5), LinearRgba::rgb(1.0, 0.2, 0.2), 3.0, 1.5);
    let right = PointLightParams::new(Vec3::new(2.0, 0.0, -4.5), LinearRgba::rgb(0.2, 0.2, 1.0), 3.0, 1.5);
    let config = LightPrePassConfig::default();

    let (_, paths, both) = render(&mut frame(wall()), &config, &[left, right]);
    assert_eq!(paths, [PointLightPath::Near, PointLightPath::Near]);
    let (_, _, only_left) = render(&mut frame(wall()), &config, &[left]);
    let (_, _, only_right) = render(&mut frame(wall()), &config, &[right]);

    let summed: Vec<LinearRgba> = only_left.iter().zip(&only_right).map(|(a, b)| *a + *b).collect();
    assert_texels_eq(&both, &summed, 1e-4);
    assert!(total(&only_left) > 0.0);
    assert!(total(&only_right) > 0.0);
}

#[test]
fn parameter_cache_changes_uploads_not_pixels() {
    let lights = [
        PointLightParams::new(Vec3::new(0.0, 0.0, -4.5), LinearRgba::WHITE, 1.0, 2.0),
        PointLightParams::new(Vec3::new(1.0, 1.0, -4.0), LinearRgba::rgb(0.5, 1.0, 0.5), 2.0, 1.2),
        PointLightParams::new(Vec3::new(-1.0, -1.0, -4.8), LinearRgba::rgb(0.1, 0.2, 0.9), 0.5, 0.3),
    ];

    let mut cached = frame(wall());
    let (cached_lane, _, with_cache) = render(&mut cached, &LightPrePassConfig::default(), &lights);

    let uncached_config = LightPrePassConfig {
        parameter_cache_enabled: false,
        ..LightPrePassConfig::default()
    };
    let mut uncached = frame(wall());
    let (uncached_lane, _, without_cache) = render(&mut uncached, &uncached_config, &lights);

    assert_eq!(with_cache, without_cache);
    assert!(cached_lane.parameter_cache().skipped() > 0);
    assert_eq!(uncached_lane.parameter_cache().skipped(), 0);
    assert!(cached.device.stats().parameter_uploads < uncached.device.stats().parameter_uploads);
}

#[test]
fn threshold_boundary_switches_paths() {
    let config = LightPrePassConfig::default();
    let cam = camera();
    let position = Vec3::new(0.0, 0.0, -4.0);
    let distance = cam.position.distance(position);
    let limit = config.near_light_fov_fraction * cam.fov_y;
    // angular_diameter(r) == limit  <=>  r == d * tan(limit / 2)
    let boundary = distance * (limit * 0.5).tan();

    let below = PointLightParams::new(position, LinearRgba::WHITE, 1.0, boundary * 0.99);
    let above = PointLightParams::new(position, LinearRgba::WHITE, 1.0, boundary * 1.01);
    assert!(angular_diameter(cam.position, position, below.radius) < limit);
    assert!(angular_diameter(cam.position, position, above.radius) > limit);

    let mut f = frame(wall());
    let (_, paths, _) = render(&mut f, &config, &[below, above]);
    assert_eq!(paths, [PointLightPath::Far, PointLightPath::Near]);

    let states: Vec<String> = f
        .device
        .draw_log()
        .iter()
        .map(|d| d.state_set.clone())
        .collect();
    assert_eq!(states, [SINGLE_PASS_STATE, STENCIL_MARK_STATE, STENCIL_LIGHT_STATE]);

    let exact = PointLightParams::new(position, LinearRgba::WHITE, 1.0, boundary);
    let (_, repeated, _) = render(&mut frame(wall()), &config, &[exact, exact, exact]);
    assert!(repeated.iter().all(|p| *p == repeated[0]));
}

/// An axis-aligned box with counter-clockwise outward faces.
fn box_mesh(center: Vec3, half: f32) -> MeshData {
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (-Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (-Vec3::Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (-Vec3::Z, Vec3::Y, Vec3::X),
    ];
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = center + (normal + u * su + v * sv) * half;
            vertices.push(MeshVertex::new(position, Vec2::ZERO));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData {
        label: "LightBox".to_string(),
        vertices,
        indices,
    }
}

#[test]
fn clip_volume_replaces_the_light_sphere() {
    const CENTER: Vec3 = Vec3::new(0.0, 0.0, -5.0);
    let light = PointLightParams::new(Vec3::new(0.0, 0.0, -4.5), LinearRgba::WHITE, 1.0, 3.0);
    let config = LightPrePassConfig::default();
    let texel = |texels: &[LinearRgba], x: usize, y: usize| texels[y * SIZE.width as usize + x];

    let mut local = frame(wall());
    let world_box = local.device.create_mesh(&box_mesh(CENTER, 1.0)).unwrap();
    let mut boxed = light;
    boxed.clip_volume = Some(ClipVolume {
        mesh: world_box,
        space: VolumeSpace::Local,
    });
    local.device.take_draw_log();
    let (_, paths, local_texels) = render(&mut local, &config, &[boxed]);
    assert_eq!(paths, [PointLightPath::Near]);
    let log = local.device.take_draw_log();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|d| d.mesh == "LightBox"));

    let mut placed = frame(wall());
    let origin_box = placed.device.create_mesh(&box_mesh(Vec3::ZERO, 1.0)).unwrap();
    boxed.clip_volume = Some(ClipVolume {
        mesh: origin_box,
        space: VolumeSpace::World(Mat4::from_translation(CENTER)),
    });
    placed.device.take_draw_log();
    let (_, _, placed_texels) = render(&mut placed, &config, &[boxed]);
    assert!(placed.device.draw_log().iter().all(|d| d.mesh == "LightBox"));
    assert_texels_eq(&local_texels, &placed_texels, 1e-4);

    let mut sphere = frame(wall());
    sphere.device.take_draw_log();
    let (_, _, sphere_texels) = render(&mut sphere, &config, &[light]);
    assert!(sphere.device.draw_log().iter().all(|d| d.mesh == "LightSphere"));

    // Inside the box both volumes light the wall.
    assert!(texel(&local_texels, 12, 12).r > 0.1);
    assert!(texel(&local_texels, 12, 12).abs_diff_eq(&texel(&sphere_texels, 12, 12), 1e-4));
    // Outside the box the sphere still reaches the wall but the box does not.
    for (x, y) in [(4, 12), (12, 4), (20, 12), (12, 20)] {
        assert!(texel(&sphere_texels, x, y).r > 0.0, "sphere should light ({x}, {y})");
        assert_eq!(texel(&local_texels, x, y), LinearRgba::TRANSPARENT);
    }
}

#[test]
fn shadow_cube_darkens_occluded_wall() {
    let scene = wall().with_sphere(Vec3::new(0.0, 0.75, -4.0), 0.4, 0.5);
    let position = Vec3::new(0.0, 1.5, -3.0);
    let mut light = PointLightParams::new(position, LinearRgba::WHITE, 20.0, 3.0);

    let (_, _, unshadowed) = render(&mut frame(scene.clone()), &LightPrePassConfig::default(), &[light]);

    let mut f = frame(scene);
    let cube = f.scene.render_shadow_cube(&mut f.device, position, 64).unwrap();
    light.shadow = ShadowSource::WithShadow(cube);
    let (_, _, shadowed) = render(&mut f, &LightPrePassConfig::default(), &[light]);
    assert!(f.device.draw_log().iter().all(|d| d.technique == WITH_SHADOW));

    let center = (SIZE.height / 2 * SIZE.width + SIZE.width / 2) as usize;
    assert!(unshadowed[center].r > 0.1, "center unshadowed: {:?}", unshadowed[center]);
    assert!(shadowed[center].r < unshadowed[center].r * 0.25);
    assert!(total(&shadowed) < total(&unshadowed));
}

#[test]
fn lights_without_shadow_never_use_the_shadow_technique() {
    let light = PointLightParams::new(Vec3::new(0.0, 0.0, -4.5), LinearRgba::WHITE, 1.0, 2.0);
    let mut f = frame(wall());
    render(&mut f, &LightPrePassConfig::default(), &[light]);
    assert!(!f.device.draw_log().is_empty());
    assert!(f.device.draw_log().iter().all(|d| d.technique == NO_SHADOW));
}

#[derive(Debug)]
struct IncompletePointProgram;

const INCOMPLETE_PARAMETERS: [ParameterInfo; 2] = [
    ParameterInfo::new(params::DEPTH_TEXTURE, ParameterKind::Texture2D),
    ParameterInfo::new(params::NORMAL_TEXTURE, ParameterKind::Texture2D),
];

impl ShaderProgram for IncompletePointProgram {
    fn label(&self) -> &str {
        "IncompletePoint"
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &INCOMPLETE_PARAMETERS
    }

    fn techniques(&self) -> &[&'static str] {
        &[NO_SHADOW, WITH_SHADOW]
    }

    fn vertex(&self, _ctx: &ShaderContext<'_>, _vertex: &MeshVertex) -> VertexOutput {
        VertexOutput::default()
    }

    fn fragment(
        &self,
        _ctx: &ShaderContext<'_>,
        _technique: TechniqueHandle,
        _input: &FragmentInput,
    ) -> Option<LinearRgba> {
        None
    }
}

#[test]
fn missing_parameter_names_the_module() {
    let mut device = SoftwareGraphicsDevice::new(SIZE);
    let err = PointLightLane::with_program(
        &mut device,
        Arc::new(IncompletePointProgram),
        &LightPrePassConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.shader_module(), Some("IncompletePoint"));
    assert!(err.to_string().contains("IncompletePoint"));
    assert!(matches!(
        err,
        glimmer_lanes::LightingError::Render(glimmer_core::renderer::RenderError::Shader(
            ShaderError::MissingParameter { .. }
        ))
    ));
}
