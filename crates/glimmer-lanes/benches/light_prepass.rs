use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use glimmer_core::math::{degrees_to_radians, Extent2D, LinearRgba, Vec3};
use glimmer_core::renderer::{CameraFrame, PointLightParams};
use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};
use glimmer_lanes::{
    select_point_light_path, AccumulationBuffer, LightPrePassConfig, PointLightLane,
};

fn bench_heuristic(c: &mut Criterion) {
    let camera = Vec3::new(0.0, 2.0, 8.0);
    let lights: Vec<Vec3> = (0..1_000)
        .map(|i| Vec3::new((i % 10) as f32, 0.5, -((i / 10) as f32)))
        .collect();

    c.bench_function("select_point_light_path x1000", |b| {
        b.iter(|| {
            let mut near = 0;
            for light in &lights {
                let path = select_point_light_path(
                    black_box(camera),
                    black_box(1.0),
                    *light,
                    black_box(1.5),
                    0.2,
                );
                if path == glimmer_lanes::PointLightPath::Near {
                    near += 1;
                }
            }
            black_box(near)
        });
    });
}

fn bench_point_lights(c: &mut Criterion) {
    let size = Extent2D::new(64, 64);
    let mut device = SoftwareGraphicsDevice::new(size);
    let camera = CameraFrame::look_at(
        Vec3::new(0.0, 3.0, 6.0),
        Vec3::ZERO,
        Vec3::Y,
        degrees_to_radians(60.0),
        1.0,
        0.1,
        50.0,
    )
    .expect("camera");
    let scene = AnalyticScene::new()
        .with_plane(Vec3::ZERO, Vec3::Y, 0.3)
        .with_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.8);
    let gbuffer = AnalyticScene::create_gbuffer(&mut device, size).expect("gbuffer");
    scene
        .render_gbuffer(&mut device, &camera, &gbuffer, size)
        .expect("render gbuffer");

    let config = LightPrePassConfig::default();
    let mut buffer = AccumulationBuffer::new(&mut device, size, &config).expect("buffer");
    let mut lane = PointLightLane::new(&mut device, &config).expect("lane");
    let lights: Vec<PointLightParams> = (0..8)
        .map(|i| {
            let x = i as f32 - 3.5;
            PointLightParams::new(Vec3::new(x, 0.5, x * 0.5), LinearRgba::WHITE, 1.0, 1.0 + i as f32 * 0.5)
        })
        .collect();

    let mut group = c.benchmark_group("Light Pre-Pass");
    group.sample_size(20);
    group.bench_function("8 point lights, 64x64", |b| {
        b.iter(|| {
            buffer
                .begin(&mut device, LinearRgba::BLACK, &gbuffer)
                .expect("begin");
            lane.begin(&mut device, &buffer, &gbuffer, &camera)
                .expect("lane begin");
            for light in &lights {
                black_box(lane.render(&mut device, &buffer, light).expect("render"));
            }
            lane.end();
            buffer.end(&mut device).expect("end");
            device.take_draw_log();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_heuristic, bench_point_lights);
criterion_main!(benches);
