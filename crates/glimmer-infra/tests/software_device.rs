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

use approx::assert_abs_diff_eq;
use glimmer_core::math::{Extent2D, LinearRgba, Vec4};
use glimmer_core::renderer::{
    ClearFlags, ColorWrites, CompareFunction, DepthStencilDescriptor, DepthStencilState,
    EffectDescriptor, FragmentInput, GraphicsDevice, MeshData, MeshVertex, ParameterHandle,
    ParameterInfo, ParameterKind, ParameterValue, RenderError, RenderStateSet,
    RenderTargetDescriptor, ResourceError, ShaderContext, ShaderError, ShaderProgram,
    StencilFaceState, StencilOperation, TechniqueHandle, TextureFormat, UsageError, VertexOutput,
};
use glimmer_infra::SoftwareGraphicsDevice;

const SIZE: Extent2D = Extent2D::new(4, 4);

/// Draws a flat color at a constant depth.
#[derive(Debug)]
struct FlatProgram;

const FLAT_PARAMETERS: [ParameterInfo; 2] = [
    ParameterInfo::new("Color", ParameterKind::Vec4),
    ParameterInfo::new("Depth", ParameterKind::Float),
];

impl ShaderProgram for FlatProgram {
    fn label(&self) -> &str {
        "Flat"
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &FLAT_PARAMETERS
    }

    fn techniques(&self) -> &[&'static str] {
        &["Solid", "Discard"]
    }

    fn vertex(&self, ctx: &ShaderContext<'_>, vertex: &MeshVertex) -> VertexOutput {
        let depth = ctx.float(ParameterHandle(1));
        VertexOutput {
            position: Vec4::new(vertex.position.x, vertex.position.y, depth, 1.0),
            varyings: [Vec4::ZERO; 2],
        }
    }

    fn fragment(
        &self,
        ctx: &ShaderContext<'_>,
        technique: TechniqueHandle,
        _input: &FragmentInput,
    ) -> Option<LinearRgba> {
        if technique.0 == 1 {
            return None;
        }
        Some(LinearRgba::from_vec4(ctx.vec4(ParameterHandle(0))))
    }
}

struct Fixture {
    device: SoftwareGraphicsDevice,
    target: glimmer_core::renderer::RenderTargetId,
    depth_stencil: glimmer_core::renderer::DepthStencilId,
    quad: glimmer_core::renderer::MeshId,
    effect: glimmer_core::renderer::EffectId,
}

fn fixture() -> Fixture {
    let mut device = SoftwareGraphicsDevice::new(SIZE);
    let target = device
        .create_render_target(&RenderTargetDescriptor {
            label: "Accum".into(),
            size: SIZE,
            format: TextureFormat::Rgba16Float,
        })
        .expect("target");
    let depth_stencil = device
        .create_depth_stencil(&DepthStencilDescriptor {
            label: "DS".into(),
            size: SIZE,
        })
        .expect("depth-stencil");
    let quad = device
        .create_mesh(&MeshData::fullscreen_quad())
        .expect("quad");
    let effect = device
        .create_effect(&EffectDescriptor {
            program: Arc::new(FlatProgram),
        })
        .expect("effect");
    device
        .push_render_target(target, Some(depth_stencil))
        .expect("push");
    device
        .clear(ClearFlags::all(), LinearRgba::TRANSPARENT, 1.0, 0)
        .expect("clear");
    Fixture {
        device,
        target,
        depth_stencil,
        quad,
        effect,
    }
}

fn set_color(f: &mut Fixture, c: LinearRgba) {
    f.device
        .set_parameter(f.effect, ParameterHandle(0), ParameterValue::Vec4(c.to_vec4()))
        .expect("color");
}

fn set_depth(f: &mut Fixture, depth: f32) {
    f.device
        .set_parameter(f.effect, ParameterHandle(1), ParameterValue::Float(depth))
        .expect("depth");
}

fn use_state(f: &mut Fixture, state: RenderStateSet) {
    let id = f.device.create_state_set(&state).expect("state");
    f.device.apply_state_set(id).expect("apply");
}

fn draw(f: &mut Fixture) {
    f.device
        .draw_mesh(f.quad, f.effect, TechniqueHandle(0))
        .expect("draw");
}

#[test]
fn fullscreen_quad_covers_every_pixel_once() {
    let mut f = fixture();
    use_state(&mut f, RenderStateSet::additive("Additive"));
    set_color(&mut f, LinearRgba::new(0.25, 0.5, 0.75, 1.0));
    draw(&mut f);

    let texels = f.device.read_render_target(f.target).expect("read");
    assert_eq!(texels.len(), SIZE.area());
    for t in texels {
        assert_abs_diff_eq!(t.r, 0.25);
        assert_abs_diff_eq!(t.a, 1.0);
    }
    let stats = f.device.stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.fragments_shaded, SIZE.area() as u64);
}

#[test]
fn additive_blend_accumulates() {
    let mut f = fixture();
    use_state(&mut f, RenderStateSet::additive("Additive"));
    set_color(&mut f, LinearRgba::new(0.5, 0.0, 0.0, 0.25));
    draw(&mut f);
    draw(&mut f);
    let texels = f.device.read_render_target(f.target).expect("read");
    assert_abs_diff_eq!(texels[5].r, 1.0);
    assert_abs_diff_eq!(texels[5].a, 0.5);
}

#[test]
fn back_buffer_quantizes_to_eight_bits() {
    let mut device = SoftwareGraphicsDevice::new(SIZE);
    device
        .clear(ClearFlags::COLOR, LinearRgba::new(0.5, 2.0, -1.0, 1.0), 1.0, 0)
        .expect("clear");
    let texels = device.read_render_target(device.back_buffer()).expect("read");
    assert_abs_diff_eq!(texels[0].r, 128.0 / 255.0);
    assert_eq!(texels[0].g, 1.0);
    assert_eq!(texels[0].b, 0.0);
}

#[test]
fn depth_test_compares_incoming_against_stored() {
    let mut f = fixture();
    f.device
        .write_depth(f.depth_stencil, &[0.5; 16])
        .expect("depth");
    set_color(&mut f, LinearRgba::WHITE);
    set_depth(&mut f, 0.75);

    let mut state = RenderStateSet::additive("Less");
    state.depth_stencil = DepthStencilState::depth_read_only(CompareFunction::Less);
    use_state(&mut f, state.clone());
    draw(&mut f);
    assert_eq!(f.device.draw_log()[0].fragments_shaded, 0);

    state.label = "Greater".into();
    state.depth_stencil = DepthStencilState::depth_read_only(CompareFunction::Greater);
    use_state(&mut f, state);
    draw(&mut f);
    assert_eq!(f.device.draw_log()[1].fragments_shaded, 16);
}

#[test]
fn depth_beyond_far_plane_is_clipped() {
    let mut f = fixture();
    use_state(&mut f, RenderStateSet::additive("Additive"));
    set_color(&mut f, LinearRgba::WHITE);
    set_depth(&mut f, 1.5);
    draw(&mut f);
    assert_eq!(f.device.stats().fragments_shaded, 0);
}

#[test]
fn stencil_marks_depth_failures_without_shading() {
    let mut f = fixture();
    let mut depth = [1.0f32; 16];
    depth[..8].fill(0.25);
    f.device.write_depth(f.depth_stencil, &depth).expect("depth");
    set_depth(&mut f, 0.5);

    let mark = StencilFaceState {
        depth_fail_op: StencilOperation::Replace,
        ..StencilFaceState::IGNORE
    };
    use_state(
        &mut f,
        RenderStateSet {
            label: "Mark".into(),
            blend: None,
            write_mask: ColorWrites::empty(),
            depth_stencil: DepthStencilState::with_stencil(CompareFunction::Less, mark),
            rasterizer: Default::default(),
        },
    );
    f.device.set_stencil_reference(1).expect("reference");
    draw(&mut f);

    let stencil = f.device.read_stencil(f.depth_stencil).expect("stencil");
    assert_eq!(&stencil[..8], &[1; 8]);
    assert_eq!(&stencil[8..], &[0; 8]);
    assert_eq!(f.device.stats().fragments_shaded, 0);

    // Only unmarked pixels pass a NotEqual test against the same reference.
    let test = StencilFaceState {
        compare: CompareFunction::NotEqual,
        ..StencilFaceState::IGNORE
    };
    let mut light = RenderStateSet::additive("Light");
    light.depth_stencil = DepthStencilState::with_stencil(CompareFunction::Always, test);
    use_state(&mut f, light);
    set_color(&mut f, LinearRgba::WHITE);
    draw(&mut f);
    let texels = f.device.read_render_target(f.target).expect("read");
    assert_eq!(texels[0].r, 0.0);
    assert_eq!(texels[15].r, 1.0);
}

#[test]
fn discarded_fragments_write_nothing() {
    let mut f = fixture();
    let mut state = RenderStateSet::additive("Writes");
    state.depth_stencil.depth_write_enabled = true;
    use_state(&mut f, state);
    set_depth(&mut f, 0.1);
    f.device
        .draw_mesh(f.quad, f.effect, TechniqueHandle(1))
        .expect("draw");
    let texels = f.device.read_render_target(f.target).expect("read");
    assert!(texels.iter().all(|t| *t == LinearRgba::TRANSPARENT));
    assert_eq!(f.device.draw_log()[0].technique, "Discard");
}

#[test]
fn target_stack_errors_leave_state_unchanged() {
    let mut f = fixture();
    let small = f
        .device
        .create_depth_stencil(&DepthStencilDescriptor {
            label: "Small".into(),
            size: Extent2D::new(2, 2),
        })
        .expect("surface");
    let err = f
        .device
        .push_render_target(f.target, Some(small))
        .expect_err("size mismatch");
    assert!(matches!(err, RenderError::Resource(ResourceError::InvalidHandle(_))));
    assert_eq!(f.device.current_target_size(), SIZE);

    f.device.pop_render_target().expect("pop accumulation target");
    let err = f.device.pop_render_target().expect_err("back buffer stays");
    assert!(matches!(err, RenderError::Usage(UsageError::TargetStackEmpty)));
}

#[test]
fn parameter_errors_name_the_program() {
    let mut f = fixture();
    let err = f
        .device
        .parameter_handle(f.effect, "Missing")
        .expect_err("unknown parameter");
    match err {
        RenderError::Shader(ShaderError::MissingParameter { module, name }) => {
            assert_eq!(module, "Flat");
            assert_eq!(name, "Missing");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(f.device.technique_handle(f.effect, "Nope").is_err());
    assert_eq!(
        f.device.technique_handle(f.effect, "Discard").expect("technique"),
        TechniqueHandle(1)
    );

    let err = f
        .device
        .set_parameter(f.effect, ParameterHandle(1), ParameterValue::Vec4(Vec4::ZERO))
        .expect_err("type mismatch");
    assert!(matches!(err, RenderError::ParameterTypeMismatch { .. }));
    assert_eq!(f.device.stats().parameter_uploads, 0);
}

#[test]
fn lost_device_rejects_calls_until_reset() {
    let mut f = fixture();
    f.device.simulate_device_lost();
    assert!(f.device.is_lost());
    let err = f
        .device
        .clear(ClearFlags::COLOR, LinearRgba::BLACK, 1.0, 0)
        .expect_err("lost");
    assert!(err.is_device_lost());

    f.device.reset();
    assert_eq!(f.device.generation(), 1);
    assert!(matches!(
        f.device.read_render_target(f.target),
        Err(RenderError::Resource(ResourceError::NotFound { .. }))
    ));
    assert_eq!(f.device.current_target_size(), SIZE);
    assert!(f
        .device
        .read_render_target(f.device.back_buffer())
        .is_ok());
}
