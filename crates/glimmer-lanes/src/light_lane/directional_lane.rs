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

//! Full-screen lighting of directional lights.

use std::sync::Arc;

use glimmer_core::lane::{Lane, LaneKind};
use glimmer_core::math::{Mat4, Vec2, EPSILON};
use glimmer_core::renderer::{
    BlendState, CameraFrame, ColorWrites, CompareFunction, CullMode, DepthStencilState,
    DirectionalLightParams, EffectDescriptor, EffectId, FrontFace, GBufferTextures, GraphicsDevice,
    MeshData, MeshId, ParameterHandle, ParameterValue, RasterizerState, RenderError,
    RenderStateSet, ShaderProgram, ShadowSource, StateSetId, TechniqueHandle, UsageError,
};

use super::accumulation::require_open;
use super::shaders::{params, DirectionalLightProgram, NO_SHADOW, WITH_SHADOW};
use super::{AccumulationBuffer, LightPrePassConfig, LightingError, ParameterCache};

/// Scope name reported in usage errors.
const DIRECTIONAL_SCOPE: &str = "directional light lane";

/// Label of the state set used by directional lights.
pub const DIRECTIONAL_STATE: &str = "DirectionalLight";

#[derive(Debug, Clone, Copy)]
struct DirectionalHandles {
    depth_texture: ParameterHandle,
    normal_texture: ParameterHandle,
    shadow_texture: ParameterHandle,
    frustum_corners: ParameterHandle,
    half_pixel: ParameterHandle,
    light_color: ParameterHandle,
    light_intensity: ParameterHandle,
    light_direction: ParameterHandle,
    no_shadow: TechniqueHandle,
    with_shadow: TechniqueHandle,
}

impl DirectionalHandles {
    fn resolve(device: &dyn GraphicsDevice, effect: EffectId) -> Result<Self, RenderError> {
        let param = |name: &str| device.parameter_handle(effect, name);
        Ok(Self {
            depth_texture: param(params::DEPTH_TEXTURE)?,
            normal_texture: param(params::NORMAL_TEXTURE)?,
            shadow_texture: param(params::SHADOW_TEXTURE)?,
            frustum_corners: param(params::FRUSTUM_CORNERS)?,
            half_pixel: param(params::HALF_PIXEL)?,
            light_color: param(params::LIGHT_COLOR)?,
            light_intensity: param(params::LIGHT_INTENSITY)?,
            light_direction: param(params::LIGHT_DIRECTION)?,
            no_shadow: device.technique_handle(effect, NO_SHADOW)?,
            with_shadow: device.technique_handle(effect, WITH_SHADOW)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct DirectionalResources {
    effect: EffectId,
    handles: DirectionalHandles,
    quad: MeshId,
    state: StateSetId,
}

#[derive(Debug, Clone, Copy)]
struct FrameInputs {
    pass_serial: u64,
    view: Mat4,
}

fn directional_state() -> RenderStateSet {
    RenderStateSet {
        label: DIRECTIONAL_STATE.to_string(),
        blend: Some(BlendState::ADDITIVE),
        write_mask: ColorWrites::ALL,
        // The quad sits at the far sentinel, so sky pixels fail the test.
        depth_stencil: DepthStencilState::depth_read_only(CompareFunction::NotEqual),
        rasterizer: RasterizerState {
            cull_mode: CullMode::None,
            front_face: FrontFace::Ccw,
        },
    }
}

/// Lights the whole screen with one directional light per draw.
///
/// A directional light has no finite footprint, so every pixel with geometry is
/// shaded by a single full-screen quad. No stencil work is involved.
#[derive(Debug)]
pub struct DirectionalLightLane {
    program: Arc<dyn ShaderProgram>,
    resources: Option<DirectionalResources>,
    cache: ParameterCache,
    frame: Option<FrameInputs>,
}

impl DirectionalLightLane {
    /// Loads the built-in directional light program.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        config: &LightPrePassConfig,
    ) -> Result<Self, LightingError> {
        Self::with_program(device, Arc::new(DirectionalLightProgram), config)
    }

    /// Loads a custom program.
    ///
    /// The program must expose the parameters in [`params`] used by
    /// directional lights and both shadow techniques.
    ///
    /// ## Errors
    ///
    /// A shader error naming the program's module if loading or handle
    /// resolution fails.
    pub fn with_program(
        device: &mut dyn GraphicsDevice,
        program: Arc<dyn ShaderProgram>,
        config: &LightPrePassConfig,
    ) -> Result<Self, LightingError> {
        config.validate()?;
        let mut lane = Self {
            program,
            resources: None,
            cache: ParameterCache::new(config.parameter_cache_enabled),
            frame: None,
        };
        lane.ensure_resources(device)?;
        log::info!(
            "DirectionalLightLane: loaded module '{}'",
            lane.program.label()
        );
        Ok(lane)
    }

    fn ensure_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<DirectionalResources, LightingError> {
        if let Some(resources) = self.resources {
            return Ok(resources);
        }
        let effect = device.create_effect(&EffectDescriptor {
            program: Arc::clone(&self.program),
        })?;
        let handles = DirectionalHandles::resolve(device, effect)?;
        let quad = device.create_mesh(&MeshData::fullscreen_quad())?;
        let state = device.create_state_set(&directional_state())?;
        let resources = DirectionalResources {
            effect,
            handles,
            quad,
            state,
        };
        self.cache.invalidate();
        self.resources = Some(resources);
        Ok(resources)
    }

    fn upload(
        &mut self,
        device: &mut dyn GraphicsDevice,
        effect: EffectId,
        handle: ParameterHandle,
        value: ParameterValue,
    ) -> Result<(), RenderError> {
        self.cache.set(device, effect, handle, value).map(|_| ())
    }

    /// Prepares the lane for the current lighting pass.
    ///
    /// Uploads the G-buffer textures, the far-plane corner rays of `camera` and
    /// the half-texel offset of the bound target. Calling it again within the
    /// same pass is allowed; unchanged values are not uploaded twice.
    pub fn begin(
        &mut self,
        device: &mut dyn GraphicsDevice,
        accumulation: &AccumulationBuffer,
        gbuffer: &GBufferTextures,
        camera: &CameraFrame,
    ) -> Result<(), LightingError> {
        require_open(accumulation, "DirectionalLightLane")?;
        let DirectionalResources {
            effect, handles, ..
        } = self.ensure_resources(device)?;

        let size = device.current_target_size();
        let half_pixel = Vec2::new(
            -0.5 / (size.width as f32 * 0.5),
            0.5 / (size.height as f32 * 0.5),
        );
        self.upload(device, effect, handles.depth_texture, ParameterValue::Texture(Some(gbuffer.depth)))?;
        self.upload(device, effect, handles.normal_texture, ParameterValue::Texture(Some(gbuffer.normal)))?;
        self.upload(
            device,
            effect,
            handles.frustum_corners,
            ParameterValue::Vec3Array4(camera.frustum_far_corners()),
        )?;
        self.upload(device, effect, handles.half_pixel, ParameterValue::Vec2(half_pixel))?;

        self.frame = Some(FrameInputs {
            pass_serial: accumulation.pass_serial(),
            view: camera.view,
        });
        Ok(())
    }

    /// Accumulates one directional light.
    ///
    /// The shadowed technique is used only when the light carries a shadow
    /// mask; otherwise no shadow texture is bound or sampled.
    ///
    /// ## Errors
    ///
    /// * [`UsageError::NotBegun`] unless [`begin`](Self::begin) was called
    ///   during the currently open accumulation pass.
    /// * [`LightingError::InvalidLight`] for a negative or non-finite
    ///   intensity, or a direction that is zero or not finite. Nothing is drawn
    ///   in that case.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        accumulation: &AccumulationBuffer,
        light: &DirectionalLightParams,
    ) -> Result<(), LightingError> {
        let (frame, resources) = match (self.frame, self.resources) {
            (Some(frame), Some(resources))
                if accumulation.is_open() && frame.pass_serial == accumulation.pass_serial() =>
            {
                (frame, resources)
            }
            _ => {
                log::error!("DirectionalLightLane: render called outside begin/end");
                return Err(UsageError::NotBegun {
                    scope: DIRECTIONAL_SCOPE,
                }
                .into());
            }
        };
        if !(light.intensity >= 0.0 && light.intensity.is_finite()) {
            return Err(LightingError::InvalidLight(format!(
                "directional light has intensity {}",
                light.intensity
            )));
        }
        let length = light.direction.length();
        if !(length > EPSILON && length.is_finite()) {
            return Err(LightingError::InvalidLight(format!(
                "directional light has direction {:?}",
                light.direction
            )));
        }
        let DirectionalResources {
            effect,
            handles,
            quad,
            state,
        } = resources;

        let direction = frame.view.transform_vector(light.direction).normalize();
        self.upload(device, effect, handles.light_color, ParameterValue::Vec3(light.color.rgb_vec()))?;
        self.upload(device, effect, handles.light_intensity, ParameterValue::Float(light.intensity))?;
        self.upload(device, effect, handles.light_direction, ParameterValue::Vec3(direction))?;

        let technique = match light.shadow {
            ShadowSource::NoShadow => handles.no_shadow,
            ShadowSource::WithShadow(mask) => {
                self.upload(device, effect, handles.shadow_texture, ParameterValue::Texture(Some(mask)))?;
                handles.with_shadow
            }
        };
        device.apply_state_set(state)?;
        device.draw_mesh(quad, effect, technique)?;
        Ok(())
    }

    /// Closes the per-pass scope. Later `render` calls fail until the next `begin`.
    pub fn end(&mut self) {
        self.frame = None;
    }

    /// The parameter cache of this lane.
    pub fn parameter_cache(&self) -> &ParameterCache {
        &self.cache
    }

    /// Mutable access to the parameter cache, e.g. to toggle memoisation.
    pub fn parameter_cache_mut(&mut self) -> &mut ParameterCache {
        &mut self.cache
    }
}

impl Lane for DirectionalLightLane {
    fn strategy_name(&self) -> &'static str {
        "DirectionalLight"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }

    fn on_device_reset(&mut self) {
        self.resources = None;
        self.frame = None;
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::math::{degrees_to_radians, Extent2D, LinearRgba, Vec3};
    use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};

    const SIZE: Extent2D = Extent2D::new(8, 8);

    struct Fixture {
        device: SoftwareGraphicsDevice,
        gbuffer: GBufferTextures,
        camera: CameraFrame,
        buffer: AccumulationBuffer,
        lane: DirectionalLightLane,
    }

    /// A camera facing a wall that fills the screen.
    fn fixture() -> Fixture {
        let mut device = SoftwareGraphicsDevice::new(SIZE);
        let camera = CameraFrame::look_at(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::Y,
            degrees_to_radians(60.0),
            1.0,
            0.1,
            10.0,
        )
        .unwrap();
        let gbuffer = AnalyticScene::create_gbuffer(&mut device, SIZE).unwrap();
        AnalyticScene::new()
            .with_plane(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.2)
            .render_gbuffer(&mut device, &camera, &gbuffer, SIZE)
            .unwrap();
        let config = LightPrePassConfig::default();
        let buffer = AccumulationBuffer::new(&mut device, SIZE, &config).unwrap();
        let lane = DirectionalLightLane::new(&mut device, &config).unwrap();
        Fixture {
            device,
            gbuffer,
            camera,
            buffer,
            lane,
        }
    }

    fn head_on(intensity: f32) -> DirectionalLightParams {
        DirectionalLightParams {
            color: LinearRgba::rgb(1.0, 0.5, 0.25),
            direction: Vec3::new(0.0, 0.0, -1.0),
            intensity,
            shadow: ShadowSource::NoShadow,
        }
    }

    #[test]
    fn head_on_light_adds_full_diffuse() {
        let mut f = fixture();
        let ambient = LinearRgba::rgb(0.1, 0.1, 0.1);
        f.buffer.begin(&mut f.device, ambient, &f.gbuffer).unwrap();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        f.lane.render(&mut f.device, &f.buffer, &head_on(2.0)).unwrap();
        f.lane.end();
        f.buffer.end(&mut f.device).unwrap();

        let texels = f.buffer.read(&f.device).unwrap();
        for t in texels {
            assert!((t.r - 2.1).abs() < 1e-4, "red was {}", t.r);
            assert!((t.g - 1.1).abs() < 1e-4);
            assert!((t.b - 0.6).abs() < 1e-4);
        }
    }

    #[test]
    fn missing_shadow_uses_unshadowed_technique() {
        let mut f = fixture();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        f.device.take_draw_log();
        f.lane.render(&mut f.device, &f.buffer, &head_on(1.0)).unwrap();

        let log = f.device.take_draw_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].technique, NO_SHADOW);
        assert_eq!(log[0].state_set, DIRECTIONAL_STATE);
        assert_eq!(log[0].fragments_shaded, SIZE.area() as u64);
    }

    #[test]
    fn render_without_begin_is_a_usage_error() {
        let mut f = fixture();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        let err = f.lane.render(&mut f.device, &f.buffer, &head_on(1.0)).unwrap_err();
        assert!(matches!(err.usage(), Some(UsageError::NotBegun { .. })));
        assert!(f.device.draw_log().is_empty());
    }

    #[test]
    fn invalid_intensity_or_direction_is_rejected() {
        let mut f = fixture();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        f.device.take_draw_log();

        let mut zero_direction = head_on(1.0);
        zero_direction.direction = Vec3::ZERO;
        let mut nan_direction = head_on(1.0);
        nan_direction.direction = Vec3::new(f32::NAN, 0.0, -1.0);
        for light in [head_on(-1.0), head_on(f32::NAN), zero_direction, nan_direction] {
            let err = f.lane.render(&mut f.device, &f.buffer, &light).unwrap_err();
            assert!(matches!(err, LightingError::InvalidLight(_)), "{light:?}: {err}");
        }
        assert!(f.device.draw_log().is_empty());
        let texels = f.buffer.read(&f.device).unwrap();
        assert!(texels.iter().all(|t| *t == LinearRgba::TRANSPARENT));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut device = SoftwareGraphicsDevice::new(SIZE);
        let config = LightPrePassConfig {
            stencil_reference: 3,
            stencil_clear_value: 3,
            ..LightPrePassConfig::default()
        };
        let err = DirectionalLightLane::new(&mut device, &config).unwrap_err();
        assert!(matches!(err, LightingError::InvalidConfig(_)));
    }

    #[test]
    fn begin_from_previous_pass_is_stale() {
        let mut f = fixture();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        f.buffer.end(&mut f.device).unwrap();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        let err = f.lane.render(&mut f.device, &f.buffer, &head_on(1.0)).unwrap_err();
        assert!(err.usage().is_some());
    }

    #[test]
    fn begin_requires_an_open_accumulation_pass() {
        let mut f = fixture();
        let err = f
            .lane
            .begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera)
            .unwrap_err();
        assert!(matches!(err.usage(), Some(UsageError::NotBegun { .. })));
    }

    #[test]
    fn repeated_begin_skips_unchanged_uploads() {
        let mut f = fixture();
        f.buffer.begin(&mut f.device, LinearRgba::BLACK, &f.gbuffer).unwrap();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        let uploads = f.lane.parameter_cache().uploads();
        f.lane.begin(&mut f.device, &f.buffer, &f.gbuffer, &f.camera).unwrap();
        assert_eq!(f.lane.parameter_cache().uploads(), uploads);
        assert_eq!(f.lane.parameter_cache().skipped(), 4);
    }
}
